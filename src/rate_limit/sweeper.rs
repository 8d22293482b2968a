//! Background eviction of expired rate-limit counters.

// crates.io
use tokio::{
	sync::oneshot,
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{_prelude::*, config::GuestPassConfig, error::ConfigError, rate_limit::RateLimiter};

/// Owns the periodic sweep task started by [`RateLimiter::spawn_sweeper`].
///
/// Call [`SweeperHandle::shutdown`] for an orderly stop; dropping the handle aborts the task.
#[derive(Debug)]
pub struct SweeperHandle {
	shutdown: Option<oneshot::Sender<()>>,
	task: Option<JoinHandle<()>>,
}
impl SweeperHandle {
	/// Signals the task to stop and waits for it to exit.
	pub async fn shutdown(mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
		if let Some(task) = self.task.take() {
			let _ = task.await;
		}
	}

	/// Returns `true` once the task has exited.
	pub fn is_finished(&self) -> bool {
		self.task.as_ref().is_none_or(JoinHandle::is_finished)
	}
}
impl Drop for SweeperHandle {
	fn drop(&mut self) {
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}

impl RateLimiter {
	/// Starts a task on the current Tokio runtime that calls [`RateLimiter::sweep`] every
	/// `interval`, beginning one interval from now.
	///
	/// `interval` must be positive and at most [`GuestPassConfig::MAX_SWEEP_INTERVAL`]. Must be
	/// called from within a Tokio runtime.
	pub fn spawn_sweeper(&self, interval: Duration) -> Result<SweeperHandle, ConfigError> {
		let period = std::time::Duration::try_from(interval)
			.ok()
			.filter(|period| !period.is_zero())
			.ok_or(ConfigError::NonPositiveSweepInterval)?;
		let out_of_range = ConfigError::DurationOutOfRange {
			field: "sweep_interval",
			max: GuestPassConfig::MAX_SWEEP_INTERVAL,
		};

		if interval > GuestPassConfig::MAX_SWEEP_INTERVAL {
			return Err(out_of_range);
		}

		let start = Instant::now().checked_add(period).ok_or(out_of_range)?;
		let limiter = self.clone();
		let (tx, mut rx) = oneshot::channel::<()>();
		let task = tokio::spawn(async move {
			let mut ticker = time::interval_at(start, period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					_ = &mut rx => break,
					_ = ticker.tick() => {
						limiter.sweep();
					},
				}
			}
		});

		Ok(SweeperHandle { shutdown: Some(tx), task: Some(task) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::TEST_EPOCH, clock::ManualClock, config::RateLimitPolicy};

	fn limiter() -> (RateLimiter, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(TEST_EPOCH));
		let limiter = RateLimiter::new(RateLimitPolicy::new(3, Duration::seconds(60)))
			.expect("Limiter policy fixture should be valid.")
			.with_clock(clock.clone());

		(limiter, clock)
	}

	#[tokio::test(start_paused = true)]
	async fn sweeper_evicts_expired_counters_on_each_tick() {
		let (limiter, clock) = limiter();

		limiter.check("stale");
		limiter.check("stale");
		clock.advance(Duration::minutes(2));

		let handle = limiter
			.spawn_sweeper(Duration::minutes(5))
			.expect("Positive sweep interval should be accepted.");

		time::sleep(std::time::Duration::from_secs(60)).await;

		assert_eq!(limiter.tracked(), 1, "No sweep may run before the first interval elapses.");

		time::sleep(std::time::Duration::from_secs(241)).await;

		assert_eq!(limiter.tracked(), 0);
		assert_eq!(limiter.check("stale").remaining, 2, "Evicted counters must not carry over.");

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn shutdown_stops_the_task() {
		let (limiter, _clock) = limiter();
		let handle = limiter
			.spawn_sweeper(Duration::seconds(1))
			.expect("Positive sweep interval should be accepted.");

		assert!(!handle.is_finished());

		handle.shutdown().await;
	}

	#[tokio::test]
	async fn non_positive_intervals_are_rejected() {
		let (limiter, _clock) = limiter();

		assert!(matches!(
			limiter.spawn_sweeper(Duration::ZERO),
			Err(ConfigError::NonPositiveSweepInterval)
		));
		assert!(matches!(
			limiter.spawn_sweeper(Duration::seconds(-1)),
			Err(ConfigError::NonPositiveSweepInterval)
		));
	}

	#[tokio::test]
	async fn oversized_intervals_are_rejected() {
		let (limiter, _clock) = limiter();

		for interval in [GuestPassConfig::MAX_SWEEP_INTERVAL + Duration::SECOND, Duration::MAX] {
			assert!(matches!(
				limiter.spawn_sweeper(interval),
				Err(ConfigError::DurationOutOfRange { field: "sweep_interval", .. })
			));
		}
	}
}
