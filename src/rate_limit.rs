//! In-process fixed-window rate limiter.
//!
//! Each identifier owns at most one counter holding the request count of its current window.
//! Once `now` passes the window's reset instant the counter is replaced wholesale on the next
//! call; nothing carries over. Rejected calls do not consume quota.
//!
//! Fixed windows admit up to twice the limit across a window boundary (a burst at the end of one
//! window followed by a burst at the start of the next). Counters live in this process only, so
//! every instance of a horizontally scaled deployment enforces its own independent quota.

mod identifier;
mod sweeper;

pub use identifier::*;
pub use sweeper::SweeperHandle;

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::RateLimitPolicy,
	error::ConfigError,
	ext::{AdmissionPolicy, RetryDirective},
	obs::{self, Operation, Outcome},
};

type CounterMap = Arc<Mutex<HashMap<String, Counter>>>;

#[derive(Clone, Copy, Debug)]
struct Counter {
	count: u32,
	window_reset_at: OffsetDateTime,
}

/// Result of an admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
	/// Whether the request may proceed.
	pub allowed: bool,
	/// Requests left in the current window.
	pub remaining: u32,
	/// Instant at which the current window ends.
	pub reset_at: OffsetDateTime,
	/// Limit the decision was made against.
	pub limit: u32,
}
impl Admission {
	/// Converts a rejection into a retry hint relative to `now`; `None` when allowed.
	pub fn retry_directive(&self, now: OffsetDateTime) -> Option<RetryDirective> {
		if self.allowed {
			return None;
		}

		let backoff = (self.reset_at - now).max(Duration::ZERO);

		Some(RetryDirective::new(self.reset_at, backoff).with_reason("rate limit exceeded"))
	}
}

/// Fixed-window request counter shared by every task in the process.
///
/// Cloning yields another handle onto the same counter table.
#[derive(Clone)]
pub struct RateLimiter {
	counters: CounterMap,
	policy: RateLimitPolicy,
	clock: Arc<dyn Clock>,
}
impl RateLimiter {
	/// Creates an empty limiter whose [`RateLimiter::check`] applies `policy`.
	pub fn new(policy: RateLimitPolicy) -> Result<Self, ConfigError> {
		policy.validate()?;

		Ok(Self { counters: Default::default(), policy, clock: Arc::new(SystemClock) })
	}

	/// Replaces the clock used for window arithmetic.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the default policy.
	pub fn policy(&self) -> RateLimitPolicy {
		self.policy
	}

	/// Admits or rejects one request from `identifier` under the default policy.
	pub fn check(&self, identifier: &str) -> Admission {
		self.admit(identifier, self.policy)
	}

	/// Admits or rejects one request from `identifier` under `policy`.
	///
	/// Never blocks on I/O. The whole read-modify-write runs under one lock, so concurrent calls
	/// never lose increments. A policy with a zero limit rejects without creating a counter, as
	/// does one whose window is not positive or cannot be added to the current instant; such a
	/// rejection reports `reset_at == now`.
	pub fn admit(&self, identifier: &str, policy: RateLimitPolicy) -> Admission {
		let now = self.clock.now();
		let admission = Self::admit_now(&self.counters, identifier, policy, now);

		if admission.allowed {
			obs::record_outcome(Operation::Admit, Outcome::Success);
		} else {
			obs::record_outcome(Operation::Admit, Outcome::Rejected);
			obs::emit_throttled(identifier, admission.reset_at);
		}

		admission
	}

	/// Removes every counter whose window has already ended and returns how many were dropped.
	pub fn sweep(&self) -> usize {
		let now = self.clock.now();
		let mut guard = self.counters.lock();
		let before = guard.len();

		guard.retain(|_, counter| counter.window_reset_at >= now);

		let evicted = before - guard.len();

		obs::emit_sweep(evicted, guard.len());

		evicted
	}

	/// Returns the number of identifiers currently holding a counter.
	pub fn tracked(&self) -> usize {
		self.counters.lock().len()
	}

	fn admit_now(
		counters: &CounterMap,
		identifier: &str,
		policy: RateLimitPolicy,
		now: OffsetDateTime,
	) -> Admission {
		let limit = policy.limit;
		let window_reset_at = match now.checked_add(policy.window) {
			Some(at) if policy.window.is_positive() => at,
			_ => return Admission { allowed: false, remaining: 0, reset_at: now, limit },
		};

		if limit == 0 {
			return Admission { allowed: false, remaining: 0, reset_at: window_reset_at, limit };
		}

		let mut guard = counters.lock();

		match guard.get_mut(identifier) {
			Some(counter) if now <= counter.window_reset_at => {
				if counter.count >= limit {
					return Admission {
						allowed: false,
						remaining: 0,
						reset_at: counter.window_reset_at,
						limit,
					};
				}

				counter.count += 1;

				Admission {
					allowed: true,
					remaining: limit - counter.count,
					reset_at: counter.window_reset_at,
					limit,
				}
			},
			_ => {
				guard.insert(identifier.to_owned(), Counter { count: 1, window_reset_at });

				Admission { allowed: true, remaining: limit - 1, reset_at: window_reset_at, limit }
			},
		}
	}
}
impl AdmissionPolicy for RateLimiter {
	fn check_rate(&self, identifier: &str) -> Admission {
		self.check(identifier)
	}

	fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter")
			.field("policy", &self.policy)
			.field("tracked", &self.tracked())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::TEST_EPOCH, clock::ManualClock};

	fn limiter(limit: u32, window: Duration) -> (RateLimiter, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(TEST_EPOCH));
		let limiter = RateLimiter::new(RateLimitPolicy::new(limit, window))
			.expect("Limiter policy fixture should be valid.")
			.with_clock(clock.clone());

		(limiter, clock)
	}

	#[test]
	fn window_admits_up_to_the_limit_then_resets() {
		let (limiter, clock) = limiter(3, Duration::milliseconds(1000));
		let decisions = (0..4).map(|_| limiter.check("10.0.0.1")).collect::<Vec<_>>();

		assert_eq!(
			decisions.iter().map(|a| a.allowed).collect::<Vec<_>>(),
			[true, true, true, false]
		);
		assert_eq!(decisions.iter().map(|a| a.remaining).collect::<Vec<_>>(), [2, 1, 0, 0]);
		assert!(decisions.iter().all(|a| a.reset_at == TEST_EPOCH + Duration::seconds(1)));

		clock.advance(Duration::milliseconds(1001));

		let fresh = limiter.check("10.0.0.1");

		assert!(fresh.allowed);
		assert_eq!(fresh.remaining, 2);
		assert_eq!(fresh.reset_at, TEST_EPOCH + Duration::milliseconds(2001));
	}

	#[test]
	fn rejected_calls_do_not_consume_quota() {
		let (limiter, clock) = limiter(1, Duration::seconds(10));

		assert!(limiter.check("a").allowed);

		let first = limiter.check("a");

		clock.advance(Duration::seconds(5));

		let second = limiter.check("a");

		assert_eq!(first, second);
		assert_eq!(second.remaining, 0);
		assert_eq!(limiter.counters.lock()["a"].count, 1);
	}

	#[test]
	fn window_end_is_inclusive() {
		let (limiter, clock) = limiter(1, Duration::seconds(10));

		limiter.check("a");
		clock.advance(Duration::seconds(10));

		assert!(!limiter.check("a").allowed, "The reset instant still belongs to the window.");

		clock.advance(Duration::nanoseconds(1));

		assert!(limiter.check("a").allowed);
	}

	#[test]
	fn identifiers_are_isolated_and_per_call_policies_apply() {
		let (limiter, _clock) = limiter(100, Duration::seconds(60));
		let strict = RateLimitPolicy::new(1, Duration::seconds(60));

		assert!(limiter.admit("a", strict).allowed);
		assert!(!limiter.admit("a", strict).allowed);
		assert!(limiter.admit("b", strict).allowed);
		assert_eq!(limiter.check("c").remaining, 99);
	}

	#[test]
	fn zero_limit_rejects_without_tracking() {
		let (limiter, _clock) = limiter(5, Duration::seconds(60));
		let admission = limiter.admit("a", RateLimitPolicy::new(0, Duration::seconds(60)));

		assert!(!admission.allowed);
		assert_eq!(limiter.tracked(), 0);
	}

	#[test]
	fn invalid_per_call_windows_reject_without_tracking() {
		let (limiter, _clock) = limiter(5, Duration::seconds(60));

		for window in [Duration::ZERO, Duration::seconds(-30), Duration::seconds(9_000_000_000_000)]
		{
			for _ in 0..3 {
				let admission = limiter.admit("a", RateLimitPolicy::new(5, window));

				assert!(!admission.allowed);
				assert_eq!(admission.remaining, 0);
				assert_eq!(admission.reset_at, TEST_EPOCH);
			}
		}

		assert_eq!(limiter.tracked(), 0);
		assert_eq!(limiter.check("a").remaining, 4, "Rejections must not consume quota.");
	}

	#[test]
	fn sweep_evicts_only_expired_windows() {
		let (limiter, clock) = limiter(5, Duration::seconds(60));

		limiter.check("old");
		clock.advance(Duration::seconds(45));
		limiter.check("young");
		clock.advance(Duration::seconds(30));

		assert_eq!(limiter.sweep(), 1);
		assert_eq!(limiter.tracked(), 1);
		assert_eq!(limiter.check("young").remaining, 3);
		assert_eq!(limiter.check("old").remaining, 4);
	}

	#[test]
	fn concurrent_checks_never_lose_increments() {
		let (limiter, _clock) = limiter(10_000, Duration::seconds(60));
		let threads = (0..8)
			.map(|_| {
				let limiter = limiter.clone();

				std::thread::spawn(move || {
					for _ in 0..500 {
						limiter.check("shared");
					}
				})
			})
			.collect::<Vec<_>>();

		for thread in threads {
			thread.join().expect("Admission thread should not panic.");
		}

		assert_eq!(limiter.check("shared").remaining, 10_000 - 4_001);
	}

	#[test]
	fn retry_directive_points_at_the_window_end() {
		let (limiter, _clock) = limiter(1, Duration::seconds(30));

		assert!(limiter.check("a").retry_directive(TEST_EPOCH).is_none());

		let directive = limiter
			.check("a")
			.retry_directive(TEST_EPOCH + Duration::seconds(10))
			.expect("Rejected admission should yield a retry directive.");

		assert_eq!(directive.earliest_retry_at, TEST_EPOCH + Duration::seconds(30));
		assert_eq!(directive.recommended_backoff, Duration::seconds(20));
	}

	#[test]
	fn invalid_default_policy_is_rejected() {
		assert!(matches!(
			RateLimiter::new(RateLimitPolicy::new(0, Duration::seconds(1))),
			Err(ConfigError::ZeroLimit)
		));
		assert!(matches!(
			RateLimiter::new(RateLimitPolicy::new(1, Duration::ZERO)),
			Err(ConfigError::NonPositiveWindow)
		));
	}
}
