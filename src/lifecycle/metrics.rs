// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for lifecycle operations.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	issued: AtomicU64,
	collisions: AtomicU64,
	redeemed: AtomicU64,
	rejections: AtomicU64,
	faults: AtomicU64,
}
impl LifecycleMetrics {
	/// Returns the number of tokens persisted.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of candidates discarded because they collided.
	pub fn collisions(&self) -> u64 {
		self.collisions.load(Ordering::Relaxed)
	}

	/// Returns the number of successful redemptions.
	pub fn redeemed(&self) -> u64 {
		self.redeemed.load(Ordering::Relaxed)
	}

	/// Returns the number of not-found/already-used/expired outcomes.
	pub fn rejections(&self) -> u64 {
		self.rejections.load(Ordering::Relaxed)
	}

	/// Returns the number of store faults and exhausted generations.
	pub fn faults(&self) -> u64 {
		self.faults.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_collision(&self) {
		self.collisions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_redeemed(&self) {
		self.redeemed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejection(&self) {
		self.rejections.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fault(&self) {
		self.faults.fetch_add(1, Ordering::Relaxed);
	}
}
