//! Admission contracts consulted before token operations run.

// self
use crate::{_prelude::*, rate_limit::Admission};

/// Admission strategy consulted at the request-handling boundary.
///
/// Implementations must not block: the check runs inline on every inbound request. The built-in
/// [`RateLimiter`](crate::rate_limit::RateLimiter) keeps counters per process; a deployment with
/// several instances that needs a shared quota can plug in its own implementation here.
pub trait AdmissionPolicy
where
	Self: Send + Sync,
{
	/// Counts one request from `identifier` and decides whether it may proceed.
	fn check_rate(&self, identifier: &str) -> Admission;

	/// Returns the instant the policy evaluates windows against.
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Advises callers when to retry after a rejected admission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Suggested backoff duration.
	pub recommended_backoff: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, recommended_backoff: Duration) -> Self {
		Self { earliest_retry_at, recommended_backoff, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}

	/// Returns the backoff rounded up to whole seconds, as used by `Retry-After` headers.
	pub fn retry_after_secs(&self) -> u64 {
		let millis = self.recommended_backoff.whole_milliseconds().max(0) as u64;

		millis.div_ceil(1_000)
	}
}
