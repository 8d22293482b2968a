// self
use crate::{_prelude::*, error::Rejection, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by token operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("guestpass.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the terminal event for an operation.
///
/// Rejections land at debug level, operational faults at error level, other failures at warn.
/// `fingerprint` must come from
/// [`AccessToken::fingerprint`](crate::auth::AccessToken::fingerprint).
pub fn emit_result<T>(op: Operation, fingerprint: &str, result: &Result<T>) {
	#[cfg(feature = "tracing")]
	{
		match result {
			Ok(_) => tracing::debug!(op = op.as_str(), token = fingerprint, "operation succeeded"),
			Err(e) => match e.rejection() {
				Some(rejection) => emit_rejection(op, fingerprint, rejection),
				None if e.is_operational() => tracing::error!(
					op = op.as_str(),
					token = fingerprint,
					error = %e,
					"operational fault"
				),
				None => tracing::warn!(
					op = op.as_str(),
					token = fingerprint,
					error = %e,
					"operation failed"
				),
			},
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, fingerprint, result);
	}
}

/// Emits a token-state rejection.
pub fn emit_rejection(op: Operation, fingerprint: &str, rejection: Rejection) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			op = op.as_str(),
			token = fingerprint,
			reason = rejection.as_str(),
			outcome = crate::obs::Outcome::Rejected.as_str(),
			"token rejected"
		);
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, fingerprint, rejection);
	}
}

/// Emits a successful issuance.
pub fn emit_issued(subject: &str, fingerprint: &str, attempts: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(subject, token = fingerprint, attempts, "token issued");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (subject, fingerprint, attempts);
	}
}

/// Emits a candidate collision during issuance.
pub fn emit_collision(attempt: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(attempt, "token candidate collided; regenerating");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = attempt;
	}
}

/// Emits an admission refusal.
pub fn emit_throttled(identifier: &str, reset_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(identifier, %reset_at, "request throttled");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (identifier, reset_at);
	}
}

/// Emits the result of an eviction sweep.
pub fn emit_sweep(evicted: usize, remaining: usize) {
	#[cfg(feature = "tracing")]
	{
		if evicted > 0 {
			tracing::debug!(evicted, remaining, "evicted stale rate-limit counters");
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (evicted, remaining);
	}
}
