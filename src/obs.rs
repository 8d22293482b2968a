//! Optional observability helpers for token and admission operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `guestpass.op` with the `op` and `stage`
//!   fields, plus events for issuance, rejections, and operational faults. Token values never
//!   reach these events; only [`AccessToken::fingerprint`](crate::auth::AccessToken::fingerprint)
//!   does.
//! - Enable `metrics` to increment the `guestpass_operation_total` counter for every
//!   attempt/success/rejection/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Token issuance.
	Issue,
	/// Read-only token verification.
	Verify,
	/// Token redemption.
	Redeem,
	/// Rate-limit admission check.
	Admit,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Issue => "issue",
			Operation::Verify => "verify",
			Operation::Redeem => "redeem",
			Operation::Admit => "admit",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Expected refusal (token state or admission).
	Rejected,
	/// Fault propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Rejected => "rejected",
			Outcome::Failure => "failure",
		}
	}

	/// Classifies a finished operation.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Outcome::Success,
			Err(e) if e.rejection().is_some() => Outcome::Rejected,
			Err(Error::RateLimited { .. }) => Outcome::Rejected,
			Err(_) => Outcome::Failure,
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
