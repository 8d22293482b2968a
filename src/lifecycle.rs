//! Token lifecycle manager: issuance, verification, and exactly-once redemption.
//!
//! [`TokenManager`] owns no mutable state of its own. Uniqueness and single redemption are
//! arbitrated by the [`TokenStore`]: issuance persists through
//! [`TokenStore::insert_if_absent`] and treats a conflict as a collision, while redemption goes
//! through the conditional [`TokenStore::mark_used`] so concurrent redeemers race inside the
//! store rather than across a read/write pair.

mod issue;
mod metrics;
mod redeem;

pub use metrics::LifecycleMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CandidateSource, TokenRecord},
	clock::{Clock, SystemClock},
	config::TokenPolicy,
	obs::{self, Operation, Outcome},
};

/// Issues, verifies, and redeems single-use tokens against a shared store.
#[derive(Clone)]
pub struct TokenManager {
	/// Store holding every issued record.
	pub store: Arc<dyn crate::store::TokenStore>,
	/// Counters for issued/redeemed/rejected tokens.
	pub metrics: Arc<LifecycleMetrics>,
	generator: Arc<dyn CandidateSource>,
	clock: Arc<dyn Clock>,
	policy: TokenPolicy,
}
impl TokenManager {
	/// Creates a manager whose generator is derived from `policy`.
	pub fn new(
		store: Arc<dyn crate::store::TokenStore>,
		policy: TokenPolicy,
	) -> Result<Self, crate::error::ConfigError> {
		let generator = policy.generator()?;

		Ok(Self {
			store,
			metrics: Default::default(),
			generator: Arc::new(generator),
			clock: Arc::new(SystemClock),
			policy,
		})
	}

	/// Replaces the candidate source (e.g., a scripted source in tests).
	pub fn with_generator(mut self, generator: Arc<dyn CandidateSource>) -> Self {
		self.generator = generator;

		self
	}

	/// Replaces the clock used for creation, expiry, and redemption instants.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the active policy.
	pub fn policy(&self) -> &TokenPolicy {
		&self.policy
	}

	/// Returns the raw record for `token` without evaluating its state.
	pub async fn inspect(&self, token: &crate::auth::AccessToken) -> Result<Option<TokenRecord>> {
		self.store.find_by_token(token).await.map_err(|e| {
			self.metrics.record_fault();

			Error::from(e)
		})
	}

	fn finish<T>(&self, op: Operation, fingerprint: &str, result: &Result<T>) {
		let outcome = Outcome::of(result);

		match outcome {
			Outcome::Rejected => self.metrics.record_rejection(),
			Outcome::Failure if result.as_ref().err().is_some_and(Error::is_operational) =>
				self.metrics.record_fault(),
			_ => (),
		}

		obs::emit_result(op, fingerprint, result);
		obs::record_outcome(op, outcome);
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("policy", &self.policy)
			.field("clock", &self.clock)
			.field("metrics", &self.metrics)
			.finish()
	}
}
