// self
use crate::{
	_prelude::*,
	auth::{AccessToken, SubjectId, TokenRecord, TokenStatus},
	lifecycle::TokenManager,
	obs::{self, OpSpan, Operation, Outcome},
	store::MarkUsedOutcome,
};

impl TokenManager {
	/// Checks whether `token` could be redeemed now and returns its subject.
	///
	/// Read-only: the record is never modified.
	pub async fn verify(&self, token: &AccessToken) -> Result<SubjectId> {
		const OP: Operation = Operation::Verify;

		obs::record_outcome(OP, Outcome::Attempt);

		let result = OpSpan::new(OP, "verify")
			.instrument(async move {
				let now = self.clock.now();
				let record = self.lookup(token).await?;

				Self::check(&record, now)?;

				Ok(record.subject_id)
			})
			.await;

		self.finish(OP, &token.fingerprint(), &result);

		result
	}

	/// Consumes `token`, returning the subject it granted access to.
	///
	/// Concurrent redemptions of one token are serialized by the store's conditional update:
	/// exactly one caller succeeds and every other caller receives
	/// [`Error::TokenAlreadyUsed`]. A failed redemption leaves the record untouched.
	pub async fn redeem(&self, token: &AccessToken) -> Result<SubjectId> {
		const OP: Operation = Operation::Redeem;

		obs::record_outcome(OP, Outcome::Attempt);

		let result = OpSpan::new(OP, "redeem")
			.instrument(async move {
				let now = self.clock.now();
				let record = self.lookup(token).await?;

				Self::check(&record, now)?;

				match self.store.mark_used(token, now).await? {
					MarkUsedOutcome::Updated(updated) => {
						self.metrics.record_redeemed();

						Ok(updated.subject_id)
					},
					MarkUsedOutcome::AlreadyUsed => Err(Error::TokenAlreadyUsed),
					MarkUsedOutcome::Expired => Err(Error::TokenExpired),
					MarkUsedOutcome::Missing => Err(Error::TokenNotFound),
				}
			})
			.await;

		self.finish(OP, &token.fingerprint(), &result);

		result
	}

	async fn lookup(&self, token: &AccessToken) -> Result<TokenRecord> {
		if token.expose().is_empty() {
			return Err(Error::TokenNotFound);
		}

		self.store.find_by_token(token).await?.ok_or(Error::TokenNotFound)
	}

	fn check(record: &TokenRecord, now: OffsetDateTime) -> Result<()> {
		match record.status_at(now) {
			TokenStatus::Active => Ok(()),
			TokenStatus::Used => Err(Error::TokenAlreadyUsed),
			TokenStatus::Expired => Err(Error::TokenExpired),
		}
	}
}
