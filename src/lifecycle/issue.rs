// self
use crate::{
	_prelude::*,
	auth::{AccessToken, SubjectId, TokenRecord},
	config::TokenPolicy,
	error::ValidationError,
	lifecycle::TokenManager,
	obs::{self, OpSpan, Operation, Outcome},
	store::InsertOutcome,
};

impl TokenManager {
	/// Issues a token for `subject_id` using the policy's default lifetime.
	pub async fn issue_default(&self, subject_id: &SubjectId) -> Result<AccessToken> {
		self.issue(subject_id, self.policy.ttl).await
	}

	/// Issues a token for `subject_id` that expires `ttl` after creation.
	pub async fn issue(&self, subject_id: &SubjectId, ttl: Duration) -> Result<AccessToken> {
		self.issue_record(subject_id, ttl).await.map(|record| record.token)
	}

	/// Issues a token and returns the persisted record.
	///
	/// `ttl` must be positive and at most [`TokenPolicy::MAX_TTL`](crate::config::TokenPolicy).
	/// Candidates that collide with an existing record are discarded and regenerated, up to the
	/// policy's attempt bound. Nothing is persisted unless the returned record is.
	pub async fn issue_record(
		&self,
		subject_id: &SubjectId,
		ttl: Duration,
	) -> Result<TokenRecord> {
		const OP: Operation = Operation::Issue;

		obs::record_outcome(OP, Outcome::Attempt);

		let invalid = if !ttl.is_positive() {
			Some(ValidationError::NonPositiveTtl)
		} else if ttl > TokenPolicy::MAX_TTL {
			Some(ValidationError::TtlOutOfRange { max: TokenPolicy::MAX_TTL })
		} else {
			None
		};

		if let Some(e) = invalid {
			let result = Err(e.into());

			self.finish(OP, "-", &result);

			return result;
		}

		let span = OpSpan::new(OP, "issue");
		let result = span
			.instrument(async move {
				let max_attempts = self.policy.max_attempts;

				for attempt in 1..=max_attempts {
					let token = self.generator.candidate();
					let record = TokenRecord::builder(token.clone(), subject_id.clone())
						.created_at(self.clock.now())
						.expires_in(ttl)
						.build()
						.map_err(ValidationError::from)?;

					match self.store.insert_if_absent(record.clone()).await? {
						InsertOutcome::Inserted => {
							self.metrics.record_issued();
							obs::emit_issued(subject_id, &token.fingerprint(), attempt);

							return Ok(record);
						},
						InsertOutcome::Conflict => {
							self.metrics.record_collision();
							obs::emit_collision(attempt);
						},
					}
				}

				Err(Error::TokenGenerationExhausted { attempts: max_attempts })
			})
			.await;
		let fingerprint =
			result.as_ref().map(|record| record.token.fingerprint()).unwrap_or_default();

		self.finish(OP, &fingerprint, &result);

		result
	}
}
