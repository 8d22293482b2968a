//! Token record structs, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{SubjectId, token::secret::AccessToken},
};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token can still be redeemed.
	Active,
	/// Token has already been redeemed.
	Used,
	/// Token passed its expiry instant without being redeemed.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the expiry does not lie after the creation instant.
	#[error("Expiry must be later than the creation instant.")]
	NonPositiveLifetime,
	/// Issued when the relative expiry lands outside the representable date range.
	#[error("Expiry lies outside the supported date range.")]
	LifetimeOutOfRange,
}

/// Persistent record describing an issued single-use token.
///
/// `token`, `subject_id`, `created_at`, and `expires_at` never change after creation. The
/// `used`/`used_at` pair flips exactly once, through [`TokenRecord::mark_used`].
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Token value; callers must avoid logging it.
	pub token: AccessToken,
	/// Resource the token grants access to.
	pub subject_id: SubjectId,
	/// Whether the token has been redeemed.
	pub used: bool,
	/// Redemption instant, present iff `used` is set.
	pub used_at: Option<OffsetDateTime>,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Last instant at which the token may still be redeemed.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns a builder for a record carrying `token` for `subject_id`.
	pub fn builder(token: AccessToken, subject_id: SubjectId) -> TokenRecordBuilder {
		TokenRecordBuilder::new(token, subject_id)
	}

	/// Computes the lifecycle status at a given instant.
	///
	/// A used token reports [`TokenStatus::Used`] even after it would have expired.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if self.used {
			return TokenStatus::Used;
		}
		if instant > self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}

	/// Flips the record to used. Returns `false` when it was already used.
	pub fn mark_used(&mut self, instant: OffsetDateTime) -> bool {
		if self.used {
			return false;
		}

		self.used = true;
		self.used_at = Some(instant);

		true
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("token", &"<redacted>")
			.field("subject_id", &self.subject_id)
			.field("used", &self.used)
			.field("used_at", &self.used_at)
			.field("created_at", &self.created_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	token: AccessToken,
	subject_id: SubjectId,
	created_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	fn new(token: AccessToken, subject_id: SubjectId) -> Self {
		Self { token, subject_id, created_at: None, expires_at: None, expires_in: None }
	}

	/// Sets the creation instant.
	pub fn created_at(mut self, instant: OffsetDateTime) -> Self {
		self.created_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the creation instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces an unused [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let created_at = self.created_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => created_at
				.checked_add(delta)
				.ok_or(TokenRecordBuilderError::LifetimeOutOfRange)?,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		if expires_at <= created_at {
			return Err(TokenRecordBuilderError::NonPositiveLifetime);
		}

		Ok(TokenRecord {
			token: self.token,
			subject_id: self.subject_id,
			used: false,
			used_at: None,
			created_at,
			expires_at,
		})
	}
}
