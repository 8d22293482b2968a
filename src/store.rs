//! Storage contracts and built-in store implementations for single-use token records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenRecord},
};

/// Boxed future returned by every [`TokenStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for issued tokens.
///
/// Implementations must make [`TokenStore::insert_if_absent`] and [`TokenStore::mark_used`]
/// atomic with respect to concurrent callers; the lifecycle manager relies on them to enforce
/// uniqueness and exactly-once redemption.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists `record` unless a record with the same token already exists.
	fn insert_if_absent(&self, record: TokenRecord) -> StoreFuture<'_, InsertOutcome>;

	/// Fetches the record keyed by `token`, if present.
	fn find_by_token<'a>(&'a self, token: &'a AccessToken)
	-> StoreFuture<'a, Option<TokenRecord>>;

	/// Flips an unused, unexpired record to used at `used_at` in one indivisible step.
	///
	/// Expiry is evaluated against `used_at` so a token cannot be consumed after its deadline
	/// even if it was valid when the caller last looked.
	fn mark_used<'a>(
		&'a self,
		token: &'a AccessToken,
		used_at: OffsetDateTime,
	) -> StoreFuture<'a, MarkUsedOutcome>;
}

/// Result of an insert-if-absent attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
	/// The record was persisted.
	Inserted,
	/// A record with the same token already exists; nothing was written.
	Conflict,
}

/// Result of a conditional used-flag update.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MarkUsedOutcome {
	/// The record transitioned to used; carries the updated record.
	Updated(TokenRecord),
	/// The record was already used; nothing was written.
	AlreadyUsed,
	/// The record expired before `used_at`; nothing was written.
	Expired,
	/// No record matched the token.
	Missing,
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend did not answer within the caller's deadline.
	#[error("Backend timed out after {elapsed}.")]
	Timeout {
		/// Time spent waiting before giving up.
		elapsed: Duration,
	},
}

/// Applies the conditional used-flag transition to an optional record slot.
///
/// Shared by the built-in stores, which call it while holding their write lock.
pub(crate) fn apply_mark_used(
	slot: Option<&mut TokenRecord>,
	used_at: OffsetDateTime,
) -> MarkUsedOutcome {
	match slot {
		None => MarkUsedOutcome::Missing,
		Some(record) if record.used => MarkUsedOutcome::AlreadyUsed,
		Some(record) if record.is_expired_at(used_at) => MarkUsedOutcome::Expired,
		Some(record) => {
			record.mark_used(used_at);

			MarkUsedOutcome::Updated(record.clone())
		},
	}
}
