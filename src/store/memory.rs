//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenRecord},
	store::{self, InsertOutcome, MarkUsedOutcome, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<AccessToken, TokenRecord>>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns the number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no records are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn insert_now(map: StoreMap, record: TokenRecord) -> InsertOutcome {
		let mut guard = map.write();

		if guard.contains_key(&record.token) {
			return InsertOutcome::Conflict;
		}

		guard.insert(record.token.clone(), record);

		InsertOutcome::Inserted
	}

	fn find_now(map: StoreMap, token: AccessToken) -> Option<TokenRecord> {
		map.read().get(&token).cloned()
	}

	fn mark_used_now(
		map: StoreMap,
		token: AccessToken,
		used_at: OffsetDateTime,
	) -> MarkUsedOutcome {
		store::apply_mark_used(map.write().get_mut(&token), used_at)
	}
}
impl TokenStore for MemoryStore {
	fn insert_if_absent(&self, record: TokenRecord) -> StoreFuture<'_, InsertOutcome> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::insert_now(map, record)) })
	}

	fn find_by_token<'a>(
		&'a self,
		token: &'a AccessToken,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();
		let token = token.to_owned();

		Box::pin(async move { Ok(Self::find_now(map, token)) })
	}

	fn mark_used<'a>(
		&'a self,
		token: &'a AccessToken,
		used_at: OffsetDateTime,
	) -> StoreFuture<'a, MarkUsedOutcome> {
		let map = self.0.clone();
		let token = token.to_owned();

		Box::pin(async move { Ok(Self::mark_used_now(map, token, used_at)) })
	}
}
