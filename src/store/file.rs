//! Simple file-backed [`TokenStore`] for lightweight single-node deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenRecord},
	store::{self, InsertOutcome, MarkUsedOutcome, StoreError, StoreFuture, TokenStore},
};

/// Persists token records to a JSON file after each mutation.
///
/// Mutations hold the in-process write lock across the file rewrite, so conditional updates stay
/// atomic for every caller sharing this handle. Separate processes must not share one file.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<AccessToken, TokenRecord>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Returns the snapshot path.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<AccessToken, TokenRecord>, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let records: Vec<TokenRecord> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(records.into_iter().map(|record| (record.token.clone(), record)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(
		&self,
		contents: &HashMap<AccessToken, TokenRecord>,
	) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot = contents.values().collect::<Vec<_>>();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn insert_if_absent(&self, record: TokenRecord) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if guard.contains_key(&record.token) {
				return Ok(InsertOutcome::Conflict);
			}

			let token = record.token.clone();

			guard.insert(token.clone(), record);

			if let Err(e) = self.persist_locked(&guard) {
				guard.remove(&token);

				return Err(e);
			}

			Ok(InsertOutcome::Inserted)
		})
	}

	fn find_by_token<'a>(
		&'a self,
		token: &'a AccessToken,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move { Ok(self.inner.read().get(token).cloned()) })
	}

	fn mark_used<'a>(
		&'a self,
		token: &'a AccessToken,
		used_at: OffsetDateTime,
	) -> StoreFuture<'a, MarkUsedOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let outcome = store::apply_mark_used(guard.get_mut(token), used_at);

			if matches!(outcome, MarkUsedOutcome::Updated(_))
				&& let Err(e) = self.persist_locked(&guard)
			{
				// Roll the in-memory copy back so memory never runs ahead of the file.
				if let Some(record) = guard.get_mut(token) {
					record.used = false;
					record.used_at = None;
				}

				return Err(e);
			}

			Ok(outcome)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::SubjectId;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"guestpass_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record(token: &str) -> TokenRecord {
		let subject = SubjectId::new("sched-1").expect("Failed to build subject fixture.");

		TokenRecord::builder(AccessToken::new(token), subject)
			.expires_in(Duration::hours(1))
			.build()
			.expect("Failed to build file-store test record.")
	}

	#[test]
	fn insert_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let record = build_record("Ab3dE9fGh1");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		assert_eq!(
			rt.block_on(store.insert_if_absent(record.clone()))
				.expect("Failed to insert fixture record into file store."),
			InsertOutcome::Inserted
		);
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.find_by_token(&record.token))
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.subject_id, record.subject_id);
		assert!(!fetched.used);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn used_flag_survives_reopen_and_conflicts_are_detected() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let record = build_record("Zz9yX8wV7u");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.insert_if_absent(record.clone())).expect("Insert should succeed.");

		assert_eq!(
			rt.block_on(store.insert_if_absent(build_record("Zz9yX8wV7u")))
				.expect("Duplicate insert should not error."),
			InsertOutcome::Conflict
		);

		let used_at = record.created_at + Duration::minutes(1);

		assert!(matches!(
			rt.block_on(store.mark_used(&record.token, used_at))
				.expect("Mark used should succeed."),
			MarkUsedOutcome::Updated(_)
		));
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert!(matches!(
			rt.block_on(reopened.mark_used(&record.token, used_at))
				.expect("Second mark used should not error."),
			MarkUsedOutcome::AlreadyUsed
		));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_persist_rolls_back_memory() {
		let dir = temp_path().with_extension("d");
		let path = dir.join("store.json");
		let store = FileStore::open(&path).expect("Failed to open nested file store snapshot.");
		let kept = build_record("Kp1Kp1Kp1K");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.insert_if_absent(kept.clone())).expect("Insert should succeed.");

		// A plain file where the directory was makes every later rewrite fail.
		fs::remove_dir_all(&dir).expect("Failed to remove store directory.");
		fs::write(&dir, b"").expect("Failed to shadow store directory with a file.");

		let lost = build_record("Ls2Ls2Ls2L");

		assert!(matches!(
			rt.block_on(store.insert_if_absent(lost.clone())),
			Err(StoreError::Backend { .. })
		));
		assert!(
			rt.block_on(store.find_by_token(&lost.token))
				.expect("Lookup should not error.")
				.is_none(),
			"a failed insert must not stay visible"
		);
		assert!(matches!(
			rt.block_on(store.mark_used(&kept.token, kept.created_at + Duration::minutes(1))),
			Err(StoreError::Backend { .. })
		));

		let after = rt
			.block_on(store.find_by_token(&kept.token))
			.expect("Lookup should not error.")
			.expect("Existing record should remain present.");

		assert!(!after.used);
		assert_eq!(after.used_at, None);

		fs::remove_file(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove shadowing file {}: {e}", dir.display())
		});
	}
}
