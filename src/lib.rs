//! Single-use guest access tokens with exactly-once redemption, backed by pluggable record
//! stores and guarded by an in-process fixed-window rate limiter.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod ext;
pub mod lifecycle;
pub mod obs;
pub mod rate_limit;
pub mod service;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use time::macros;
	// self
	use crate::{
		auth::{AccessToken, TokenGenerator},
		clock::{Clock, ManualClock},
		config::TokenPolicy,
		lifecycle::TokenManager,
		store::{MemoryStore, TokenStore},
	};

	/// Fixed instant every test clock starts from.
	pub const TEST_EPOCH: OffsetDateTime = macros::datetime!(2025-11-10 12:00 UTC);

	/// Generator that replays a fixed script of candidates before falling back to random ones.
	///
	/// Lets tests force collisions and produce well-known token strings.
	#[derive(Debug)]
	pub struct ScriptedGenerator {
		script: Mutex<Vec<String>>,
		fallback: TokenGenerator,
	}
	impl ScriptedGenerator {
		/// Creates a generator that yields `script` in order.
		pub fn new<I, S>(script: I) -> Self
		where
			I: IntoIterator<Item = S>,
			S: Into<String>,
		{
			let mut script = script.into_iter().map(Into::into).collect::<Vec<_>>();

			script.reverse();

			Self { script: Mutex::new(script), fallback: TokenGenerator::default() }
		}
	}
	impl crate::auth::CandidateSource for ScriptedGenerator {
		fn candidate(&self) -> AccessToken {
			match self.script.lock().pop() {
				Some(value) => AccessToken::new(value),
				None => self.fallback.candidate(),
			}
		}
	}

	/// Builds a manager over a fresh [`MemoryStore`] with a manual clock parked at
	/// [`TEST_EPOCH`].
	pub fn build_test_manager() -> (TokenManager, Arc<MemoryStore>, Arc<ManualClock>) {
		let store = Arc::new(MemoryStore::default());
		let (manager, clock) = build_test_manager_with(store.clone(), TokenPolicy::default());

		(manager, store, clock)
	}

	/// Builds a manager over `store` and `policy` with a manual clock parked at [`TEST_EPOCH`].
	pub fn build_test_manager_with(
		store: Arc<dyn TokenStore>,
		policy: TokenPolicy,
	) -> (TokenManager, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(TEST_EPOCH));
		let manager = TokenManager::new(store, policy)
			.expect("Token policy fixture should be valid.")
			.with_clock(clock.clone() as Arc<dyn Clock>);

		(manager, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
