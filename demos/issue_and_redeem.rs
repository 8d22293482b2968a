//! Demonstrates issuing a guest token, verifying it, redeeming it once, and observing the
//! already-used rejection afterwards.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use time::Duration;
// self
use guestpass::{
	auth::SubjectId,
	config::TokenPolicy,
	lifecycle::TokenManager,
	service::Verdict,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let manager = TokenManager::new(store, TokenPolicy::default().with_ttl(Duration::hours(24)))?;
	let subject = SubjectId::new("schedule-2025-11")?;
	let token = manager.issue_default(&subject).await?;

	println!("Issued token {token} (fingerprint {}).", token.fingerprint());
	println!("Verify -> {:?}", Verdict::from_result(manager.verify(&token).await)?);
	println!("Redeem -> {:?}", Verdict::from_result(manager.redeem(&token).await)?);

	let replay = Verdict::from_result(manager.verify(&token).await)?;

	println!("Verify again -> {}", replay.message().unwrap_or("ok"));
	println!("Metrics: {:?}", manager.metrics);

	Ok(())
}
