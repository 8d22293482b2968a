//! Demonstrates the service facade: per-client throttling, owner-only link sharing through an
//! in-memory outbox, and the background sweeper evicting idle counters.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use guestpass::{
	auth::{CallerId, SubjectId},
	config::GuestPassConfig,
	ext::{OutboxNotifier, StaticAuthorizer},
	lifecycle::TokenManager,
	rate_limit::{RateLimiter, client_identifier},
	service::GuestPassService,
	store::MemoryStore,
};

const CONFIG: &str = r#"{
	"token": { "ttl_secs": 3600 },
	"rate_limit": { "limit": 3, "window_secs": 10 },
	"sweep_interval_secs": 30
}"#;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = GuestPassConfig::from_json_str(CONFIG)?;
	let owner = CallerId::new("alice")?;
	let tokens = TokenManager::new(Arc::new(MemoryStore::default()), config.token.clone())?;
	let limiter = RateLimiter::new(config.rate_limit)?;
	let sweeper = limiter.spawn_sweeper(config.sweep_interval)?;
	let outbox = Arc::new(OutboxNotifier::default());
	let authorizer =
		StaticAuthorizer::default().with_owner(SubjectId::new("team-standup")?, owner.clone());
	let service = GuestPassService::new(tokens, Arc::new(limiter.clone()), Arc::new(authorizer))
		.with_notifier(outbox.clone());
	let client = client_identifier(Some("198.51.100.24, 10.0.0.1"), None);
	let base = Url::parse("https://calendar.example.com/guest/team-standup")?;
	let link = service.share_link(&client, Some(&owner), "team-standup", &base).await?;

	println!("Shared link for {client}; {} delivery queued.", outbox.drain().len());

	for attempt in 1..=3 {
		match service.verify_token(&client, "not-a-token").await {
			Err(e) if e.rejection().is_some() => println!("Attempt {attempt}: {e}"),
			Err(e) => println!("Attempt {attempt}: throttled ({e})"),
			Ok(subject) => println!("Attempt {attempt}: unexpectedly valid for {subject}"),
		}
	}

	println!("Counters tracked: {}; link host {:?}.", limiter.tracked(), link.host_str());

	sweeper.shutdown().await;

	Ok(())
}
