// self
use guestpass::{
	_preludet::*,
	auth::{CallerId, SubjectId},
	clock::{Clock, ManualClock},
	config::RateLimitPolicy,
	error::{Rejection, ValidationError},
	ext::{
		LinkDelivery, LinkNotifier, NotifierError, NotifyFuture, OutboxNotifier, StaticAuthorizer,
	},
	rate_limit::RateLimiter,
	service::{GuestPassService, Verdict},
};

const CLIENT: &str = "203.0.113.7";

struct Fixture {
	service: GuestPassService,
	clock: Arc<ManualClock>,
	owner: CallerId,
}

#[derive(Debug)]
struct BrokenNotifier;
impl LinkNotifier for BrokenNotifier {
	fn deliver<'a>(&'a self, _: &'a LinkDelivery) -> NotifyFuture<'a> {
		Box::pin(async { Err(NotifierError { message: "smtp relay refused".into() }) })
	}
}

fn fixture(limit: u32) -> Fixture {
	let (tokens, _store, clock) = build_test_manager();
	let owner = CallerId::new("alice").expect("Caller fixture should be valid.");
	let limiter = RateLimiter::new(RateLimitPolicy::new(limit, Duration::seconds(60)))
		.expect("Limiter policy fixture should be valid.")
		.with_clock(clock.clone() as Arc<dyn Clock>);
	let authorizer = StaticAuthorizer::default().with_owner(
		SubjectId::new("sched-1").expect("Subject fixture should be valid."),
		owner.clone(),
	);
	let service = GuestPassService::new(tokens, Arc::new(limiter), Arc::new(authorizer));

	Fixture { service, clock, owner }
}

#[tokio::test]
async fn owner_creates_verifies_and_redeems() {
	let Fixture { service, owner, .. } = fixture(100);
	let token = service
		.create_token(CLIENT, Some(&owner), "sched-1")
		.await
		.expect("Owner should be able to create a token.");
	let verdict = Verdict::from_result(service.verify_token(CLIENT, token.expose()).await)
		.expect("Verify should yield a verdict.");

	assert!(verdict.valid);
	assert_eq!(verdict.subject_id.as_deref(), Some("sched-1"));

	service.redeem_token(CLIENT, token.expose()).await.expect("Redeem should succeed.");

	let verdict = Verdict::from_result(service.redeem_token(CLIENT, token.expose()).await)
		.expect("Second redeem should yield a verdict.");

	assert!(!verdict.valid);
	assert_eq!(verdict.reason, Some(Rejection::AlreadyUsed));
	assert_eq!(verdict.message(), Some("Link already used."));
}

#[tokio::test]
async fn anonymous_and_foreign_callers_are_forbidden() {
	let Fixture { service, .. } = fixture(100);
	let stranger = CallerId::new("mallory").expect("Caller fixture should be valid.");

	assert!(matches!(
		service.create_token(CLIENT, None, "sched-1").await,
		Err(Error::Forbidden { .. })
	));
	assert!(matches!(
		service.create_token(CLIENT, Some(&stranger), "sched-1").await,
		Err(Error::Forbidden { .. })
	));
	assert_eq!(service.tokens.metrics.issued(), 0);
}

#[tokio::test]
async fn malformed_or_unknown_subjects_fail_validation() {
	let Fixture { service, owner, .. } = fixture(100);

	assert!(matches!(
		service.create_token(CLIENT, Some(&owner), "   ").await,
		Err(Error::Validation(ValidationError::Identifier(_)))
	));
	assert!(matches!(
		service.create_token(CLIENT, Some(&owner), "sched-404").await,
		Err(Error::Validation(ValidationError::UnknownSubject { .. }))
	));
}

#[tokio::test]
async fn throttled_clients_are_rejected_before_any_work() {
	let Fixture { service, clock, owner } = fixture(2);

	service.verify_token(CLIENT, "unknown").await.expect_err("Unknown token should fail.");
	service.create_token(CLIENT, Some(&owner), "sched-1").await.expect("Second call is admitted.");

	let err = service
		.create_token(CLIENT, Some(&owner), "sched-1")
		.await
		.expect_err("Third call in the window must be throttled.");

	assert!(matches!(
		err,
		Error::RateLimited { reset_at, retry_after }
			if reset_at == TEST_EPOCH + Duration::seconds(60)
				&& retry_after == Duration::seconds(60)
	));
	assert_eq!(service.tokens.metrics.issued(), 1);

	clock.advance(Duration::seconds(45));

	assert!(matches!(
		service.redeem_token(CLIENT, "unknown").await,
		Err(Error::RateLimited { retry_after, .. }) if retry_after == Duration::seconds(15)
	));
	assert!(service.check_rate("198.51.100.1").allowed, "other clients keep their own quota");

	clock.advance(Duration::seconds(61));

	assert_eq!(service.check_rate(CLIENT).remaining, 1);
}

#[tokio::test]
async fn share_link_embeds_the_token_and_notifies() {
	let Fixture { service, owner, .. } = fixture(100);
	let outbox = Arc::new(OutboxNotifier::default());
	let service = service.with_notifier(outbox.clone());
	let base = Url::parse("https://calendar.example.com/guest/sched-1?lang=en")
		.expect("Base URL fixture should parse.");
	let link = service
		.share_link(CLIENT, Some(&owner), "sched-1", &base)
		.await
		.expect("Sharing should succeed.");
	let token = link
		.query_pairs()
		.find(|(k, _)| k == "token")
		.map(|(_, v)| v.into_owned())
		.expect("Link should carry the token.");

	assert!(link.query_pairs().any(|(k, v)| k == "lang" && v == "en"));
	assert_eq!(
		service.verify_token(CLIENT, &token).await.expect("Shared token should verify.").as_ref(),
		"sched-1"
	);

	let deliveries = outbox.drain();

	assert_eq!(deliveries.len(), 1);
	assert_eq!(deliveries[0].link, link);
	assert_eq!(deliveries[0].caller, owner);
	assert_eq!(deliveries[0].expires_at, TEST_EPOCH + Duration::days(7));
}

#[tokio::test]
async fn failed_delivery_keeps_the_token_alive() {
	let Fixture { service, owner, .. } = fixture(100);
	let service = service.with_notifier(Arc::new(BrokenNotifier));
	let base = Url::parse("https://calendar.example.com/guest").expect("Base URL should parse.");
	let err = service
		.share_link(CLIENT, Some(&owner), "sched-1", &base)
		.await
		.expect_err("Broken notifier must surface an error.");

	assert!(matches!(err, Error::Notification { ref message } if message.contains("smtp")));
	assert_eq!(service.tokens.metrics.issued(), 1);
}

#[tokio::test]
async fn opaque_base_links_are_rejected() {
	let Fixture { service, owner, .. } = fixture(100);
	let base = Url::parse("mailto:guest@example.com").expect("Mailto URL should parse.");

	assert!(matches!(
		service.share_link(CLIENT, Some(&owner), "sched-1", &base).await,
		Err(Error::Validation(ValidationError::UnsupportedLink { .. }))
	));
	assert_eq!(service.tokens.metrics.issued(), 0);
}
