//! Request-handling boundary composing admission control with the token lifecycle.
//!
//! Every operation first consults the [`AdmissionPolicy`] with the caller's client identifier;
//! only admitted requests reach validation, authorization, and the [`TokenManager`].

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CallerId, SubjectId},
	error::{Rejection, ValidationError},
	ext::{AdmissionPolicy, AuthorizationDecision, LinkDelivery, LinkNotifier, SubjectAuthorizer},
	lifecycle::TokenManager,
	rate_limit::Admission,
};

/// User-facing answer to "can this link be used?".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
	/// Whether the token is currently valid.
	pub valid: bool,
	/// Subject unlocked by a valid token.
	pub subject_id: Option<SubjectId>,
	/// Why an invalid token was refused.
	pub reason: Option<Rejection>,
}
impl Verdict {
	/// Folds a verify/redeem result into a verdict.
	///
	/// Token-state errors become `valid: false` with a reason; every other error passes through.
	pub fn from_result(result: Result<SubjectId>) -> Result<Self> {
		match result {
			Ok(subject_id) => Ok(Self { valid: true, subject_id: Some(subject_id), reason: None }),
			Err(e) => match e.rejection() {
				Some(reason) => Ok(Self { valid: false, subject_id: None, reason: Some(reason) }),
				None => Err(e),
			},
		}
	}

	/// Returns the human-readable explanation for an invalid token.
	pub fn message(&self) -> Option<&'static str> {
		self.reason.map(Rejection::message)
	}
}

/// Throttled facade serving the token contracts to request handlers.
#[derive(Clone)]
pub struct GuestPassService {
	/// Lifecycle manager performing store operations.
	pub tokens: TokenManager,
	admission: Arc<dyn AdmissionPolicy>,
	authorizer: Arc<dyn SubjectAuthorizer>,
	notifier: Option<Arc<dyn LinkNotifier>>,
}
impl GuestPassService {
	/// Creates a service without a notification channel.
	pub fn new(
		tokens: TokenManager,
		admission: Arc<dyn AdmissionPolicy>,
		authorizer: Arc<dyn SubjectAuthorizer>,
	) -> Self {
		Self { tokens, admission, authorizer, notifier: None }
	}

	/// Attaches the channel used by [`GuestPassService::share_link`].
	pub fn with_notifier(mut self, notifier: Arc<dyn LinkNotifier>) -> Self {
		self.notifier = Some(notifier);

		self
	}

	/// Counts one request from `identifier` and reports the decision without failing.
	pub fn check_rate(&self, identifier: &str) -> Admission {
		self.admission.check_rate(identifier)
	}

	/// Issues a token for `subject` on behalf of an authenticated `caller`.
	///
	/// Anonymous callers are refused before the authorizer is consulted.
	pub async fn create_token(
		&self,
		client: &str,
		caller: Option<&CallerId>,
		subject: &str,
	) -> Result<AccessToken> {
		self.admit(client)?;

		let (_, subject) = self.authorize(caller, subject).await?;

		self.tokens.issue_default(&subject).await
	}

	/// Checks a presented token without consuming it.
	pub async fn verify_token(&self, client: &str, token: &str) -> Result<SubjectId> {
		self.admit(client)?;
		self.tokens.verify(&AccessToken::new(token)).await
	}

	/// Consumes a presented token.
	pub async fn redeem_token(&self, client: &str, token: &str) -> Result<SubjectId> {
		self.admit(client)?;
		self.tokens.redeem(&AccessToken::new(token)).await
	}

	/// Issues a token, embeds it into `base`, and hands the link to the notifier.
	///
	/// A delivery failure surfaces as [`Error::Notification`]; the persisted token stays valid.
	pub async fn share_link(
		&self,
		client: &str,
		caller: Option<&CallerId>,
		subject: &str,
		base: &Url,
	) -> Result<Url> {
		self.admit(client)?;

		if base.cannot_be_a_base() {
			return Err(ValidationError::UnsupportedLink { url: base.to_string() }.into());
		}

		let (caller, subject) = self.authorize(caller, subject).await?;
		let record = self.tokens.issue_record(&subject, self.tokens.policy().ttl).await?;
		let link = record.token.link(base);

		if let Some(notifier) = &self.notifier {
			let delivery = LinkDelivery {
				caller: caller.clone(),
				subject,
				link: link.clone(),
				expires_at: record.expires_at,
			};

			notifier
				.deliver(&delivery)
				.await
				.map_err(|e| Error::Notification { message: e.message })?;
		}

		Ok(link)
	}

	fn admit(&self, client: &str) -> Result<Admission> {
		let admission = self.admission.check_rate(client);

		match admission.retry_directive(self.admission.now()) {
			None => Ok(admission),
			Some(directive) => Err(Error::RateLimited {
				reset_at: directive.earliest_retry_at,
				retry_after: directive.recommended_backoff,
			}),
		}
	}

	async fn authorize<'a>(
		&self,
		caller: Option<&'a CallerId>,
		subject: &str,
	) -> Result<(&'a CallerId, SubjectId)> {
		let subject = SubjectId::new(subject)?;
		let caller = caller
			.ok_or_else(|| Error::Forbidden { reason: "authentication required".into() })?;
		let decision = self.authorizer.authorize(caller, &subject).await?;

		match decision {
			AuthorizationDecision::Granted => Ok((caller, subject)),
			AuthorizationDecision::UnknownSubject =>
				Err(ValidationError::UnknownSubject { subject: subject.to_string() }.into()),
			AuthorizationDecision::Denied { reason } => Err(Error::Forbidden { reason }),
		}
	}
}
impl Debug for GuestPassService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GuestPassService")
			.field("tokens", &self.tokens)
			.field("notifier_set", &self.notifier.is_some())
			.finish()
	}
}
