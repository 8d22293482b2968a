//! Authorization contracts backed by the embedding service's identity provider.

// self
use crate::{
	_prelude::*,
	auth::{CallerId, SubjectId},
};

/// Boxed future returned by [`SubjectAuthorizer::authorize`].
pub type AuthorizeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AuthorizationDecision, AuthorizerError>> + 'a + Send>>;

/// Decides whether an authenticated caller may mint tokens for a subject.
///
/// The crate never authenticates callers itself; it receives the identity the host already
/// resolved and asks this trait whether that identity owns the subject.
pub trait SubjectAuthorizer
where
	Self: Send + Sync,
{
	/// Evaluates `caller`'s rights over `subject`.
	fn authorize<'a>(&'a self, caller: &'a CallerId, subject: &'a SubjectId)
	-> AuthorizeFuture<'a>;
}

/// Verdict returned by a [`SubjectAuthorizer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationDecision {
	/// The caller may act on the subject.
	Granted,
	/// The subject does not exist or is not in a shareable state.
	UnknownSubject,
	/// The caller lacks rights over the subject.
	Denied {
		/// Human-readable reason.
		reason: String,
	},
}

/// Failure raised while consulting the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Authorizer failed: {message}.")]
pub struct AuthorizerError {
	/// Human-readable error payload.
	pub message: String,
}

/// Authorizer backed by a static owner table; handy for tests and single-tenant setups.
#[derive(Debug, Default)]
pub struct StaticAuthorizer(RwLock<HashMap<SubjectId, CallerId>>);
impl StaticAuthorizer {
	/// Records `owner` as the caller allowed to share `subject`.
	pub fn grant(&self, subject: SubjectId, owner: CallerId) {
		self.0.write().insert(subject, owner);
	}

	/// Returns the same authorizer after recording an owner.
	pub fn with_owner(self, subject: SubjectId, owner: CallerId) -> Self {
		self.grant(subject, owner);

		self
	}

	fn decide(&self, caller: &CallerId, subject: &SubjectId) -> AuthorizationDecision {
		match self.0.read().get(subject) {
			None => AuthorizationDecision::UnknownSubject,
			Some(owner) if owner == caller => AuthorizationDecision::Granted,
			Some(_) => AuthorizationDecision::Denied {
				reason: format!("{caller} does not own {subject}"),
			},
		}
	}
}
impl SubjectAuthorizer for StaticAuthorizer {
	fn authorize<'a>(
		&'a self,
		caller: &'a CallerId,
		subject: &'a SubjectId,
	) -> AuthorizeFuture<'a> {
		Box::pin(async move { Ok(self.decide(caller, subject)) })
	}
}
