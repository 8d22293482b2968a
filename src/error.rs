//! Crate-level error types shared across the lifecycle manager, limiter, and stores.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, TokenRecordBuilderError},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage backend could not serve the request; callers decide on retry.
	#[error("Token store is unavailable: {0}")]
	StoreUnavailable(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Caller supplied malformed input.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// Identity provider could not be consulted.
	#[error(transparent)]
	Authorizer(#[from] crate::ext::AuthorizerError),

	/// Caller lacks rights over the requested subject.
	#[error("Caller is not allowed to act on this subject: {reason}.")]
	Forbidden {
		/// Authorizer-supplied reason string.
		reason: String,
	},
	/// Admission check rejected the caller.
	#[error("Too many requests; retry after {reset_at}.")]
	RateLimited {
		/// Instant at which the caller's window resets.
		reset_at: OffsetDateTime,
		/// Time left until `reset_at`, measured on the admission policy's clock.
		retry_after: Duration,
	},
	/// No record exists for the presented token.
	#[error("Token not found.")]
	TokenNotFound,
	/// The token was already redeemed.
	#[error("Token has already been used.")]
	TokenAlreadyUsed,
	/// The token passed its expiry instant.
	#[error("Token has expired.")]
	TokenExpired,
	/// Every generated candidate collided with an existing record.
	#[error("Failed to generate a unique token after {attempts} attempts.")]
	TokenGenerationExhausted {
		/// Number of candidates tried.
		attempts: u32,
	},
	/// Out-of-band link delivery failed; the token itself stays valid.
	#[error("Link delivery failed: {message}.")]
	Notification {
		/// Notifier-supplied message.
		message: String,
	},
}
impl Error {
	/// Returns the token-state rejection carried by this error, if any.
	pub fn rejection(&self) -> Option<Rejection> {
		match self {
			Self::TokenNotFound => Some(Rejection::NotFound),
			Self::TokenAlreadyUsed => Some(Rejection::AlreadyUsed),
			Self::TokenExpired => Some(Rejection::Expired),
			_ => None,
		}
	}

	/// Returns `true` for faults operators should be alerted to.
	pub fn is_operational(&self) -> bool {
		matches!(
			self,
			Self::StoreUnavailable(_) | Self::TokenGenerationExhausted { .. } | Self::Authorizer(_)
		)
	}
}
impl From<IdentifierError> for Error {
	fn from(e: IdentifierError) -> Self {
		Self::Validation(e.into())
	}
}

/// Reasons a token cannot be redeemed right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
	/// No record exists for the token.
	NotFound,
	/// The token was already redeemed.
	AlreadyUsed,
	/// The token expired before redemption.
	Expired,
}
impl Rejection {
	/// Returns a stable label suitable for logs or API payloads.
	pub const fn as_str(self) -> &'static str {
		match self {
			Rejection::NotFound => "not_found",
			Rejection::AlreadyUsed => "already_used",
			Rejection::Expired => "expired",
		}
	}

	/// Returns the user-facing explanation.
	pub const fn message(self) -> &'static str {
		match self {
			Rejection::NotFound => "Link not found.",
			Rejection::AlreadyUsed => "Link already used.",
			Rejection::Expired => "Link expired.",
		}
	}
}
impl Display for Rejection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<Rejection> for Error {
	fn from(r: Rejection) -> Self {
		match r {
			Rejection::NotFound => Self::TokenNotFound,
			Rejection::AlreadyUsed => Self::TokenAlreadyUsed,
			Rejection::Expired => Self::TokenExpired,
		}
	}
}

/// Malformed caller input.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// Subject does not reference an existing, shareable resource.
	#[error("Subject `{subject}` does not exist.")]
	UnknownSubject {
		/// Offending subject identifier.
		subject: String,
	},
	/// Requested lifetime was zero or negative.
	#[error("Token lifetime must be positive.")]
	NonPositiveTtl,
	/// Requested lifetime exceeds the supported maximum.
	#[error("Token lifetime must not exceed {max}.")]
	TtlOutOfRange {
		/// Longest accepted lifetime.
		max: Duration,
	},
	/// Base link for guest URLs cannot carry query parameters.
	#[error("Base link `{url}` cannot carry a token.")]
	UnsupportedLink {
		/// Offending URL.
		url: String,
	},
}

impl From<TokenRecordBuilderError> for ValidationError {
	fn from(e: TokenRecordBuilderError) -> Self {
		match e {
			TokenRecordBuilderError::LifetimeOutOfRange =>
				Self::TtlOutOfRange { max: crate::config::TokenPolicy::MAX_TTL },
			TokenRecordBuilderError::MissingExpiry | TokenRecordBuilderError::NonPositiveLifetime =>
				Self::NonPositiveTtl,
		}
	}
}

/// Configuration and validation failures raised while building components.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Tokens must hold at least one symbol.
	#[error("Token length must be at least one symbol.")]
	ZeroTokenLength,
	/// Alphabet needs at least two symbols to carry entropy.
	#[error("Token alphabet needs at least two symbols, got {size}.")]
	AlphabetTooSmall {
		/// Number of distinct symbols supplied.
		size: usize,
	},
	/// Alphabet contains a non-printable or non-ASCII symbol.
	#[error("Token alphabet symbol {symbol:?} is not printable ASCII.")]
	InvalidAlphabetSymbol {
		/// Offending symbol.
		symbol: char,
	},
	/// Alphabet lists a symbol twice, which would bias generation.
	#[error("Token alphabet repeats symbol {symbol:?}.")]
	DuplicateAlphabetSymbol {
		/// Repeated symbol.
		symbol: char,
	},
	/// Default token lifetime must be positive.
	#[error("Token TTL must be positive.")]
	NonPositiveTtl,
	/// Generation needs at least one attempt.
	#[error("Token generation must allow at least one attempt.")]
	ZeroAttempts,
	/// Rate limit of zero would reject every caller.
	#[error("Rate limit must admit at least one request per window.")]
	ZeroLimit,
	/// Rate-limit windows must be positive.
	#[error("Rate-limit window must be positive.")]
	NonPositiveWindow,
	/// Sweep interval must be positive.
	#[error("Sweep interval must be positive.")]
	NonPositiveSweepInterval,
	/// A duration setting exceeds its supported maximum.
	#[error("`{field}` must not exceed {max}.")]
	DurationOutOfRange {
		/// Offending setting.
		field: &'static str,
		/// Largest accepted value.
		max: Duration,
	},
	/// Configuration document could not be parsed.
	#[error("Configuration could not be parsed.")]
	Parse {
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
