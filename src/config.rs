//! Tunable policies for token issuance, admission control, and counter eviction.
//!
//! Every policy deserializes from JSON with defaults for omitted fields. Durations are expressed
//! in whole seconds (`ttl_secs`, `window_secs`, `sweep_interval_secs`).

// self
use crate::{
	_prelude::*,
	auth::{DEFAULT_ALPHABET, DEFAULT_TOKEN_LENGTH, TokenGenerator},
	error::ConfigError,
};

/// Token issuance policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPolicy {
	/// Number of symbols per token.
	pub length: usize,
	/// Symbols tokens are drawn from.
	pub alphabet: String,
	/// Lifetime applied when the caller does not pick one.
	#[serde(rename = "ttl_secs", with = "seconds")]
	pub ttl: Duration,
	/// Upper bound on candidates tried before giving up.
	pub max_attempts: u32,
}
impl TokenPolicy {
	/// Default token lifetime.
	pub const DEFAULT_TTL: Duration = Duration::days(7);
	/// Default generation retry bound.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
	/// Longest lifetime a token may carry.
	pub const MAX_TTL: Duration = Duration::days(365);

	/// Overrides the token length.
	pub fn with_length(mut self, length: usize) -> Self {
		self.length = length;

		self
	}

	/// Overrides the alphabet.
	pub fn with_alphabet(mut self, alphabet: impl Into<String>) -> Self {
		self.alphabet = alphabet.into();

		self
	}

	/// Overrides the default lifetime.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Overrides the generation retry bound.
	pub fn with_max_attempts(mut self, attempts: u32) -> Self {
		self.max_attempts = attempts;

		self
	}

	/// Validates the policy and builds the matching generator.
	pub fn generator(&self) -> Result<TokenGenerator, ConfigError> {
		if !self.ttl.is_positive() {
			return Err(ConfigError::NonPositiveTtl);
		}
		if self.ttl > Self::MAX_TTL {
			return Err(ConfigError::DurationOutOfRange { field: "ttl", max: Self::MAX_TTL });
		}
		if self.max_attempts == 0 {
			return Err(ConfigError::ZeroAttempts);
		}

		TokenGenerator::new(self.length, &self.alphabet)
	}
}
impl Default for TokenPolicy {
	fn default() -> Self {
		Self {
			length: DEFAULT_TOKEN_LENGTH,
			alphabet: DEFAULT_ALPHABET.into(),
			ttl: Self::DEFAULT_TTL,
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
		}
	}
}

/// Fixed-window admission policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
	/// Requests admitted per window.
	pub limit: u32,
	/// Window length.
	#[serde(rename = "window_secs", with = "seconds")]
	pub window: Duration,
}
impl RateLimitPolicy {
	/// Default requests per window.
	pub const DEFAULT_LIMIT: u32 = 100;
	/// Default window length.
	pub const DEFAULT_WINDOW: Duration = Duration::seconds(60);
	/// Longest accepted window.
	pub const MAX_WINDOW: Duration = Duration::days(1);

	/// Creates a policy admitting `limit` requests per `window`.
	pub const fn new(limit: u32, window: Duration) -> Self {
		Self { limit, window }
	}

	/// Checks that the policy can admit anything at all.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.limit == 0 {
			return Err(ConfigError::ZeroLimit);
		}
		if !self.window.is_positive() {
			return Err(ConfigError::NonPositiveWindow);
		}
		if self.window > Self::MAX_WINDOW {
			return Err(ConfigError::DurationOutOfRange { field: "window", max: Self::MAX_WINDOW });
		}

		Ok(())
	}
}
impl Default for RateLimitPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_LIMIT, Self::DEFAULT_WINDOW)
	}
}

/// Top-level configuration grouping every tunable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestPassConfig {
	/// Issuance policy.
	pub token: TokenPolicy,
	/// Default admission policy.
	pub rate_limit: RateLimitPolicy,
	/// Period of the counter eviction sweep.
	#[serde(rename = "sweep_interval_secs", with = "seconds")]
	pub sweep_interval: Duration,
}
impl GuestPassConfig {
	/// Default eviction period.
	pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::minutes(5);
	/// Longest accepted eviction period.
	pub const MAX_SWEEP_INTERVAL: Duration = Duration::days(1);

	/// Parses a JSON document, reporting the failing field path on error.
	pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(payload);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Validates every nested policy.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.token.generator()?;
		self.rate_limit.validate()?;

		if !self.sweep_interval.is_positive() {
			return Err(ConfigError::NonPositiveSweepInterval);
		}
		if self.sweep_interval > Self::MAX_SWEEP_INTERVAL {
			return Err(ConfigError::DurationOutOfRange {
				field: "sweep_interval",
				max: Self::MAX_SWEEP_INTERVAL,
			});
		}

		Ok(())
	}
}
impl Default for GuestPassConfig {
	fn default() -> Self {
		Self {
			token: TokenPolicy::default(),
			rate_limit: RateLimitPolicy::default(),
			sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
		}
	}
}

mod seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = GuestPassConfig::default();

		assert_eq!(config.token.length, 10);
		assert_eq!(config.token.alphabet.len(), 62);
		assert_eq!(config.token.ttl, Duration::days(7));
		assert_eq!(config.token.max_attempts, 10);
		assert_eq!(config.rate_limit, RateLimitPolicy::new(100, Duration::seconds(60)));
		assert_eq!(config.sweep_interval, Duration::minutes(5));
		config.validate().expect("Default configuration should validate.");
	}

	#[test]
	fn json_overrides_merge_with_defaults() {
		let config = GuestPassConfig::from_json_str(
			r#"{ "token": { "ttl_secs": 3600 }, "rate_limit": { "limit": 3, "window_secs": 1 } }"#,
		)
		.expect("Partial configuration should parse.");

		assert_eq!(config.token.ttl, Duration::hours(1));
		assert_eq!(config.token.length, 10);
		assert_eq!(config.rate_limit, RateLimitPolicy::new(3, Duration::seconds(1)));
		assert_eq!(config.sweep_interval, Duration::minutes(5));
	}

	#[test]
	fn parse_errors_report_the_field_path() {
		let err = GuestPassConfig::from_json_str(r#"{ "rate_limit": { "limit": "many" } }"#)
			.expect_err("Non-numeric limit must be rejected.");

		match err {
			ConfigError::Parse { source } =>
				assert_eq!(source.path().to_string(), "rate_limit.limit"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn invalid_policies_are_rejected() {
		assert!(matches!(
			GuestPassConfig::from_json_str(r#"{ "rate_limit": { "limit": 0 } }"#),
			Err(ConfigError::ZeroLimit)
		));
		assert!(matches!(
			GuestPassConfig::from_json_str(r#"{ "token": { "ttl_secs": 0 } }"#),
			Err(ConfigError::NonPositiveTtl)
		));
		assert!(matches!(
			GuestPassConfig::from_json_str(r#"{ "token": { "max_attempts": 0 } }"#),
			Err(ConfigError::ZeroAttempts)
		));
		assert!(matches!(
			GuestPassConfig::from_json_str(r#"{ "sweep_interval_secs": -5 }"#),
			Err(ConfigError::NonPositiveSweepInterval)
		));
		assert!(matches!(
			TokenPolicy::default().with_alphabet("x").generator(),
			Err(ConfigError::AlphabetTooSmall { size: 1 })
		));
	}

	#[test]
	fn oversized_durations_are_rejected_at_load() {
		assert!(matches!(
			GuestPassConfig::from_json_str(r#"{ "token": { "ttl_secs": 9000000000000 } }"#),
			Err(ConfigError::DurationOutOfRange { field: "ttl", .. })
		));
		assert!(matches!(
			GuestPassConfig::from_json_str(r#"{ "rate_limit": { "window_secs": 9000000000000 } }"#),
			Err(ConfigError::DurationOutOfRange { field: "window", .. })
		));
		assert!(matches!(
			GuestPassConfig::from_json_str(r#"{ "sweep_interval_secs": 9000000000000 }"#),
			Err(ConfigError::DurationOutOfRange { field: "sweep_interval", .. })
		));

		let longest = GuestPassConfig::from_json_str(r#"{ "token": { "ttl_secs": 31536000 } }"#)
			.expect("A one-year lifetime is the inclusive maximum.");

		assert_eq!(longest.token.ttl, TokenPolicy::MAX_TTL);
	}
}
