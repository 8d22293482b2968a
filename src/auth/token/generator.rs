//! Random token candidates drawn uniformly from a fixed alphabet.

// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, auth::token::secret::AccessToken, error::ConfigError};

/// Default token length in symbols.
pub const DEFAULT_TOKEN_LENGTH: usize = 10;
/// Default 62-symbol alphanumeric alphabet.
pub const DEFAULT_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Produces token candidates for issuance.
///
/// Candidates are not guaranteed unique; the store arbitrates collisions.
pub trait CandidateSource
where
	Self: Send + Sync,
{
	/// Returns a freshly generated candidate.
	fn candidate(&self) -> AccessToken;
}

/// Cryptographically secure candidate source backed by the thread-local CSPRNG.
#[derive(Clone, Debug)]
pub struct TokenGenerator {
	length: usize,
	alphabet: Vec<u8>,
}
impl TokenGenerator {
	/// Creates a generator emitting `length` symbols from `alphabet`.
	///
	/// The alphabet must hold at least two distinct printable ASCII symbols.
	pub fn new(length: usize, alphabet: &str) -> Result<Self, ConfigError> {
		if length == 0 {
			return Err(ConfigError::ZeroTokenLength);
		}

		let mut symbols = Vec::with_capacity(alphabet.len());

		for symbol in alphabet.chars() {
			if !symbol.is_ascii_graphic() {
				return Err(ConfigError::InvalidAlphabetSymbol { symbol });
			}

			let byte = symbol as u8;

			if symbols.contains(&byte) {
				return Err(ConfigError::DuplicateAlphabetSymbol { symbol });
			}

			symbols.push(byte);
		}

		if symbols.len() < 2 {
			return Err(ConfigError::AlphabetTooSmall { size: symbols.len() });
		}

		Ok(Self { length, alphabet: symbols })
	}

	/// Returns the number of symbols per token.
	pub fn length(&self) -> usize {
		self.length
	}

	/// Returns the alphabet size.
	pub fn alphabet_size(&self) -> usize {
		self.alphabet.len()
	}

	/// Returns the entropy of one candidate in bits.
	pub fn entropy_bits(&self) -> f64 {
		self.length as f64 * (self.alphabet.len() as f64).log2()
	}
}
impl Default for TokenGenerator {
	fn default() -> Self {
		Self { length: DEFAULT_TOKEN_LENGTH, alphabet: DEFAULT_ALPHABET.as_bytes().to_vec() }
	}
}
impl CandidateSource for TokenGenerator {
	fn candidate(&self) -> AccessToken {
		let mut rng = rand::rng();
		let value = (0..self.length)
			.map(|_| char::from(self.alphabet[rng.random_range(0..self.alphabet.len())]))
			.collect::<String>();

		AccessToken::new(value)
	}
}
