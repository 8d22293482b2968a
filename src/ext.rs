//! Public extension contracts for the collaborators around the token core.
//!
//! The crate ships an in-process [`RateLimiter`](crate::rate_limit::RateLimiter) but leaves
//! authorization and link delivery to the embedding service: bring your own identity provider and
//! notification channel by implementing the traits below.

pub mod authorizer;
pub mod notifier;
pub mod rate_limit;

pub use authorizer::*;
pub use notifier::*;
pub use rate_limit::*;
