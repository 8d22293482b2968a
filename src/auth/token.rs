//! Single-use token models.

pub mod generator;
pub mod record;
pub mod secret;
