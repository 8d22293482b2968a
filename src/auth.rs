//! Auth-domain identifiers, token secrets, records, and candidate generation.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{generator::*, record::*, secret::*};
