//! Core types and traits for the mentorship relationship API.
//!
//! Profile documents keep camelCase field names for JSON compatibility with
//! the existing profile collection.

mod audit;
mod profile;
mod traits;

pub use audit::*;
pub use profile::*;
pub use traits::*;
