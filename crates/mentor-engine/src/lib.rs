//! Relationship engine: query normalization, role policy, and the
//! attach/detach mutation core.

mod engine;
mod policy;
mod query;

pub use engine::RelationshipEngine;
pub use policy::is_allowed;
pub use query::normalize_query;
