//! Profile store implementations: in-memory and optional SQLite.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryProfileStore;
pub use mentor_types::{Profile, ProfileId, ProfileStore, ProfileStoreError};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteProfileStore;
