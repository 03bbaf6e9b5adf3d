//! In-memory profile store.

use mentor_types::{Profile, ProfileId, ProfileStore, ProfileStoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of ProfileStore.
/// Documents are cloned on the way in and out, so callers always hold a
/// detached copy and must write changes back through save. That mirrors the
/// read-modify-write cycle against the real document store, including its
/// lost-update behavior under concurrent saves.
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<ProfileId, Profile>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, ProfileStoreError> {
        let guard = self.profiles.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn save(&self, profile: Profile) -> Result<Profile, ProfileStoreError> {
        let mut guard = self.profiles.write().await;
        guard.insert(profile.id, profile.clone());
        Ok(profile)
    }
}
