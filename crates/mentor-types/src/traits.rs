//! Traits for profile storage and the relationship engine.

use crate::{Profile, ProfileId, RelationshipRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Profile persistence abstraction. Registration and deletion happen in
/// another service; this API only reads profiles and writes edge updates
/// back.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get one profile by id.
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, ProfileStoreError>;

    /// Upsert a full profile document, returning what was stored.
    async fn save(&self, profile: Profile) -> Result<Profile, ProfileStoreError>;
}

#[async_trait]
impl<T> ProfileStore for Arc<T>
where
    T: ProfileStore + ?Sized,
{
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, ProfileStoreError> {
        (**self).find_by_id(id).await
    }

    async fn save(&self, profile: Profile) -> Result<Profile, ProfileStoreError> {
        (**self).save(profile).await
    }
}

/// Relationship graph abstraction: attach and detach the bidirectional edge
/// between a student and a counterpart, on behalf of an acting profile.
#[async_trait]
pub trait RelationshipGraph: Send + Sync {
    async fn attach(
        &self,
        request: &RelationshipRequest,
        actor: &Profile,
    ) -> Result<(), RelationshipError>;

    async fn detach(
        &self,
        request: &RelationshipRequest,
        actor: &Profile,
    ) -> Result<(), RelationshipError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("profile store error: {0}")]
    Other(String),
}

/// Failure taxonomy for relationship mutations, in the order the engine
/// checks them: request shape, then id resolution, then authorization,
/// then persistence.
#[derive(Debug, thiserror::Error)]
pub enum RelationshipError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("persistence: {0}")]
    Persistence(#[from] ProfileStoreError),
}
