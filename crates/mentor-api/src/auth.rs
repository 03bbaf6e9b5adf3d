//! Bearer-token actor resolution.

use axum::http::{header, HeaderMap};
use mentor_types::{Profile, ProfileId, ProfileStore, ProfileStoreError};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolves a bearer token to the acting profile. `Ok(None)` means the
/// token is unknown; errors are store failures.
#[async_trait::async_trait]
pub trait ActorResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<Profile>, ProfileStoreError>;
}

/// Token table backed by the profile store: token -> profile id, with the
/// profile re-read on every request so role changes take effect without a
/// new token. Token issuance itself happens in the identity service;
/// entries arrive here from the environment or the bootstrap path.
pub struct TokenDirectory {
    tokens: RwLock<HashMap<String, ProfileId>>,
    store: Arc<dyn ProfileStore + Send + Sync>,
}

impl TokenDirectory {
    pub fn new(store: Arc<dyn ProfileStore + Send + Sync>) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            store,
        }
    }

    pub async fn register(&self, token: impl Into<String>, profile_id: ProfileId) {
        self.tokens.write().await.insert(token.into(), profile_id);
    }

    /// Loads token -> profile-id pairs from a JSON object, the format of
    /// the MENTOR_API_TOKENS environment variable. Entries with malformed
    /// ids are skipped with a warning. Returns how many were loaded.
    pub async fn load_json(&self, json: &str) -> Result<usize, serde_json::Error> {
        let map: HashMap<String, String> = serde_json::from_str(json)?;
        let mut guard = self.tokens.write().await;
        let mut loaded = 0;
        for (token, raw_id) in map {
            match ProfileId::from_str(&raw_id) {
                Ok(id) => {
                    guard.insert(token, id);
                    loaded += 1;
                }
                Err(_) => {
                    tracing::warn!(profile_id = %raw_id, "skipping token with malformed profile id");
                }
            }
        }
        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl ActorResolver for TokenDirectory {
    async fn resolve(&self, token: &str) -> Result<Option<Profile>, ProfileStoreError> {
        let id = {
            let guard = self.tokens.read().await;
            guard.get(token).copied()
        };
        match id {
            Some(id) => self.store.find_by_id(&id).await,
            None => Ok(None),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
