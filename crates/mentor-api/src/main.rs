//! Mentorship relationship API server: /api/v1/attach, /api/v1/detach.

use mentor_api::auth::TokenDirectory;
use mentor_api::server::{self, AppState, InMemoryAuditStore, JsonlAuditStore};
use mentor_engine::RelationshipEngine;
use mentor_store::InMemoryProfileStore;
use mentor_types::{AuditStore, Profile, ProfileStore, RelationshipGraph, Role};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Bootstrap admin described by the MENTOR_ROOT_ADMIN environment variable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootAdmin {
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = Arc::new(InMemoryProfileStore::new());
    let store_dyn: Arc<dyn ProfileStore + Send + Sync> = store.clone();
    let actors = Arc::new(TokenDirectory::new(store_dyn.clone()));

    // A fresh deployment has no admin to hand out access with, so one can
    // be seeded from the environment together with its API token.
    if let Ok(raw) = std::env::var("MENTOR_ROOT_ADMIN") {
        let root: RootAdmin = serde_json::from_str(&raw)?;
        let token = std::env::var("MENTOR_ROOT_TOKEN")
            .map_err(|_| "MENTOR_ROOT_TOKEN must be set when MENTOR_ROOT_ADMIN is used")?;
        let profile = store_dyn
            .save(Profile::new(
                Role::Admin,
                root.email,
                root.first_name,
                root.last_name,
            ))
            .await?;
        tracing::info!(admin = %profile.id, "seeded root admin profile");
        actors.register(token, profile.id).await;
    }
    if let Ok(raw) = std::env::var("MENTOR_API_TOKENS") {
        let loaded = actors.load_json(&raw).await?;
        tracing::info!(loaded, "token directory loaded from environment");
    }

    let audit_log: Arc<dyn AuditStore + Send + Sync> = match std::env::var("MENTOR_AUDIT_LOG") {
        Ok(path) => Arc::new(JsonlAuditStore::new(path)),
        Err(_) => Arc::new(InMemoryAuditStore::new()),
    };
    let engine: Arc<dyn RelationshipGraph + Send + Sync> =
        Arc::new(RelationshipEngine::new(store_dyn));

    let state = Arc::new(AppState {
        engine,
        actors,
        audit_log,
    });
    let app = server::router(state);
    let addr: SocketAddr = std::env::var("MENTOR_LISTEN")
        .unwrap_or_else(|_| "0.0.0.0:8401".to_string())
        .parse()?;
    tracing::info!("mentorship API listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
