//! Axum server and routes.

use crate::auth::{bearer_token, ActorResolver};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mentor_engine::normalize_query;
use mentor_types::{
    AuditEvent, AuditListOptions, AuditStore, AuditStoreError, Operation, Profile,
    RelationshipError, RelationshipGraph, RelationshipRequest, Role,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// In-memory implementation of AuditStore (process lifetime only).
pub struct InMemoryAuditStore {
    events: tokio::sync::RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self {
            events: tokio::sync::RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, event: AuditEvent) -> Result<(), AuditStoreError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn list(&self, opts: &AuditListOptions) -> Result<Vec<AuditEvent>, AuditStoreError> {
        let guard = self.events.read().await;
        let mut out: Vec<AuditEvent> = guard.iter().cloned().collect();
        apply_audit_list_opts(&mut out, opts);
        Ok(out)
    }
}

/// JSONL file-backed AuditStore (persists across restarts). Lines that no
/// longer parse are skipped on read.
pub struct JsonlAuditStore {
    path: std::path::PathBuf,
    append_lock: tokio::sync::Mutex<()>,
}

impl JsonlAuditStore {
    pub fn new(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait::async_trait]
impl AuditStore for JsonlAuditStore {
    async fn append(&self, event: AuditEvent) -> Result<(), AuditStoreError> {
        let _guard = self.append_lock.lock().await;
        let line = serde_json::to_string(&event)
            .map_err(|e| AuditStoreError::Other(e.to_string()))?;
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AuditStoreError::Other(e.to_string()))?;
        f.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| AuditStoreError::Other(e.to_string()))?;
        Ok(())
    }

    async fn list(&self, opts: &AuditListOptions) -> Result<Vec<AuditEvent>, AuditStoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AuditStoreError::Other(e.to_string())),
        };
        let mut out: Vec<AuditEvent> = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Ok(event) = serde_json::from_str(line) {
                out.push(event);
            }
        }
        apply_audit_list_opts(&mut out, opts);
        Ok(out)
    }
}

fn apply_audit_list_opts(out: &mut Vec<AuditEvent>, opts: &AuditListOptions) {
    if let Some(ref sid) = opts.student_id {
        out.retain(|e| &e.student_id == sid);
    }
    if let Some(ref aid) = opts.actor_id {
        out.retain(|e| &e.actor_id == aid);
    }
    // Newest first.
    out.reverse();
    let offset = opts.offset.unwrap_or(0) as usize;
    let limit = opts.limit.unwrap_or(100) as usize;
    let taken: Vec<AuditEvent> = std::mem::take(out)
        .into_iter()
        .skip(offset)
        .take(limit)
        .collect();
    *out = taken;
}

pub struct AppState {
    pub engine: Arc<dyn RelationshipGraph + Send + Sync>,
    pub actors: Arc<dyn ActorResolver + Send + Sync>,
    pub audit_log: Arc<dyn AuditStore + Send + Sync>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/attach", get(handle_attach))
        .route("/api/v1/detach", get(handle_detach))
        .route("/api/v1/audit", get(handle_audit_list))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps failures onto the wire contract. Every failure body is a JSON
/// object with a single `error` field.
#[derive(Debug)]
pub enum ApiError {
    Relationship(RelationshipError),
    Audit(AuditStoreError),
}

impl From<RelationshipError> for ApiError {
    fn from(err: RelationshipError) -> Self {
        Self::Relationship(err)
    }
}

impl From<AuditStoreError> for ApiError {
    fn from(err: AuditStoreError) -> Self {
        Self::Audit(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Relationship(RelationshipError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Relationship(RelationshipError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Relationship(RelationshipError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Relationship(RelationshipError::Persistence(_)) | ApiError::Audit(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Relationship(err) => err.to_string(),
            ApiError::Audit(err) => err.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        } else {
            tracing::warn!(%status, error = %message, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn unauthorized(message: &str) -> ApiError {
    ApiError::Relationship(RelationshipError::Unauthorized(message.to_string()))
}

async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<Profile, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| unauthorized("missing bearer token"))?;
    match state.actors.resolve(token).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => Err(unauthorized("unrecognized bearer token")),
        Err(err) => Err(ApiError::Relationship(RelationshipError::Persistence(err))),
    }
}

async fn push_audit(
    state: &AppState,
    actor: &Profile,
    operation: Operation,
    request: &RelationshipRequest,
    outcome: String,
) {
    let event = AuditEvent {
        event_id: Uuid::new_v4().to_string(),
        operation,
        actor_id: actor.id.to_string(),
        student_id: request.student_id.clone(),
        support_role: request.support_role,
        counterpart_id: request.counterpart_id.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        outcome,
    };
    let _ = state.audit_log.append(event).await;
}

/// Shared attach/detach flow: authenticate and normalize, then run the
/// engine. Mutations that reached the store (committed or failed partway)
/// leave an audit event; rejected requests do not.
async fn run_relationship(
    state: &AppState,
    headers: &HeaderMap,
    params: &[(String, String)],
    operation: Operation,
) -> Result<StatusCode, ApiError> {
    let actor = resolve_actor(state, headers).await?;
    let request = normalize_query(params)?;
    let outcome = match operation {
        Operation::Attach => state.engine.attach(&request, &actor).await,
        Operation::Detach => state.engine.detach(&request, &actor).await,
    };
    match outcome {
        Ok(()) => {
            push_audit(state, &actor, operation, &request, "ok".to_string()).await;
            Ok(StatusCode::OK)
        }
        Err(err) => {
            if matches!(err, RelationshipError::Persistence(_)) {
                push_audit(state, &actor, operation, &request, format!("failed: {}", err)).await;
            }
            Err(ApiError::Relationship(err))
        }
    }
}

async fn handle_attach(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    run_relationship(&state, &headers, &params, Operation::Attach).await
}

async fn handle_detach(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    run_relationship(&state, &headers, &params, Operation::Detach).await
}

#[derive(Debug, Deserialize)]
pub struct AuditListQuery {
    #[serde(default)]
    pub student: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

async fn handle_audit_list(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AuditListQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<AuditEvent>>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    if actor.role != Role::Admin {
        return Err(unauthorized("audit log is admin-only"));
    }
    let opts = AuditListOptions {
        student_id: q.student,
        actor_id: q.actor,
        limit: q.limit,
        offset: q.offset,
    };
    let events = state.audit_log.list(&opts).await?;
    Ok(Json(events))
}

async fn handle_health() -> &'static str {
    "ok"
}
