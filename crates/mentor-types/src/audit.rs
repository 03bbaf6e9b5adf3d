//! Audit types for relationship mutations (governance and reconciliation).

use crate::{Operation, SupportRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One recorded attach/detach mutation. Outcome is "ok" for committed
/// writes and carries the error text when persistence failed partway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub operation: Operation,
    pub actor_id: String,
    pub student_id: String,
    pub support_role: SupportRole,
    pub counterpart_id: String,
    /// RFC3339.
    pub timestamp: String,
    pub outcome: String,
}

/// Options for listing audit events (filter + pagination). Events come
/// back newest first.
#[derive(Debug, Clone, Default)]
pub struct AuditListOptions {
    pub student_id: Option<String>,
    pub actor_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Append-only audit sink. Append failures must never fail the mutation
/// that produced the event.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, event: AuditEvent) -> Result<(), AuditStoreError>;

    async fn list(&self, opts: &AuditListOptions) -> Result<Vec<AuditEvent>, AuditStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditStoreError {
    #[error("audit store error: {0}")]
    Other(String),
}
