//! Collaborator contracts consumed by the detection engine.
//!
//! The engine talks to three stores: an append-only event log, a rule
//! source, and an alert sink. Each is an injected trait so the cycle can
//! be driven against in-memory fakes in tests and real backends in
//! production. [`memory`] provides reference implementations; [`file`]
//! provides a YAML-file-backed rule store with hot-reload.

pub mod file;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use watchtower_core::{Alert, AlertDraft, DetectionRule, EventId, SecurityEvent};

/// Errors surfaced by store and sink implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Durable append-only security event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Fetch up to `limit` unprocessed events, oldest first.
    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError>;

    /// Flip the processed flag for the given events. Unknown IDs are
    /// ignored; repeated calls are idempotent.
    async fn mark_processed(&self, ids: &[EventId]) -> Result<(), StoreError>;
}

/// Source of detection rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Fetch all currently enabled rules.
    async fn fetch_enabled(&self) -> Result<Vec<DetectionRule>, StoreError>;
}

/// Persists alerts. The sink assigns the record ID, creation timestamp,
/// and the initial `pending` status.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn create(&self, draft: AlertDraft) -> Result<Alert, StoreError>;
}

// Blanket impls so `Arc<dyn …>` can be used directly.

#[async_trait]
impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        (**self).fetch_unprocessed(limit).await
    }

    async fn mark_processed(&self, ids: &[EventId]) -> Result<(), StoreError> {
        (**self).mark_processed(ids).await
    }
}

#[async_trait]
impl<T: RuleStore + ?Sized> RuleStore for Arc<T> {
    async fn fetch_enabled(&self) -> Result<Vec<DetectionRule>, StoreError> {
        (**self).fetch_enabled().await
    }
}

#[async_trait]
impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    async fn create(&self, draft: AlertDraft) -> Result<Alert, StoreError> {
        (**self).create(draft).await
    }
}
