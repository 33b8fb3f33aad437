use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::audit::{AuditLogEntry, CreateAuditLog};

/// Append-only destination for dispatch attempt records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), Error>;
}

/// In-process audit sink used by tests and local runs. Supports the point
/// queries operational reconciliation needs ("was this email attempted?").
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }

    pub async fn entries_for(&self, event_id: &str) -> Vec<AuditLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.event_id == event_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), Error> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// Writes one record per send attempt. Never blocks or fails the dispatch
/// path: sink errors are logged to the diagnostic stream and dropped.
pub struct AuditLogWriter {
    sink: Arc<dyn AuditSink>,
}

impl AuditLogWriter {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub async fn record(&self, log: CreateAuditLog) {
        let entry = log.into_entry();
        let event_id = entry.event_id.clone();

        if let Err(e) = self.sink.append(entry).await {
            warn!(event_id = %event_id, error = %e, "Failed to write audit log");
        } else {
            debug!(event_id = %event_id, "Audit log written");
        }
    }
}
