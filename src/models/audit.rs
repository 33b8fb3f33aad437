use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{status::DispatchOutcome, transport::Channel};

/// One dispatch attempt, recorded per transport invocation. Append-only:
/// entries are never mutated or deleted, independent of the event's own
/// business status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub event_id: String,
    pub kind: String,
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub outcome: DispatchOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub event_id: String,
    pub kind: String,
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub outcome: DispatchOutcome,
    pub error: Option<String>,
}

impl CreateAuditLog {
    pub fn new(
        event_id: String,
        kind: String,
        channel: Channel,
        recipient: String,
        subject: String,
        outcome: DispatchOutcome,
    ) -> Self {
        Self {
            event_id,
            kind,
            channel,
            recipient,
            subject,
            outcome,
            error: None,
        }
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn into_entry(self) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            event_id: self.event_id,
            kind: self.kind,
            channel: self.channel,
            recipient: self.recipient,
            subject: self.subject,
            outcome: self.outcome,
            error: self.error,
            created_at: Utc::now(),
        }
    }
}
