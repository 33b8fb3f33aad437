use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::{error::DispatchError, status::EventStatus};

/// Kind-specific fields carried by an event. Values are JSON scalars in
/// practice; anything else projects to an empty string at dispatch time.
pub type Payload = HashMap<String, JsonValue>;

/// The event kinds the dispatch rule table knows about. Events are stored
/// with a string tag and parsed into this enum when dispatched, so a record
/// written with a tag no rule covers surfaces as `UnknownEventKind` instead
/// of being silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NewBooking,
    NewMessage,
    NewReview,
    AdminReply,
}

impl EventKind {
    pub fn parse(tag: &str) -> Result<Self, DispatchError> {
        match tag {
            "new_booking" => Ok(EventKind::NewBooking),
            "new_message" => Ok(EventKind::NewMessage),
            "new_review" => Ok(EventKind::NewReview),
            "admin_reply" => Ok(EventKind::AdminReply),
            other => Err(DispatchError::UnknownEventKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NewBooking => "new_booking",
            EventKind::NewMessage => "new_message",
            EventKind::NewReview => "new_review",
            EventKind::AdminReply => "admin_reply",
        }
    }
}

/// A durable intake record awaiting notification dispatch. The store assigns
/// `id` and `created_at` on insert and stamps `sent_at`/`failed_at` when the
/// matching status transition commits. `payload` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub kind: String,
    pub payload: Payload,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Insert payload for a new event; always enters the store as `pending`.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub kind: String,
    pub payload: Payload,
}

impl NewEvent {
    pub fn new(kind: EventKind, payload: Payload) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            payload,
        }
    }
}

/// Target state for a guarded status transition. Timestamps are assigned by
/// the store when the transition commits, not by the caller.
#[derive(Debug, Clone)]
pub struct StatusPatch {
    pub status: EventStatus,
    pub error: Option<String>,
}

impl StatusPatch {
    pub fn sent() -> Self {
        Self {
            status: EventStatus::Sent,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: EventStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn pending() -> Self {
        Self {
            status: EventStatus::Pending,
            error: None,
        }
    }
}
