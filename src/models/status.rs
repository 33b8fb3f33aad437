use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Business status of an event. `Pending` events are eligible for dispatch;
/// `Sent`/`Failed` are settled. A manual admin retry moves `Failed` back to
/// `Pending`, which is the only non-monotonic transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Sent,
    Failed,
}

/// Outcome of a single transport invocation, recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Sent,
    Failed,
}

impl Display for EventStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            EventStatus::Pending => write!(f, "pending"),
            EventStatus::Sent => write!(f, "sent"),
            EventStatus::Failed => write!(f, "failed"),
        }
    }
}

impl Display for DispatchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DispatchOutcome::Sent => write!(f, "sent"),
            DispatchOutcome::Failed => write!(f, "failed"),
        }
    }
}
