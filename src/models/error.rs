use thiserror::Error;

use crate::models::transport::Channel;

/// A failed call to the outbound send API. Transient by nature: the event is
/// marked failed and stays eligible for manual admin retry.
#[derive(Debug, Clone, Error)]
#[error("{channel} transport failed: {message}")]
pub struct TransportError {
    pub channel: Channel,
    pub message: String,
}

impl TransportError {
    pub fn new(channel: Channel, message: impl Into<String>) -> Self {
        Self {
            channel,
            message: message.into(),
        }
    }
}

/// Per-event dispatch failures. Every variant is isolated to the event that
/// raised it; none of them stop the watch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The stored kind tag has no rule table entry. A configuration error,
    /// not a transient one: the event fails without any transport call.
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The store rejected a write. The event is left in an ambiguous state;
    /// the next subscription cycle or a manual audit reconciles it.
    #[error("store write failed: {0}")]
    StoreWrite(String),
}
