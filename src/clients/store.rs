use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    event::{Event, NewEvent, StatusPatch},
    status::EventStatus,
};

/// Subscription filter. `kind: None` matches every pending event.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub kind: Option<String>,
}

impl EventFilter {
    pub fn any() -> Self {
        Self { kind: None }
    }

    pub fn for_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
        }
    }

    fn matches(&self, event: &Event) -> bool {
        self.kind.as_deref().is_none_or(|kind| kind == event.kind)
    }
}

/// Push subscription over newly-pending events. Dropping the handle stops
/// delivery; it never aborts a dispatch already in flight.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Subscription {
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// The durable event store collaborator. Coordination between uncoordinated
/// processors happens exclusively through `update_if_status`: the transition
/// out of `pending` is a single-writer commit per event id.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new event with `status = pending`; the store assigns id and
    /// creation timestamp.
    async fn insert(&self, event: NewEvent) -> Result<Event, Error>;

    async fn get(&self, id: &str) -> Result<Option<Event>, Error>;

    /// Atomic update-if-matching-previous-status. Returns `false` when the
    /// current status no longer equals `expected` (another writer won).
    async fn update_if_status(
        &self,
        id: &str,
        expected: EventStatus,
        patch: StatusPatch,
    ) -> Result<bool, Error>;

    /// Yields events already pending at subscription time, then every event
    /// that newly enters `pending` (inserts and manual retries alike).
    async fn subscribe(&self, filter: EventFilter) -> Result<Subscription, Error>;
}

struct Subscriber {
    filter: EventFilter,
    tx: mpsc::UnboundedSender<Event>,
}

#[derive(Default)]
struct StoreInner {
    events: Vec<Event>,
    subscribers: Vec<Subscriber>,
}

/// In-process implementation of the store contract, used by tests and local
/// runs. Everything lives behind one lock so replay-then-register in
/// `subscribe` cannot miss a concurrent insert.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<StoreInner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pending_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Pending)
            .count()
    }

    fn fan_out(subscribers: &mut Vec<Subscriber>, event: &Event) {
        subscribers.retain(|sub| {
            if !sub.filter.matches(event) {
                return !sub.tx.is_closed();
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event, Error> {
        let record = Event {
            id: Uuid::new_v4().to_string(),
            kind: event.kind,
            payload: event.payload,
            status: EventStatus::Pending,
            created_at: Utc::now(),
            sent_at: None,
            failed_at: None,
            error: None,
        };

        let mut inner = self.inner.write().await;
        let StoreInner {
            events,
            subscribers,
        } = &mut *inner;

        events.push(record.clone());
        Self::fan_out(subscribers, &record);

        debug!(id = %record.id, kind = %record.kind, "Event inserted");

        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<Event>, Error> {
        let inner = self.inner.read().await;
        Ok(inner.events.iter().find(|e| e.id == id).cloned())
    }

    async fn update_if_status(
        &self,
        id: &str,
        expected: EventStatus,
        patch: StatusPatch,
    ) -> Result<bool, Error> {
        let mut inner = self.inner.write().await;
        let StoreInner {
            events,
            subscribers,
        } = &mut *inner;

        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("No event with id {}", id))?;

        if event.status != expected {
            debug!(
                id = %event.id,
                current = %event.status,
                expected = %expected,
                "Conditional update rejected"
            );
            return Ok(false);
        }

        event.status = patch.status;
        match patch.status {
            EventStatus::Sent => {
                event.sent_at = Some(Utc::now());
                event.error = None;
            }
            EventStatus::Failed => {
                event.failed_at = Some(Utc::now());
                event.error = patch.error;
            }
            EventStatus::Pending => {
                event.error = None;
            }
        }

        if event.status == EventStatus::Pending {
            let record = event.clone();
            Self::fan_out(subscribers, &record);
        }

        Ok(true)
    }

    async fn subscribe(&self, filter: EventFilter) -> Result<Subscription, Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.inner.write().await;

        for event in inner
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Pending && filter.matches(e))
        {
            let _ = tx.send(event.clone());
        }

        inner.subscribers.push(Subscriber { filter, tx });

        Ok(Subscription { rx })
    }
}
