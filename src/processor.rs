use std::sync::Arc;

use anyhow::{Error, Result};
use tracing::{debug, info, warn};

use crate::{
    clients::{
        audit::AuditLogWriter,
        store::{EventFilter, EventStore},
        transport::Transport,
    },
    config::Config,
    models::{
        audit::CreateAuditLog,
        error::DispatchError,
        event::{Event, EventKind, StatusPatch},
        status::{DispatchOutcome, EventStatus},
    },
    rules,
};

/// What `dispatch` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Every delivery succeeded and the pending-to-sent transition committed.
    Sent,
    /// At least one delivery failed and the event was marked failed.
    Failed,
    /// The event was no longer pending; nothing was done.
    Skipped,
    /// Another processor committed the status transition first.
    Superseded,
}

/// Consumes pending events and turns them into outbound deliveries.
///
/// Multiple uncoordinated processor instances may observe the same pending
/// event; the store's conditional update is the only coordination point, so
/// at most one of them commits the status transition. Transport calls happen
/// before the commit and cannot be undone, so duplicate sends across
/// processors are rare but possible (at-least-once, not exactly-once).
pub struct NotificationProcessor {
    store: Arc<dyn EventStore>,
    transport: Arc<dyn Transport>,
    audit: AuditLogWriter,
    config: Config,
}

impl NotificationProcessor {
    pub fn new(
        store: Arc<dyn EventStore>,
        transport: Arc<dyn Transport>,
        audit: AuditLogWriter,
        config: Config,
    ) -> Self {
        Self {
            store,
            transport,
            audit,
            config,
        }
    }

    /// Consume pending events matching `filter` until the subscription ends.
    /// One failing event never stops the loop.
    pub async fn watch(&self, filter: EventFilter) -> Result<(), Error> {
        let kind_label = filter.kind.clone().unwrap_or_else(|| "*".to_string());
        let mut subscription = self.store.subscribe(filter).await?;

        info!(kind = %kind_label, "Watching for pending events");

        while let Some(event) = subscription.next().await {
            if let Err(e) = self.dispatch(&event).await {
                warn!(id = %event.id, error = %e, "Dispatch failed");
            }
        }

        debug!(kind = %kind_label, "Subscription ended");

        Ok(())
    }

    /// Resolve the rule for one event, invoke the transport per delivery, and
    /// commit the status transition. A no-op for events that are already
    /// settled.
    pub async fn dispatch(&self, event: &Event) -> Result<Disposition, Error> {
        if event.status != EventStatus::Pending {
            debug!(id = %event.id, status = %event.status, "Event already settled, skipping");
            return Ok(Disposition::Skipped);
        }

        let kind = match EventKind::parse(&event.kind) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(id = %event.id, kind = %event.kind, "No dispatch rule for event kind");
                return self.commit_failed(event, e.to_string()).await;
            }
        };

        let deliveries = rules::deliveries_for(kind, &self.config);
        let mut failures: Vec<String> = Vec::new();

        for delivery in &deliveries {
            let recipient = delivery.recipient.resolve(&event.payload, &self.config);
            let fields = (delivery.fields)(&event.payload, &self.config);
            let template_id = delivery.template.id(&self.config);

            match self
                .transport
                .send(delivery.channel, template_id, fields)
                .await
            {
                Ok(()) => {
                    info!(
                        id = %event.id,
                        channel = %delivery.channel,
                        recipient = %recipient,
                        "Delivery accepted"
                    );

                    self.audit
                        .record(CreateAuditLog::new(
                            event.id.clone(),
                            event.kind.clone(),
                            delivery.channel,
                            recipient,
                            delivery.subject.to_string(),
                            DispatchOutcome::Sent,
                        ))
                        .await;
                }
                Err(e) => {
                    warn!(
                        id = %event.id,
                        channel = %delivery.channel,
                        error = %e,
                        "Delivery failed"
                    );

                    self.audit
                        .record(
                            CreateAuditLog::new(
                                event.id.clone(),
                                event.kind.clone(),
                                delivery.channel,
                                recipient,
                                delivery.subject.to_string(),
                                DispatchOutcome::Failed,
                            )
                            .with_error(e.to_string()),
                        )
                        .await;

                    failures.push(e.to_string());
                }
            }
        }

        if failures.is_empty() {
            self.commit_sent(event).await
        } else {
            self.commit_failed(event, failures.join("; ")).await
        }
    }

    async fn commit_sent(&self, event: &Event) -> Result<Disposition, Error> {
        let committed = self
            .store
            .update_if_status(&event.id, EventStatus::Pending, StatusPatch::sent())
            .await
            .map_err(|e| DispatchError::StoreWrite(e.to_string()))?;

        if committed {
            info!(id = %event.id, kind = %event.kind, "Event dispatched");
            Ok(Disposition::Sent)
        } else {
            debug!(id = %event.id, "Another processor settled this event first");
            Ok(Disposition::Superseded)
        }
    }

    async fn commit_failed(&self, event: &Event, error: String) -> Result<Disposition, Error> {
        let committed = self
            .store
            .update_if_status(
                &event.id,
                EventStatus::Pending,
                StatusPatch::failed(error),
            )
            .await
            .map_err(|e| DispatchError::StoreWrite(e.to_string()))?;

        if committed {
            Ok(Disposition::Failed)
        } else {
            debug!(id = %event.id, "Another processor settled this event first");
            Ok(Disposition::Superseded)
        }
    }
}
