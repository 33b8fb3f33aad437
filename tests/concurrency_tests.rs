use std::sync::Arc;

use anyhow::Result;
use futures_util::future::join_all;
use tokio::time::{Duration, sleep};

use notify_service::{
    clients::{
        audit::{AuditLogWriter, MemoryAuditLog},
        store::{EventFilter, EventStore, MemoryEventStore},
    },
    intake::Intake,
    models::{
        event::{EventKind, NewEvent, Payload},
        status::EventStatus,
        transport::Channel,
    },
    processor::{Disposition, NotificationProcessor},
};

use crate::common::{self, RecordingTransport};

/// Test: Concurrent dispatch of one event commits exactly one transition
#[tokio::test]
async fn test_concurrent_dispatch_commits_exactly_once() -> Result<()> {
    let config = common::test_config();
    let store = Arc::new(MemoryEventStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let audit = Arc::new(MemoryAuditLog::new());

    let event = store
        .insert(NewEvent::new(EventKind::NewMessage, common::message_payload()))
        .await?;

    let mut handles = vec![];

    for _ in 0..8 {
        let processor = NotificationProcessor::new(
            store.clone(),
            transport.clone(),
            AuditLogWriter::new(audit.clone()),
            config.clone(),
        );
        let event = event.clone();

        handles.push(tokio::spawn(async move {
            processor.dispatch(&event).await.unwrap()
        }));
    }

    let results: Vec<Disposition> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let sent = results.iter().filter(|d| **d == Disposition::Sent).count();
    let superseded = results
        .iter()
        .filter(|d| **d == Disposition::Superseded)
        .count();

    assert_eq!(sent, 1, "Exactly one processor must win the commit");
    assert_eq!(superseded, 7, "Losers observe the rejected transition");

    let stored = store.get(&event.id).await?.unwrap();
    assert_eq!(stored.status, EventStatus::Sent);

    Ok(())
}

/// Test: The watch loop dispatches inserts and survives a poisoned event
#[tokio::test]
async fn test_watch_survives_failing_events() -> Result<()> {
    let h = common::harness();
    let store = h.store.clone();

    let processor = Arc::new(h.processor);
    let watcher = {
        let processor = Arc::clone(&processor);
        tokio::spawn(async move { processor.watch(EventFilter::any()).await })
    };

    let bad = store
        .insert(NewEvent {
            kind: "bogus".to_string(),
            payload: Payload::new(),
        })
        .await?;

    let good = store
        .insert(NewEvent::new(EventKind::NewMessage, common::message_payload()))
        .await?;

    common::wait_for_status(&store, &good.id, EventStatus::Sent).await;
    common::wait_for_status(&store, &bad.id, EventStatus::Failed).await;

    watcher.abort();

    Ok(())
}

/// Test: A manual retry re-queues a failed event through the same stream
#[tokio::test]
async fn test_manual_retry_requeues_failed_event() -> Result<()> {
    let h = common::harness();
    let store = h.store.clone();
    let transport = h.transport.clone();

    transport.fail_channel(Channel::Email, "upstream maintenance");

    let processor = Arc::new(h.processor);
    let watcher = {
        let processor = Arc::clone(&processor);
        tokio::spawn(async move {
            processor
                .watch(EventFilter::for_kind(EventKind::NewMessage.as_str()))
                .await
        })
    };

    let event = store
        .insert(NewEvent::new(EventKind::NewMessage, common::message_payload()))
        .await?;

    common::wait_for_status(&store, &event.id, EventStatus::Failed).await;

    transport.clear_failures();

    let intake = Intake::new(store.clone());
    assert!(intake.retry_event(&event.id).await?);

    common::wait_for_status(&store, &event.id, EventStatus::Sent).await;

    let stored = store.get(&event.id).await?.unwrap();
    assert!(stored.error.is_none(), "Error cleared on successful retry");

    watcher.abort();

    Ok(())
}

/// Test: Subscribing replays events that were already pending
#[tokio::test]
async fn test_subscription_replays_pending_events() -> Result<()> {
    let store = MemoryEventStore::new();

    let first = store
        .insert(NewEvent::new(EventKind::NewMessage, common::message_payload()))
        .await?;
    let second = store
        .insert(NewEvent::new(EventKind::NewMessage, common::message_payload()))
        .await?;

    // A booking must not leak through the kind filter.
    store
        .insert(NewEvent::new(EventKind::NewBooking, common::booking_payload()))
        .await?;

    let mut subscription = store
        .subscribe(EventFilter::for_kind(EventKind::NewMessage.as_str()))
        .await?;

    let replayed_one = subscription.next().await.unwrap();
    let replayed_two = subscription.next().await.unwrap();

    assert_eq!(replayed_one.id, first.id);
    assert_eq!(replayed_two.id, second.id);

    let third = store
        .insert(NewEvent::new(EventKind::NewMessage, common::message_payload()))
        .await?;

    let live = subscription.next().await.unwrap();
    assert_eq!(live.id, third.id);

    Ok(())
}

/// Test: Dropping a subscription stops delivery without disturbing the store
#[tokio::test]
async fn test_dropped_subscription_is_pruned() -> Result<()> {
    let store = MemoryEventStore::new();

    let subscription = store.subscribe(EventFilter::any()).await?;
    drop(subscription);

    // Insert after the drop; the dead subscriber must not block anything.
    store
        .insert(NewEvent::new(EventKind::NewMessage, common::message_payload()))
        .await?;

    sleep(Duration::from_millis(10)).await;

    assert_eq!(store.pending_count().await, 1);

    Ok(())
}
