use std::sync::Arc;

use anyhow::{Error, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

use notify_service::{
    api::{AppState, run_api_server},
    clients::{
        audit::{AuditLogWriter, MemoryAuditLog},
        health::HealthChecker,
        store::{EventFilter, EventStore, MemoryEventStore},
        transport::HttpTransportClient,
    },
    config::Config,
    intake::Intake,
    models::event::EventKind,
    processor::NotificationProcessor,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::load()?;

    let memory_store = Arc::new(MemoryEventStore::new());
    let store: Arc<dyn EventStore> = memory_store.clone();
    let transport = Arc::new(HttpTransportClient::new(&config)?);
    let audit_log = Arc::new(MemoryAuditLog::new());

    let processor = Arc::new(NotificationProcessor::new(
        store.clone(),
        transport,
        AuditLogWriter::new(audit_log),
        config.clone(),
    ));

    // One logical subscriber per event kind, mirroring the store's
    // collection-per-listener shape.
    for kind in [
        EventKind::NewBooking,
        EventKind::NewMessage,
        EventKind::NewReview,
        EventKind::AdminReply,
    ] {
        let processor = Arc::clone(&processor);
        tokio::spawn(async move {
            if let Err(e) = processor.watch(EventFilter::for_kind(kind.as_str())).await {
                error!(kind = kind.as_str(), error = %e, "Event watcher stopped");
            }
        });
    }

    let state = Arc::new(AppState {
        intake: Intake::new(store.clone()),
        store,
        health_checker: HealthChecker::new(config.clone(), memory_store),
    });

    run_api_server(&config, state).await
}
