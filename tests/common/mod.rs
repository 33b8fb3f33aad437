use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::time::{Duration, Instant, sleep};

use notify_service::{
    clients::{
        audit::{AuditLogWriter, MemoryAuditLog},
        store::{EventStore, MemoryEventStore},
        transport::Transport,
    },
    config::Config,
    models::{
        error::TransportError,
        event::Payload,
        status::EventStatus,
        transport::{Channel, TemplateFields},
    },
    processor::NotificationProcessor,
};

pub fn test_config() -> Config {
    Config {
        transport_base_url: "http://transport.invalid".to_string(),
        transport_service_id: "seaview_homes".to_string(),
        transport_public_key: "pk_test_0001".to_string(),
        transport_timeout_seconds: 2,
        admin_template_id: "tmpl_admin_alert".to_string(),
        client_template_id: "tmpl_client_reply".to_string(),
        sms_template_id: "tmpl_admin_sms".to_string(),
        sms_enabled: false,
        admin_email: "admin@seaviewhomes.test".to_string(),
        admin_phone: "+15550100200".to_string(),
        site_name: "Seaview Homes".to_string(),
        payment_instructions: "M-Pesa 0700 000 000".to_string(),
        admin_link: "https://seaviewhomes.test/admin".to_string(),
        max_retry_attempts: 2,
        initial_retry_delay_ms: 10,
        max_retry_delay_ms: 40,
        retry_backoff_multiplier: 2,
        server_port: 0,
    }
}

#[derive(Debug, Clone)]
pub struct SendRecord {
    pub channel: Channel,
    pub template_id: String,
    pub fields: TemplateFields,
}

/// Transport double that records every invocation and can be told to fail
/// individual channels.
#[derive(Default)]
pub struct RecordingTransport {
    sends: Mutex<Vec<SendRecord>>,
    failures: Mutex<HashMap<Channel, String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_channel(&self, channel: Channel, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(channel, message.to_string());
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn sends(&self) -> Vec<SendRecord> {
        self.sends.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        channel: Channel,
        template_id: &str,
        fields: TemplateFields,
    ) -> Result<(), TransportError> {
        self.sends.lock().unwrap().push(SendRecord {
            channel,
            template_id: template_id.to_string(),
            fields,
        });

        if let Some(message) = self.failures.lock().unwrap().get(&channel) {
            return Err(TransportError::new(channel, message.clone()));
        }

        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryEventStore>,
    pub transport: Arc<RecordingTransport>,
    pub audit: Arc<MemoryAuditLog>,
    pub processor: NotificationProcessor,
    pub config: Config,
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

pub fn harness_with(config: Config) -> Harness {
    let store = Arc::new(MemoryEventStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let audit = Arc::new(MemoryAuditLog::new());

    let processor = NotificationProcessor::new(
        store.clone(),
        transport.clone(),
        AuditLogWriter::new(audit.clone()),
        config.clone(),
    );

    Harness {
        store,
        transport,
        audit,
        processor,
        config,
    }
}

/// Booking payload for the Jane / Villa A scenario. Carries no phone field;
/// missing fields must project to empty strings downstream.
pub fn booking_payload() -> Payload {
    let mut payload = Payload::new();
    payload.insert("name".to_string(), json!("Jane"));
    payload.insert("email".to_string(), json!("jane@x.com"));
    payload.insert("house".to_string(), json!("Villa A"));
    payload.insert("checkin".to_string(), json!("2024-06-01"));
    payload.insert("checkout".to_string(), json!("2024-06-03"));
    payload.insert("guests".to_string(), json!(2));
    payload
}

pub fn message_payload() -> Payload {
    let mut payload = Payload::new();
    payload.insert("name".to_string(), json!("Omar"));
    payload.insert("email".to_string(), json!("omar@mail.test"));
    payload.insert(
        "message".to_string(),
        json!("Is the villa available over Easter?"),
    );
    payload
}

pub async fn wait_for_status(store: &MemoryEventStore, id: &str, status: EventStatus) {
    let deadline = Instant::now() + Duration::from_secs(2);

    loop {
        let event = store
            .get(id)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("Event {} missing from store", id));

        if event.status == status {
            return;
        }

        assert!(
            Instant::now() < deadline,
            "Event {} never reached status {} (currently {})",
            id,
            status,
            event.status
        );

        sleep(Duration::from_millis(10)).await;
    }
}
