use std::{collections::HashMap, sync::Arc};

use anyhow::{Error, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    clients::store::EventStore,
    models::{
        event::{Event, EventKind, NewEvent, Payload, StatusPatch},
        status::EventStatus,
        validation::{validate_email, validate_phone},
    },
    utils::payload_str,
};

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub house: String,
    pub guests: u32,
    pub checkin: String,
    pub checkout: String,

    #[serde(default)]
    pub requests: String,

    #[serde(default)]
    pub access: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub name: String,
    pub email: String,

    #[serde(default)]
    pub phone: String,

    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub name: String,
    pub email: String,
    pub rating: u8,
    pub review: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRequest {
    pub message: String,

    #[serde(default)]
    pub admin_name: String,

    #[serde(default)]
    pub subject: String,
}

/// Lightweight client profile kept alongside bookings, one per normalized
/// email address.
#[derive(Debug, Clone, Serialize)]
pub struct ClientProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub total_bookings: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Default)]
pub struct ClientDirectory {
    profiles: RwLock<HashMap<String, ClientProfile>>,
}

impl ClientDirectory {
    fn client_id(email: &str) -> String {
        email
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    async fn record_booking(&self, request: &BookingRequest) {
        let id = Self::client_id(&request.email);
        let now = Utc::now();

        let mut profiles = self.profiles.write().await;
        profiles
            .entry(id)
            .and_modify(|profile| {
                profile.name = request.name.clone();
                profile.phone = request.phone.clone();
                profile.total_bookings += 1;
                profile.last_seen = now;
            })
            .or_insert_with(|| ClientProfile {
                name: request.name.clone(),
                email: request.email.clone(),
                phone: request.phone.clone(),
                total_bookings: 1,
                first_seen: now,
                last_seen: now,
            });
    }

    pub async fn get(&self, email: &str) -> Option<ClientProfile> {
        let profiles = self.profiles.read().await;
        profiles.get(&Self::client_id(email)).cloned()
    }
}

/// Turns validated user submissions into pending events. Everything inserted
/// here is picked up by the notification processor's subscription; intake
/// itself never talks to the transport.
pub struct Intake {
    store: Arc<dyn EventStore>,
    clients: ClientDirectory,
}

impl Intake {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            clients: ClientDirectory::default(),
        }
    }

    pub fn clients(&self) -> &ClientDirectory {
        &self.clients
    }

    pub async fn submit_booking(&self, request: BookingRequest) -> Result<Event, Error> {
        validate_email(&request.email)?;
        validate_phone(&request.phone)?;

        if request.guests == 0 {
            return Err(anyhow!("Guest count must be at least 1"));
        }

        self.clients.record_booking(&request).await;

        let mut payload = Payload::new();
        payload.insert("name".to_string(), json!(request.name));
        payload.insert("email".to_string(), json!(request.email));
        payload.insert("phone".to_string(), json!(request.phone));
        payload.insert("house".to_string(), json!(request.house));
        payload.insert("guests".to_string(), json!(request.guests));
        payload.insert("checkin".to_string(), json!(request.checkin));
        payload.insert("checkout".to_string(), json!(request.checkout));
        payload.insert("requests".to_string(), json!(request.requests));
        payload.insert("access".to_string(), json!(request.access));

        let event = self
            .store
            .insert(NewEvent::new(EventKind::NewBooking, payload))
            .await?;

        info!(id = %event.id, house = %request.house, "Booking received");

        Ok(event)
    }

    pub async fn submit_message(&self, request: MessageRequest) -> Result<Event, Error> {
        validate_email(&request.email)?;

        // Phone is optional on the contact form; only validate when present.
        if !request.phone.is_empty() {
            validate_phone(&request.phone)?;
        }

        if request.message.trim().is_empty() {
            return Err(anyhow!("Message text cannot be empty"));
        }

        let mut payload = Payload::new();
        payload.insert("name".to_string(), json!(request.name));
        payload.insert("email".to_string(), json!(request.email));
        if !request.phone.is_empty() {
            payload.insert("phone".to_string(), json!(request.phone));
        }
        payload.insert("message".to_string(), json!(request.message));

        let event = self
            .store
            .insert(NewEvent::new(EventKind::NewMessage, payload))
            .await?;

        info!(id = %event.id, "Contact message received");

        Ok(event)
    }

    pub async fn submit_review(&self, request: ReviewRequest) -> Result<Event, Error> {
        validate_email(&request.email)?;

        if !(1..=5).contains(&request.rating) {
            return Err(anyhow!("Rating must be between 1 and 5"));
        }

        let mut payload = Payload::new();
        payload.insert("name".to_string(), json!(request.name));
        payload.insert("email".to_string(), json!(request.email));
        payload.insert("rating".to_string(), json!(request.rating));
        payload.insert("review".to_string(), json!(request.review));

        let event = self
            .store
            .insert(NewEvent::new(EventKind::NewReview, payload))
            .await?;

        info!(id = %event.id, rating = request.rating, "Review received");

        Ok(event)
    }

    /// Enqueue an outbound admin reply tied to an existing event. The reply
    /// is itself an event, so it shares the dispatch protocol's retry and
    /// audit semantics instead of being a special-cased send.
    pub async fn submit_reply(
        &self,
        source_event_id: &str,
        request: ReplyRequest,
    ) -> Result<Event, Error> {
        if request.message.trim().is_empty() {
            return Err(anyhow!("Reply text cannot be empty"));
        }

        let source = self
            .store
            .get(source_event_id)
            .await?
            .ok_or_else(|| anyhow!("No event with id {}", source_event_id))?;

        let client_email = payload_str(&source.payload, "email");
        if client_email.is_empty() {
            return Err(anyhow!("Source event carries no client email"));
        }

        let mut payload = Payload::new();
        payload.insert("client_email".to_string(), json!(client_email));
        payload.insert("reply_message".to_string(), json!(request.message));
        payload.insert("source_event_id".to_string(), json!(source.id));

        // Booking context rides along when the source event has it.
        if !payload_str(&source.payload, "house").is_empty() {
            payload.insert(
                "booking_details".to_string(),
                json!(format!(
                    "Property: {}\nCheck-in: {}\nCheck-out: {}\nGuests: {}",
                    payload_str(&source.payload, "house"),
                    payload_str(&source.payload, "checkin"),
                    payload_str(&source.payload, "checkout"),
                    payload_str(&source.payload, "guests"),
                )),
            );
        }

        if !request.admin_name.is_empty() {
            payload.insert("admin_name".to_string(), json!(request.admin_name));
        }
        if !request.subject.is_empty() {
            payload.insert("subject".to_string(), json!(request.subject));
        }

        let event = self
            .store
            .insert(NewEvent::new(EventKind::AdminReply, payload))
            .await?;

        info!(
            id = %event.id,
            source = %source_event_id,
            "Admin reply enqueued"
        );

        Ok(event)
    }

    /// Manual admin retry: a failed event goes back to pending and re-enters
    /// the dispatch stream. Returns `false` when the event is not failed.
    pub async fn retry_event(&self, event_id: &str) -> Result<bool, Error> {
        let requeued = self
            .store
            .update_if_status(event_id, EventStatus::Failed, StatusPatch::pending())
            .await?;

        if requeued {
            info!(id = %event_id, "Failed event re-queued for dispatch");
        }

        Ok(requeued)
    }
}
