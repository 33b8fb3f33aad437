//! Booking/contact/review intake and notification dispatch for a small
//! property-rental site. Pending events are consumed from the event store
//! and turned into outbound email/SMS deliveries with at-least-once
//! semantics; the transition out of `pending` is guarded by the store's
//! conditional update so concurrent processors never both commit.

pub mod api;
pub mod clients;
pub mod config;
pub mod intake;
pub mod models;
pub mod processor;
pub mod rules;
pub mod utils;
