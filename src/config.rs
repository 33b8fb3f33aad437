use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::retry::RetryConfig;

/// Process-wide configuration, injected explicitly wherever it is needed.
/// Service/template identifiers, the admin contact points, and payment
/// instructions are deployment constants, never module state.
#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub transport_base_url: String,
    pub transport_service_id: String,
    pub transport_public_key: String,

    #[serde(default = "default_transport_timeout_seconds")]
    pub transport_timeout_seconds: u64,

    pub admin_template_id: String,
    pub client_template_id: String,

    #[serde(default)]
    pub sms_template_id: String,

    #[serde(default)]
    pub sms_enabled: bool,

    pub admin_email: String,
    pub admin_phone: String,
    pub site_name: String,
    pub payment_instructions: String,
    pub admin_link: String,

    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: u64,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|_| anyhow!("Invalid or missing environmental variable"))?;
        Ok(config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            initial_delay_ms: self.initial_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
            backoff_multiplier: self.retry_backoff_multiplier,
        }
    }
}

fn default_transport_timeout_seconds() -> u64 {
    10
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_initial_retry_delay_ms() -> u64 {
    200
}

fn default_max_retry_delay_ms() -> u64 {
    5000
}

fn default_retry_backoff_multiplier() -> u64 {
    2
}

fn default_server_port() -> u16 {
    8080
}
