use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::{
    config::Config,
    models::{
        error::TransportError,
        retry::RetryConfig,
        transport::{Channel, SendRequest, TemplateFields},
    },
    utils::retry_with_backoff,
};

/// The opaque outbound send capability. One call per (channel, template,
/// fields) triple; implementations own their timeout and retry policy.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        channel: Channel,
        template_id: &str,
        fields: TemplateFields,
    ) -> Result<(), TransportError>;
}

/// Transport adapter over the hosted template-send REST API. Every call is
/// bounded by the configured timeout; a timeout counts as a transport
/// failure like any other.
pub struct HttpTransportClient {
    http_client: Client,
    base_url: String,
    service_id: String,
    public_key: String,
    retry_config: RetryConfig,
}

impl HttpTransportClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.transport_timeout_seconds))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %config.transport_base_url, "Transport client initialized");

        Ok(Self {
            http_client,
            base_url: config.transport_base_url.clone(),
            service_id: config.transport_service_id.clone(),
            public_key: config.transport_public_key.clone(),
            retry_config: config.retry_config(),
        })
    }

    fn endpoint(&self, channel: Channel) -> String {
        match channel {
            Channel::Email => format!("{}/api/v1.0/email/send", self.base_url),
            Channel::Sms => format!("{}/api/v1.0/sms/send", self.base_url),
        }
    }
}

#[async_trait]
impl Transport for HttpTransportClient {
    async fn send(
        &self,
        channel: Channel,
        template_id: &str,
        fields: TemplateFields,
    ) -> Result<(), TransportError> {
        let url = self.endpoint(channel);
        let request = SendRequest {
            service_id: self.service_id.clone(),
            template_id: template_id.to_string(),
            user_id: self.public_key.clone(),
            template_params: fields,
        };

        debug!(%channel, template_id, "Sending outbound notification");

        retry_with_backoff(&self.retry_config, || {
            let client = self.http_client.clone();
            let url = url.clone();
            let request = request.clone();

            async move {
                let response = client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;

                let status = response.status();

                if status.is_success() {
                    Ok(())
                } else {
                    let body = response.text().await.unwrap_or_default();
                    Err(format!("send API returned {}: {}", status, body))
                }
            }
        })
        .await
        .map_err(|message| TransportError::new(channel, message))?;

        info!(%channel, template_id, "Outbound notification accepted");

        Ok(())
    }
}
