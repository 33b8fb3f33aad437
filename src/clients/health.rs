use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{
    clients::store::MemoryEventStore,
    config::Config,
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

pub struct HealthChecker {
    config: Config,
    store: Arc<MemoryEventStore>,
}

impl HealthChecker {
    pub fn new(config: Config, store: Arc<MemoryEventStore>) -> Self {
        Self { config, store }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        let store_health = self.check_store().await;
        checks.insert("event_store".to_string(), store_health);

        let transport_health = self.check_transport().await;
        checks.insert("transport".to_string(), transport_health);

        let overall_status = Self::determine_overall_status(&checks);

        HealthCheckResponse {
            status: overall_status,
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            checks,
        }
    }

    async fn check_store(&self) -> ServiceHealth {
        let start = Instant::now();

        let pending = self.store.pending_count().await;
        let elapsed = start.elapsed().as_millis() as u64;

        debug!(
            response_time_ms = elapsed,
            pending_events = pending,
            "Event store health check passed"
        );

        ServiceHealth::healthy(elapsed).with_pending_events(pending)
    }

    async fn check_transport(&self) -> ServiceHealth {
        let start = Instant::now();

        let client = match Client::builder()
            .timeout(std::time::Duration::from_secs(
                self.config.transport_timeout_seconds,
            ))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Transport health probe client creation failed");
                return ServiceHealth::unhealthy(format!("Client creation failed: {}", e));
            }
        };

        match client.get(&self.config.transport_base_url).send().await {
            Ok(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(response_time_ms = elapsed, "Transport health check passed");
                ServiceHealth::healthy(elapsed)
            }
            Err(e) => {
                warn!(error = %e, "Transport unreachable");
                ServiceHealth::degraded(format!("Send API unreachable: {}", e))
            }
        }
    }

    // Pending events keep retrying against a degraded transport, so only the
    // store takes the service to unhealthy.
    fn determine_overall_status(checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
        let store_unhealthy = checks
            .get("event_store")
            .is_some_and(|health| health.status == HealthStatus::Unhealthy);

        let has_degraded = checks.values().any(|health| {
            health.status == HealthStatus::Degraded || health.status == HealthStatus::Unhealthy
        });

        if store_unhealthy {
            HealthStatus::Unhealthy
        } else if has_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
