use serde_json::Value as JsonValue;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use crate::models::{event::Payload, retry::RetryConfig};

/// Project a payload field to a string. Missing fields and non-scalar values
/// become an empty string; field mappers never fail on incomplete payloads.
pub fn payload_str(payload: &Payload, field: &str) -> String {
    match payload.get(field) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub fn payload_str_or(payload: &Payload, field: &str, default: &str) -> String {
    let value = payload_str(payload, field);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        attempt,
                        max_attempts = config.max_attempts,
                        "Retry succeeded"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    warn!(
                        max_attempts = config.max_attempts,
                        error = %e,
                        "Retry failed after exhausting all attempts"
                    );
                    return Err(e);
                }

                debug!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms,
                    "Retry attempt failed, backing off"
                );

                let jitter = rand::random_range(-0.1..=0.1);

                let jittered_delay = (delay_ms as f64 * (1.0 + jitter)) as u64;

                sleep(Duration::from_millis(jittered_delay)).await;

                delay_ms = std::cmp::min(delay_ms * config.backoff_multiplier, config.max_delay_ms);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_fields_project_to_empty_string() {
        let mut payload = Payload::new();
        payload.insert("name".to_string(), json!("Jane"));
        payload.insert("guests".to_string(), json!(2));

        assert_eq!(payload_str(&payload, "name"), "Jane");
        assert_eq!(payload_str(&payload, "guests"), "2");
        assert_eq!(payload_str(&payload, "phone"), "");
    }

    #[test]
    fn non_scalar_values_project_to_empty_string() {
        let mut payload = Payload::new();
        payload.insert("replies".to_string(), json!(["a", "b"]));
        payload.insert("missing".to_string(), json!(null));

        assert_eq!(payload_str(&payload, "replies"), "");
        assert_eq!(payload_str(&payload, "missing"), "");
    }

    #[test]
    fn default_applies_only_when_empty() {
        let mut payload = Payload::new();
        payload.insert("admin_name".to_string(), json!("Salim"));

        assert_eq!(payload_str_or(&payload, "admin_name", "Admin"), "Salim");
        assert_eq!(payload_str_or(&payload, "other", "Admin"), "Admin");
    }
}
