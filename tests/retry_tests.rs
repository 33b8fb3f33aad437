use anyhow::{Result, anyhow};
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use tokio::time::Instant;

use notify_service::{models::retry::RetryConfig, utils::retry_with_backoff};

fn retry_config(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 50,
        max_delay_ms: 400,
        backoff_multiplier: 2,
    }
}

/// Test: Successful operations complete without retry
#[tokio::test]
async fn test_successful_operation_no_retry() -> Result<()> {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = retry_with_backoff(&retry_config(3), || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>("delivered")
        }
    })
    .await?;

    assert_eq!(result, "delivered");
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        1,
        "Should only attempt once"
    );

    Ok(())
}

/// Test: Transient failures are retried until the operation recovers
#[tokio::test]
async fn test_transient_failures_are_retried() -> Result<()> {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = retry_with_backoff(&retry_config(5), || {
        let counter = Arc::clone(&counter);
        async move {
            let attempts = counter.fetch_add(1, Ordering::SeqCst);

            // Fail the first two attempts, recover on the third.
            if attempts < 2 {
                Err(anyhow!("Transient error"))
            } else {
                Ok("delivered")
            }
        }
    })
    .await?;

    assert_eq!(result, "delivered");
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);

    Ok(())
}

/// Test: Permanent failures exhaust all attempts and surface the error
#[tokio::test]
async fn test_permanent_failure_exhausts_retries() -> Result<()> {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let result = retry_with_backoff(&retry_config(4), || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(anyhow!("Permanent failure"))
        }
    })
    .await;

    assert!(result.is_err(), "Should fail after max attempts");
    assert_eq!(
        attempt_count.load(Ordering::SeqCst),
        4,
        "Should attempt exactly max_attempts times"
    );

    Ok(())
}

/// Test: Backoff delays never exceed the configured cap
#[tokio::test]
async fn test_max_delay_cap_respected() -> Result<()> {
    let config = RetryConfig {
        max_attempts: 6,
        initial_delay_ms: 100,
        max_delay_ms: 300,
        backoff_multiplier: 2,
    };

    let start = Instant::now();
    let attempt_times = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let times = Arc::clone(&attempt_times);

    let _ = retry_with_backoff(&config, || {
        let times = Arc::clone(&times);
        async move {
            let elapsed = start.elapsed().as_millis();
            times.lock().await.push(elapsed);
            Err::<String, _>(anyhow!("Fail"))
        }
    })
    .await;

    let times = attempt_times.lock().await;

    for i in 3..times.len() {
        let delay = times[i] - times[i - 1];
        assert!(
            delay <= (config.max_delay_ms * 12 / 10) as u128,
            "Delay should not exceed max_delay_ms cap"
        );
    }

    Ok(())
}
