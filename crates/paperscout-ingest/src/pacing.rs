//! Request pacing and bounded retries.
//!
//! Sources throttle aggressive clients, so every outbound request is preceded
//! by a pause drawn uniformly from a configured interval. Not a token bucket:
//! each adapter owns its own `Pacer` and there is no cross-adapter ordering.
//! Sleeping goes through the `Sleeper` trait so tests can run without real
//! delays.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::models::FetchConfig;

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Default sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Randomized-delay pacer with a retry ceiling.
#[derive(Clone)]
pub struct Pacer {
    delay_min: f64,
    delay_max: f64,
    max_retries: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl Pacer {
    pub fn new(config: &FetchConfig) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: &FetchConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            delay_min: config.delay_min,
            delay_max: config.delay_max.max(config.delay_min),
            max_retries: config.max_retries,
            sleeper,
        }
    }

    /// Pause for a duration drawn uniformly from [delay_min, delay_max].
    pub async fn wait(&self) {
        let secs = if self.delay_max > self.delay_min {
            rand::thread_rng().gen_range(self.delay_min..=self.delay_max)
        } else {
            self.delay_min
        };
        if secs > 0.0 {
            self.sleeper.sleep(Duration::from_secs_f64(secs)).await;
        }
    }

    /// Run `op`, pacing before every attempt and retrying transient failures
    /// up to the configured ceiling. The last error is returned once the
    /// ceiling is reached.
    pub async fn retry<T, F, Fut>(&self, what: &str, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.wait().await;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(error = %err, attempt, max_retries = self.max_retries, what, "request failed, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}
