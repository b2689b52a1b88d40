use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use crate::config::settings::RetryConfig;

/// Errors that can tell a token rejection apart from other failures.
pub trait Reauthenticate {
    fn is_unauthorized(&self) -> bool;
}

/// Per-request budget for retrying after the server rejected our token.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// retries on top of the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetrySettings {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries(),
            base_delay_ms: config.base_delay_ms.unwrap_or(100),
            max_delay_ms: config.max_delay_ms.unwrap_or(1000),
        }
    }

    fn next_delay(&self, delay: u64) -> u64 {
        delay.saturating_mul(2).min(self.max_delay_ms)
    }

    /// Run `operation` (called with the 1-based attempt number). When it fails
    /// with an unauthorized error and budget remains, run `reauth` and try
    /// again. Any other outcome is returned as is.
    pub async fn run_with_reauth<F, Fut, R, RFut, T, E>(&self, mut operation: F, mut reauth: R) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        R: FnMut() -> RFut,
        RFut: std::future::Future<Output = ()>,
        E: Reauthenticate + std::fmt::Display,
    {
        let attempts = self.max_retries + 1;
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_unauthorized() && attempt < attempts => {
                    warn!("Attempt {attempt}/{attempts} rejected: {e}; refreshing token");
                    reauth().await;
                    if delay > 0 {
                        sleep(Duration::from_millis(delay)).await;
                    }
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_unauthorized() {
                        error!("all {attempt} attempts were rejected: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}
