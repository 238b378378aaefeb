use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use crate::auth::{RefreshFn, RetryDecorator};
use crate::config::settings::RetryConfig;
use crate::error::Result;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 1000;

/// Exponential backoff, applied only to retryable errors.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl From<&RetryConfig> for RetrySettings {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            base_delay_ms: config.base_delay_ms.unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
            max_delay_ms: config.max_delay_ms.unwrap_or(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetrySettings {
    pub async fn run_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    warn!("Attempt {attempt}/{attempts} failed: {e}");
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(self.max_delay_ms);
                    attempt += 1;
                }
                Err(e) => {
                    error!("giving up after {attempt} attempts: {e}");
                    return Err(e);
                }
            }
        }
    }

    /// Retry only when the settings file has a `retry` section.
    pub fn from_config(config: Option<&RetryConfig>) -> Option<Self> {
        config.map(Self::from)
    }

    /// Wrap a refresh operation so every call goes through [`Self::run_with_retry`].
    pub fn decorator(self) -> RetryDecorator {
        Arc::new(move |operation: RefreshFn| {
            let settings = self.clone();
            let wrapped: RefreshFn = Arc::new(move |timeout: Duration| {
                let settings = settings.clone();
                let operation = operation.clone();
                async move { settings.run_with_retry(|| operation(timeout)).await }.boxed()
            });
            wrapped
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Error;

    fn fast() -> RetrySettings {
        RetrySettings { attempts: 3, base_delay_ms: 1, max_delay_ms: 5 }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicUsize::new(0);
        let result = fast()
            .run_with_retry(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Error::Status { status: 503, body: String::new() })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_configuration_errors() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = fast()
            .run_with_retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::Config("broken".into())) }
            })
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_after_configured_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = fast()
            .run_with_retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::Status { status: 500, body: String::new() }) }
            })
            .await;
        assert!(matches!(result, Err(Error::Status { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn no_retry_section_means_no_retry() {
        assert!(RetrySettings::from_config(None).is_none());

        let config = RetryConfig { attempts: Some(5), base_delay_ms: None, max_delay_ms: Some(2000) };
        let settings = RetrySettings::from_config(Some(&config)).unwrap();
        assert_eq!(settings.attempts, 5);
        assert_eq!(settings.base_delay_ms, DEFAULT_RETRY_BASE_DELAY_MS);
        assert_eq!(settings.max_delay_ms, 2000);
    }
}
