//! Timeout handling for the async operations handlers depend on: queue
//! publishes, process spawns and outbound HTTP calls.

use defer_core::{DeferError, DeferResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, instrument};

/// Default timeout values for different operation types
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub message_queue_timeout: Duration,
    pub spawn_timeout: Duration,
    pub external_api_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            message_queue_timeout: Duration::from_secs(10),
            spawn_timeout: Duration::from_secs(10),
            external_api_timeout: Duration::from_secs(15),
        }
    }
}

/// Timeout handler utility for async operations
#[derive(Debug, Clone, Default)]
pub struct TimeoutHandler {
    config: TimeoutConfig,
}

impl TimeoutHandler {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(TimeoutConfig::default())
    }

    pub fn config(&self) -> &TimeoutConfig {
        &self.config
    }

    #[instrument(skip(self, operation))]
    pub async fn message_queue_operation<F, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> DeferResult<T>
    where
        F: Future<Output = DeferResult<T>>,
    {
        execute_with_timeout(operation, self.config.message_queue_timeout, operation_name).await
    }

    #[instrument(skip(self, operation))]
    pub async fn spawn_operation<F, T>(&self, operation: F, operation_name: &str) -> DeferResult<T>
    where
        F: Future<Output = DeferResult<T>>,
    {
        execute_with_timeout(operation, self.config.spawn_timeout, operation_name).await
    }

    #[instrument(skip(self, operation))]
    pub async fn external_api_operation<F, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> DeferResult<T>
    where
        F: Future<Output = DeferResult<T>>,
    {
        execute_with_timeout(operation, self.config.external_api_timeout, operation_name).await
    }
}

async fn execute_with_timeout<F, T>(
    operation: F,
    timeout_duration: Duration,
    operation_name: &str,
) -> DeferResult<T>
where
    F: Future<Output = DeferResult<T>>,
{
    match timeout(timeout_duration, operation).await {
        Ok(result) => result,
        Err(_) => {
            error!(
                operation = operation_name,
                timeout = ?timeout_duration,
                "operation timed out"
            );
            Err(DeferError::Timeout {
                operation: operation_name.to_string(),
                seconds: timeout_duration.as_secs(),
            })
        }
    }
}
