use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use defer_core::{DeferError, DeferResult, Reporter};
use defer_infrastructure::{TimeoutConfig, TimeoutHandler};
use serde::Serialize;
use tracing::{debug, warn};

/// Body POSTed to the notification webhook.
#[derive(Debug, Clone, Serialize)]
pub struct FailureNotification {
    pub message: String,
    pub kind: String,
    pub hostname: String,
    pub timestamp: DateTime<Utc>,
}

/// Notifies developers about failures through a webhook.
///
/// Delivery problems are logged; they never reach the dispatch that
/// triggered the report.
pub struct NotificationReporter {
    url: String,
    hostname: String,
    http_client: reqwest::Client,
    timeouts: TimeoutHandler,
}

impl NotificationReporter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            url: url.into(),
            hostname,
            http_client: reqwest::Client::new(),
            timeouts: TimeoutHandler::new(TimeoutConfig {
                external_api_timeout: timeout,
                ..TimeoutConfig::default()
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn notification_for(&self, error: &DeferError) -> FailureNotification {
        FailureNotification {
            message: error.to_string(),
            kind: error.kind().to_string(),
            hostname: self.hostname.clone(),
            timestamp: Utc::now(),
        }
    }

    /// POSTs `notification` to the webhook within the configured timeout.
    pub async fn deliver(&self, notification: &FailureNotification) -> DeferResult<()> {
        self.timeouts
            .external_api_operation(
                async {
                    let response = self
                        .http_client
                        .post(&self.url)
                        .json(notification)
                        .send()
                        .await
                        .map_err(|e| DeferError::Notification(e.to_string()))?;

                    let status = response.status();
                    if status.is_success() {
                        Ok(())
                    } else {
                        Err(DeferError::Notification(format!("webhook responded with {status}")))
                    }
                },
                "deliver failure notification",
            )
            .await
    }
}

#[async_trait]
impl Reporter for NotificationReporter {
    fn name(&self) -> &str {
        "notification"
    }

    async fn report(&self, err: &DeferError) {
        let notification = self.notification_for(err);
        match self.deliver(&notification).await {
            Ok(()) => debug!(url = %self.url, "failure notification delivered"),
            Err(e) => warn!(url = %self.url, error = %e, "failure notification not delivered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_payload() {
        let reporter = NotificationReporter::new("http://127.0.0.1:9/hook", Duration::from_secs(1));
        let notification = reporter.notification_for(&DeferError::UnknownTask {
            name: "mail".to_string(),
        });

        assert_eq!(notification.message, "unknown task: mail");
        assert_eq!(notification.kind, "unknown_task");
        assert!(!notification.hostname.is_empty());

        let json = serde_json::to_value(&notification).unwrap();
        assert!(json.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_swallowed() {
        let reporter =
            NotificationReporter::new("http://127.0.0.1:9/hook", Duration::from_millis(200));
        let error = DeferError::task_execution("boom");

        let delivery = reporter.deliver(&reporter.notification_for(&error)).await;
        assert!(delivery.is_err());
        reporter.report(&error).await;
    }

    #[tokio::test]
    async fn test_silent_webhook_times_out() {
        // Connections are queued by the kernel but never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let reporter = NotificationReporter::new(url, Duration::from_millis(100));

        let notification = reporter.notification_for(&DeferError::task_execution("boom"));
        let result = reporter.deliver(&notification).await;

        assert!(matches!(result, Err(DeferError::Timeout { .. })));
        drop(listener);
    }
}
