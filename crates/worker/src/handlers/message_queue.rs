use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use defer_core::{Capture, DeferResult, Handler, HandlerOptions, MessageQueue};
use defer_infrastructure::{TimeoutConfig, TimeoutHandler};
use tracing::info;

/// Publishes the capture as JSON to a message queue for a consumer worker.
///
/// ### Options
/// * `queue` - target queue, defaults to the configured default queue
pub struct MessageQueueHandler {
    queue: Arc<dyn MessageQueue>,
    default_queue: String,
    timeouts: TimeoutHandler,
}

impl MessageQueueHandler {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        default_queue: impl Into<String>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            default_queue: default_queue.into(),
            timeouts: TimeoutHandler::new(TimeoutConfig {
                message_queue_timeout: publish_timeout,
                ..TimeoutConfig::default()
            }),
        }
    }
}

#[async_trait]
impl Handler for MessageQueueHandler {
    fn name(&self) -> &str {
        "message_queue"
    }

    fn description(&self) -> &str {
        "Publishes the task to a message queue"
    }

    async fn handle(&self, capture: &Capture, options: &HandlerOptions) -> DeferResult<()> {
        let queue_name = options
            .get("queue")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.default_queue);
        let payload = capture.to_json()?;

        self.timeouts
            .message_queue_operation(
                self.queue.publish(queue_name, &payload),
                "publish capture",
            )
            .await?;

        info!(queue = queue_name, task = capture.task_name(), capture_id = %capture.id, "capture published");
        Ok(())
    }
}
