use std::sync::Arc;
use std::time::Duration;

use defer_core::{Capture, DeferResult, MessageQueue, Reporter, TaskRegistry};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// What happened to one message taken off the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Executed(Capture),
    Failed(Capture),
    Undecodable,
}

/// Consumes captures published by the `message_queue` handler and runs
/// them in this process. Failures go to the reporter; the message is not
/// requeued.
pub struct QueueWorker {
    queue: Arc<dyn MessageQueue>,
    queue_name: String,
    tasks: Arc<TaskRegistry>,
    reporter: Arc<dyn Reporter>,
    poll_interval: Duration,
}

impl QueueWorker {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        queue_name: impl Into<String>,
        tasks: Arc<TaskRegistry>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
            tasks,
            reporter,
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Takes at most one message. `None` when the queue is empty.
    pub async fn poll_once(&self) -> DeferResult<Option<Delivery>> {
        let Some(payload) = self.queue.consume(&self.queue_name).await? else {
            return Ok(None);
        };

        let capture = match Capture::from_json(&payload) {
            Ok(capture) => capture,
            Err(e) => {
                warn!(queue = %self.queue_name, error = %e, "skipping undecodable message");
                self.reporter.report(&e).await;
                return Ok(Some(Delivery::Undecodable));
            }
        };

        debug!(queue = %self.queue_name, capture_id = %capture.id, task = capture.task_name(), "consumed capture");
        match self.tasks.execute(&capture).await {
            Ok(()) => Ok(Some(Delivery::Executed(capture))),
            Err(e) => {
                warn!(capture_id = %capture.id, error = %e, "queued capture failed");
                self.reporter.report(&e).await;
                Ok(Some(Delivery::Failed(capture)))
            }
        }
    }

    /// Processes messages until the queue is empty and returns how many were
    /// taken off it.
    pub async fn drain(&self) -> DeferResult<usize> {
        let mut processed = 0;
        while self.poll_once().await?.is_some() {
            processed += 1;
        }
        Ok(processed)
    }

    /// Polls until `shutdown` fires. Queue errors are reported and retried
    /// on the next tick.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> DeferResult<()> {
        info!(queue = %self.queue_name, interval = ?self.poll_interval, "queue worker started");
        let mut poll_interval = interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    match self.drain().await {
                        Ok(0) => {}
                        Ok(processed) => debug!(processed, "queue drained"),
                        Err(e) => {
                            warn!(queue = %self.queue_name, error = %e, "failed to poll queue");
                            self.reporter.report(&e).await;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("queue worker shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}

