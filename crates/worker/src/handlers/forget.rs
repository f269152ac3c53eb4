use async_trait::async_trait;
use defer_core::{Capture, DeferResult, Handler, HandlerOptions};
use tracing::debug;

/// Accepts everything and runs nothing.
#[derive(Debug, Default)]
pub struct ForgetHandler;

impl ForgetHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for ForgetHandler {
    fn name(&self) -> &str {
        "forget"
    }

    fn description(&self) -> &str {
        "Discards the work"
    }

    async fn handle(&self, capture: &Capture, _options: &HandlerOptions) -> DeferResult<()> {
        debug!(task = capture.task_name(), capture_id = %capture.id, "forgetting capture");
        Ok(())
    }
}
