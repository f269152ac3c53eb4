use async_trait::async_trait;
use defer_core::{Capture, DeferResult, Handler, HandlerOptions};
use tracing::info;

use super::process::CompanionCommand;

/// Hands the work to an out-of-process runner entry point. The capture is
/// base64 encoded and passed as the last command line argument.
pub struct RunnerHandler {
    command: CompanionCommand,
}

impl RunnerHandler {
    pub fn new(command: CompanionCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Handler for RunnerHandler {
    fn name(&self) -> &str {
        "runner"
    }

    fn description(&self) -> &str {
        "Executes the task through the runner entry point"
    }

    async fn handle(&self, capture: &Capture, _options: &HandlerOptions) -> DeferResult<()> {
        let payload = capture.encode()?;
        let pid = self.command.spawn_detached(&[payload.as_str()]).await?;
        info!(pid, task = capture.task_name(), capture_id = %capture.id, "capture sent to runner");
        Ok(())
    }
}
