use async_trait::async_trait;
use defer_core::{Capture, DeferResult, Handler, HandlerOptions};
use tracing::info;

use super::process::CompanionCommand;

/// Runs the work in a separate child process. The capture is streamed to the
/// child's stdin as JSON; the child is not waited for, so only failures to
/// start it are visible here.
pub struct ForkHandler {
    command: CompanionCommand,
}

impl ForkHandler {
    pub fn new(command: CompanionCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Handler for ForkHandler {
    fn name(&self) -> &str {
        "fork"
    }

    fn description(&self) -> &str {
        "Executes the task in a detached child process"
    }

    async fn handle(&self, capture: &Capture, _options: &HandlerOptions) -> DeferResult<()> {
        let payload = capture.to_json()?;
        let pid = self.command.spawn_with_stdin(&payload).await?;
        info!(pid, task = capture.task_name(), capture_id = %capture.id, "forked capture");
        Ok(())
    }
}
