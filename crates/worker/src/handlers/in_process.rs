use std::sync::Arc;

use async_trait::async_trait;
use defer_core::{Capture, DeferResult, Handler, HandlerOptions, TaskRegistry};

/// Runs the work item right away, in the caller's task. Most useful as the
/// last entry of a chain.
pub struct InProcessHandler {
    tasks: Arc<TaskRegistry>,
}

impl InProcessHandler {
    pub fn new(tasks: Arc<TaskRegistry>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl Handler for InProcessHandler {
    fn name(&self) -> &str {
        "in_process"
    }

    fn description(&self) -> &str {
        "Executes the task in the calling process"
    }

    async fn handle(&self, capture: &Capture, _options: &HandlerOptions) -> DeferResult<()> {
        self.tasks.execute(capture).await
    }
}
