//! Tasks available to the `defer` binary out of the box.

use std::process::Stdio;

use async_trait::async_trait;
use defer_core::{Capture, DeferError, DeferResult, Task, TaskRegistry};
use serde_json::Value;
use std::sync::Arc;
use tokio::process::Command;
use tracing::info;

/// Logs its arguments and locals.
#[derive(Debug, Default)]
pub struct LogTask;

#[async_trait]
impl Task for LogTask {
    async fn run(&self, capture: &Capture) -> DeferResult<()> {
        let message = capture
            .args()
            .iter()
            .map(|arg| match arg {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");

        info!(
            capture_id = %capture.id,
            locals = ?capture.locals,
            "{message}"
        );
        Ok(())
    }
}

/// Runs a command: the first argument is the program, the rest are its
/// arguments. The `working_dir` local sets the working directory. A non-zero
/// exit status fails the task.
#[derive(Debug, Default)]
pub struct ShellTask;

impl ShellTask {
    fn command_line(capture: &Capture) -> DeferResult<(String, Vec<String>)> {
        let mut parts = capture.args().iter().map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        let program = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DeferError::task_execution("shell task requires a command"))?;
        Ok((program, parts.collect()))
    }
}

#[async_trait]
impl Task for ShellTask {
    async fn run(&self, capture: &Capture) -> DeferResult<()> {
        let (program, args) = Self::command_line(capture)?;

        let mut cmd = Command::new(&program);
        cmd.args(&args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        if let Some(dir) = capture.local("working_dir").and_then(|v| v.as_str()) {
            cmd.current_dir(dir);
        }

        info!(capture_id = %capture.id, command = %program, args = ?args, "running shell task");

        let output = cmd
            .output()
            .await
            .map_err(|e| DeferError::task_execution(format!("failed to start {program}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            info!(capture_id = %capture.id, "{}", stdout.trim_end());
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DeferError::task_execution(format!(
                "{program} exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )))
        }
    }
}

/// Registers the built-in tasks.
pub fn register_builtin_tasks(registry: &mut TaskRegistry) {
    registry
        .register("log", Arc::new(LogTask))
        .register("shell", Arc::new(ShellTask));
}
