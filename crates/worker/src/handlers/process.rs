//! Launching the companion process used by `fork` and `runner`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use defer_core::{config::ProcessSettings, DeferError, DeferResult};
use defer_infrastructure::{TimeoutConfig, TimeoutHandler};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Program and leading arguments of the companion process.
#[derive(Debug, Clone)]
pub struct CompanionCommand {
    program: PathBuf,
    args: Vec<String>,
    timeouts: TimeoutHandler,
}

impl CompanionCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, spawn_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeouts: TimeoutHandler::new(TimeoutConfig {
                spawn_timeout,
                ..TimeoutConfig::default()
            }),
        }
    }

    /// Builds the command from settings. Without an explicit program the
    /// currently running executable is used.
    pub fn from_settings(settings: &ProcessSettings, args: Vec<String>) -> DeferResult<Self> {
        let program = match &settings.program {
            Some(program) => PathBuf::from(program),
            None => std::env::current_exe()?,
        };
        Ok(Self::new(
            program,
            args,
            Duration::from_secs(settings.spawn_timeout_seconds),
        ))
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn command(&self, extra_args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(extra_args)
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        cmd
    }

    /// Starts the process with `extra_args` appended and returns without
    /// waiting for it.
    pub async fn spawn_detached(&self, extra_args: &[&str]) -> DeferResult<u32> {
        let mut cmd = self.command(extra_args);
        cmd.stdin(Stdio::null());

        self.timeouts
            .spawn_operation(
                async {
                    let child = cmd.spawn().map_err(|e| {
                        DeferError::Spawn(format!("{}: {e}", self.program.display()))
                    })?;
                    let pid = child.id().unwrap_or_default();
                    debug!(program = %self.program.display(), pid, "spawned companion process");
                    Ok(pid)
                },
                "spawn companion process",
            )
            .await
    }

    /// Starts the process, writes `input` to its stdin, closes stdin and
    /// returns without waiting for it to exit.
    pub async fn spawn_with_stdin(&self, input: &[u8]) -> DeferResult<u32> {
        let mut cmd = self.command(&[]);
        cmd.stdin(Stdio::piped());

        self.timeouts
            .spawn_operation(
                async {
                    let mut child = cmd.spawn().map_err(|e| {
                        DeferError::Spawn(format!("{}: {e}", self.program.display()))
                    })?;
                    let pid = child.id().unwrap_or_default();

                    let mut stdin = child
                        .stdin
                        .take()
                        .ok_or_else(|| DeferError::Spawn("child stdin unavailable".to_string()))?;
                    stdin.write_all(input).await?;
                    stdin.shutdown().await?;
                    drop(stdin);

                    debug!(
                        program = %self.program.display(),
                        pid,
                        bytes = input.len(),
                        "spawned companion process with payload on stdin"
                    );
                    Ok(pid)
                },
                "spawn companion process",
            )
            .await
    }
}
