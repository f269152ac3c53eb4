//! Built-in error reporters.
//!
//! A reporter is told about every failed handler attempt. Reporting is best
//! effort: a reporter never fails the dispatch it reports for.

pub mod notification;

use std::sync::Mutex;

use async_trait::async_trait;
use defer_core::{DeferError, Reporter};
use tracing::error;

pub use notification::NotificationReporter;

/// Prints the error message on stdout.
#[derive(Debug, Default)]
pub struct StdoutReporter;

#[async_trait]
impl Reporter for StdoutReporter {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn report(&self, error: &DeferError) {
        println!("{error}");
    }
}

/// Prints the error message on stderr.
#[derive(Debug, Default)]
pub struct StderrReporter;

#[async_trait]
impl Reporter for StderrReporter {
    fn name(&self) -> &str {
        "stderr"
    }

    async fn report(&self, error: &DeferError) {
        eprintln!("{error}");
    }
}

#[derive(Debug, Default)]
pub struct SilentReporter;

#[async_trait]
impl Reporter for SilentReporter {
    fn name(&self) -> &str {
        "silent"
    }

    async fn report(&self, _error: &DeferError) {}
}

/// Emits the error as a structured `error!` event.
#[derive(Debug, Default)]
pub struct LogReporter;

#[async_trait]
impl Reporter for LogReporter {
    fn name(&self) -> &str {
        "log"
    }

    async fn report(&self, err: &DeferError) {
        error!(kind = err.kind(), error = %err, "deferred work failed");
    }
}

/// Keeps reported errors, as display strings, for assertions.
#[derive(Debug, Default)]
pub struct TestReporter {
    errors: Mutex<Vec<String>>,
}

impl TestReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.lock().ok().and_then(|e| e.last().cloned())
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.errors.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.clear();
        }
    }
}

#[async_trait]
impl Reporter for TestReporter {
    fn name(&self) -> &str {
        "test"
    }

    async fn report(&self, error: &DeferError) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error.to_string());
        }
    }
}
