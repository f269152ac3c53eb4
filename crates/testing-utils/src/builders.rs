//! Test data builders with sensible defaults.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use defer_core::{config::DeferSettings, Capture, WorkItem};
use serde_json::Value;

/// Builder for [`Capture`] values.
pub struct CaptureBuilder {
    capture: Capture,
}

impl CaptureBuilder {
    pub fn new() -> Self {
        Self {
            capture: Capture::new(WorkItem::new("test_task")),
        }
    }

    pub fn with_task(mut self, task: &str) -> Self {
        self.capture.work_item.task = task.to_string();
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.capture.work_item.args = args;
        self
    }

    pub fn with_local(mut self, name: &str, value: Value) -> Self {
        self.capture.locals.insert(name.to_string(), value);
        self
    }

    pub fn with_locals(mut self, locals: BTreeMap<String, Value>) -> Self {
        self.capture.locals = locals;
        self
    }

    pub fn with_receiver(mut self, receiver: Value) -> Self {
        self.capture.receiver = receiver;
        self
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.capture.captured_at = captured_at;
        self
    }

    pub fn build(self) -> Capture {
        self.capture
    }
}

impl Default for CaptureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`DeferSettings`] pointing at test resources.
pub struct SettingsBuilder {
    settings: DeferSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: DeferSettings::default(),
        }
    }

    pub fn with_disk_directory(mut self, directory: &Path) -> Self {
        self.settings.disk.directory = directory.display().to_string();
        self
    }

    pub fn with_default_handlers(mut self, names: &[&str]) -> Self {
        self.settings.defaults.handler = defer_core::HandlerChain::from_names(names.iter().copied());
        self
    }

    pub fn with_default_reporter(mut self, reporter: &str) -> Self {
        self.settings.defaults.reporter = reporter.to_string();
        self
    }

    pub fn with_configurations_path(mut self, path: &Path) -> Self {
        self.settings.configurations_path = Some(path.display().to_string());
        self
    }

    pub fn build(self) -> DeferSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
