//! Name-keyed registries for handlers, reporters and tasks.
//!
//! Registries are filled once at start-up and then shared behind an `Arc`;
//! the dispatch path only ever reads them, so they carry no locks.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{
    models::Capture,
    traits::{FnTask, Handler, Reporter, Task},
    DeferError, DeferResult,
};

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers under the handler's own name, replacing any previous entry.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> &mut Self {
        let name = handler.name().to_string();
        self.register_as(name, handler)
    }

    /// Registers under an explicit name, e.g. a second `disk` handler
    /// pointing at another directory.
    pub fn register_as(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> &mut Self {
        let name = name.into();
        debug!(handler = %name, "registering handler");
        self.handlers.insert(name, handler);
        self
    }

    pub fn register_batch(&mut self, handlers: Vec<Arc<dyn Handler>>) -> &mut Self {
        for handler in handlers {
            self.register(handler);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Like [`get`](Self::get) but turns a missing name into
    /// [`DeferError::UnknownHandler`].
    pub fn require(&self, name: &str) -> DeferResult<Arc<dyn Handler>> {
        self.get(name).ok_or_else(|| DeferError::UnknownHandler {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(name, description)` pairs sorted by name.
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut described: Vec<(String, String)> = self
            .handlers
            .iter()
            .map(|(name, handler)| (name.clone(), handler.description().to_string()))
            .collect();
        described.sort();
        described
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct ReporterRegistry {
    reporters: HashMap<String, Arc<dyn Reporter>>,
}

impl ReporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, reporter: Arc<dyn Reporter>) -> &mut Self {
        let name = reporter.name().to_string();
        debug!(reporter = %name, "registering reporter");
        self.reporters.insert(name, reporter);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Reporter>> {
        self.reporters.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> DeferResult<Arc<dyn Reporter>> {
        self.get(name).ok_or_else(|| DeferError::UnknownReporter {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reporters.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.reporters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

/// Resolves work items back to runnable tasks.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Arc<dyn Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, task: Arc<dyn Task>) -> &mut Self {
        let name = name.into();
        debug!(task = %name, "registering task");
        self.tasks.insert(name, task);
        self
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Capture) -> DeferResult<()> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnTask::new(f)))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tasks.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs the capture's work item in the calling task.
    pub async fn execute(&self, capture: &Capture) -> DeferResult<()> {
        let task = self
            .get(capture.task_name())
            .ok_or_else(|| DeferError::UnknownTask {
                name: capture.task_name().to_string(),
            })?;
        debug!(task = capture.task_name(), capture_id = %capture.id, "executing task");
        task.run(capture).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HandlerOptions;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named(&'static str);

    #[async_trait]
    impl Handler for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn handle(&self, _capture: &Capture, _options: &HandlerOptions) -> DeferResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_handler_registry_lookup() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(Named("forget")))
            .register_as("archive", Arc::new(Named("disk")));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("forget"));
        assert!(registry.contains("archive"));
        assert!(!registry.contains("disk"));
        assert_eq!(registry.names(), vec!["archive", "forget"]);
        assert!(matches!(
            registry.require("disk"),
            Err(DeferError::UnknownHandler { name }) if name == "disk"
        ));
    }

    #[test]
    fn test_reporter_registry_unknown_name() {
        let registry = ReporterRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.require("pager"),
            Err(DeferError::UnknownReporter { .. })
        ));
    }

    #[tokio::test]
    async fn test_task_registry_executes_by_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut registry = TaskRegistry::new();
        registry.register_fn("bump", move |capture| {
            let by = capture.args().first().and_then(|v| v.as_u64()).unwrap_or(1);
            counter.fetch_add(by as usize, Ordering::SeqCst);
            Ok(())
        });

        let capture = Capture::task("bump").with_args(vec![serde_json::json!(5)]);
        registry.execute(&capture).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let missing = Capture::task("nope");
        assert!(matches!(
            registry.execute(&missing).await,
            Err(DeferError::UnknownTask { name }) if name == "nope"
        ));
    }
}
