use std::sync::Arc;
use std::time::Duration;

use defer_core::{
    config::DeferSettings, DeferResult, HandlerRegistry, MessageQueue, ReporterRegistry,
    TaskRegistry,
};
use defer_infrastructure::DiskQueue;
use tracing::info;

use crate::handlers::{
    CompanionCommand, DiskHandler, ForgetHandler, ForkHandler, InProcessHandler,
    MessageQueueHandler, RunnerHandler, TestHandler,
};
use crate::reporters::{
    LogReporter, NotificationReporter, SilentReporter, StderrReporter, StdoutReporter,
    TestReporter,
};

/// Builds the handler and reporter registries from settings.
///
/// The `test` handler and `test` reporter instances are kept so callers can
/// inspect them after dispatching.
pub struct RegistryFactory {
    settings: DeferSettings,
    test_handler: Arc<TestHandler>,
    test_reporter: Arc<TestReporter>,
}

impl RegistryFactory {
    pub fn new(settings: DeferSettings) -> Self {
        Self {
            settings,
            test_handler: Arc::new(TestHandler::new()),
            test_reporter: Arc::new(TestReporter::new()),
        }
    }

    pub fn settings(&self) -> &DeferSettings {
        &self.settings
    }

    pub fn test_handler(&self) -> Arc<TestHandler> {
        self.test_handler.clone()
    }

    pub fn test_reporter(&self) -> Arc<TestReporter> {
        self.test_reporter.clone()
    }

    pub fn disk_queue(&self) -> Arc<DiskQueue> {
        Arc::new(DiskQueue::new(&self.settings.disk.directory))
    }

    /// All built-in handlers.
    pub fn build_handlers(
        &self,
        tasks: Arc<TaskRegistry>,
        message_queue: Arc<dyn MessageQueue>,
    ) -> DeferResult<HandlerRegistry> {
        let settings = &self.settings;
        let mut registry = HandlerRegistry::new();

        registry
            .register(Arc::new(InProcessHandler::new(tasks)))
            .register(Arc::new(ForgetHandler::new()))
            .register(Arc::new(ForkHandler::new(CompanionCommand::from_settings(
                &settings.fork,
                settings.fork_args(),
            )?)))
            .register(Arc::new(DiskHandler::new(self.disk_queue())))
            .register(Arc::new(RunnerHandler::new(CompanionCommand::from_settings(
                &settings.runner,
                settings.runner_args(),
            )?)))
            .register(Arc::new(MessageQueueHandler::new(
                message_queue,
                settings.message_queue.default_queue.clone(),
                Duration::from_secs(settings.message_queue.publish_timeout_seconds),
            )))
            .register(self.test_handler.clone());

        info!(handlers = ?registry.names(), "handler registry built");
        Ok(registry)
    }

    /// All built-in reporters. `notification` is only present when a webhook
    /// URL is configured.
    pub fn build_reporters(&self) -> ReporterRegistry {
        let mut registry = ReporterRegistry::new();
        registry
            .register(Arc::new(StdoutReporter))
            .register(Arc::new(StderrReporter))
            .register(Arc::new(SilentReporter))
            .register(Arc::new(LogReporter))
            .register(self.test_reporter.clone());

        if let Some(url) = &self.settings.notification.url {
            registry.register(Arc::new(NotificationReporter::new(
                url.clone(),
                Duration::from_secs(self.settings.notification.timeout_seconds),
            )));
        }

        info!(reporters = ?registry.names(), "reporter registry built");
        registry
    }
}
