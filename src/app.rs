use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use defer_core::{
    CallSiteOptions, Capture, ConfigResolver, ConfigurationSource, DeferSettings,
    FileConfigurationSource, HandlerRegistry, MessageQueue, MessageQueueType, Outcome, Reporter,
    ReporterRegistry, StaticConfigurationSource, TaskRegistry, WorkItem,
};
use defer_dispatcher::{Background, DeferOptions, Dispatcher, RecoveryReport, RecoveryService};
use defer_infrastructure::{DiskQueue, MessageQueueFactory};
use defer_worker::{
    execute_payload, register_builtin_tasks, QueueWorker, RegistryFactory, TestHandler,
    TestReporter,
};
use tokio::sync::broadcast;
use tracing::info;

/// 主应用程序
///
/// Builds every registry once from [`DeferSettings`] and exposes the
/// operations behind the CLI subcommands.
pub struct Application {
    settings: DeferSettings,
    tasks: Arc<TaskRegistry>,
    message_queue: Arc<dyn MessageQueue>,
    factory: RegistryFactory,
    background: Background,
}

impl Application {
    /// Application with the built-in tasks only.
    pub async fn new(settings: DeferSettings) -> Result<Self> {
        let mut tasks = TaskRegistry::new();
        register_builtin_tasks(&mut tasks);
        Self::with_tasks(settings, tasks).await
    }

    pub async fn with_tasks(settings: DeferSettings, tasks: TaskRegistry) -> Result<Self> {
        info!(environment = %settings.environment, "initializing application");

        let tasks = Arc::new(tasks);
        let message_queue = MessageQueueFactory::create(&settings.message_queue)
            .await
            .context("failed to create message queue")?;

        let factory = RegistryFactory::new(settings.clone());
        let handlers: Arc<HandlerRegistry> = Arc::new(
            factory
                .build_handlers(tasks.clone(), message_queue.clone())
                .context("failed to build handler registry")?,
        );
        let reporters: Arc<ReporterRegistry> = Arc::new(factory.build_reporters());

        let source: Arc<dyn ConfigurationSource> = match &settings.configurations_path {
            Some(path) => Arc::new(FileConfigurationSource::new(path)),
            None => Arc::new(StaticConfigurationSource::empty()),
        };
        let resolver = ConfigResolver::new(source, settings.environment, settings.defaults.clone());
        let dispatcher = Dispatcher::new(handlers, reporters);
        let background = Background::new(Arc::new(resolver), Arc::new(dispatcher));

        Ok(Self {
            settings,
            tasks,
            message_queue,
            factory,
            background,
        })
    }

    pub fn settings(&self) -> &DeferSettings {
        &self.settings
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn tasks(&self) -> &Arc<TaskRegistry> {
        &self.tasks
    }

    pub fn message_queue(&self) -> &Arc<dyn MessageQueue> {
        &self.message_queue
    }

    pub fn test_handler(&self) -> Arc<TestHandler> {
        self.factory.test_handler()
    }

    pub fn test_reporter(&self) -> Arc<TestReporter> {
        self.factory.test_reporter()
    }

    pub async fn dispatch(
        &self,
        task: &str,
        args: Vec<serde_json::Value>,
        options: &DeferOptions,
    ) -> Result<Outcome> {
        let capture = Capture::new(WorkItem::with_args(task, args));
        let outcome = self
            .background
            .defer(&capture, options)
            .await
            .with_context(|| format!("failed to dispatch task '{task}'"))?;
        Ok(outcome)
    }

    /// True when `outcome` was accepted by a queue that lives only as long as
    /// this process.
    pub fn accepted_in_memory(&self, outcome: &Outcome) -> bool {
        outcome.handler() == Some("message_queue")
            && self.settings.message_queue.r#type == MessageQueueType::InMemory
    }

    /// Runs a capture handed over by the fork or runner handler.
    pub async fn execute(&self, payload: &str) -> Result<Capture> {
        let capture = execute_payload(payload, &self.tasks)
            .await
            .context("failed to execute payload")?;
        Ok(capture)
    }

    /// Recovery over `directory`, or the configured disk directory, reporting
    /// to the resolved default reporter.
    pub fn recovery_service(&self, directory: Option<&str>) -> Result<RecoveryService> {
        let queue = match directory {
            Some(directory) => Arc::new(DiskQueue::new(directory)),
            None => self.factory.disk_queue(),
        };
        Ok(RecoveryService::new(
            queue,
            self.background.dispatcher().handlers().clone(),
            self.default_reporter()?,
        ))
    }

    pub async fn recover(&self, target: &str, directory: Option<&str>) -> Result<RecoveryReport> {
        let report = self
            .recovery_service(directory)?
            .recover(target)
            .await
            .with_context(|| format!("recovery against '{target}' failed"))?;
        Ok(report)
    }

    pub fn queue_worker(&self, queue: Option<&str>) -> Result<QueueWorker> {
        let queue_name = queue.unwrap_or(&self.settings.message_queue.default_queue);
        Ok(QueueWorker::new(
            self.message_queue.clone(),
            queue_name,
            self.tasks.clone(),
            self.default_reporter()?,
        )
        .with_poll_interval(Duration::from_millis(
            self.settings.message_queue.poll_interval_ms,
        )))
    }

    /// Drains the queue once when `once` is set, otherwise polls until
    /// shutdown. Returns the number of messages taken in the `once` case.
    pub async fn consume(
        &self,
        queue: Option<&str>,
        once: bool,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<usize> {
        let worker = self.queue_worker(queue)?;
        if once {
            return worker.drain().await.context("failed to drain queue");
        }
        worker
            .run(shutdown_rx)
            .await
            .context("queue worker stopped with an error")?;
        Ok(0)
    }

    /// Reporter for work that runs outside a dispatch call.
    fn default_reporter(&self) -> Result<Arc<dyn Reporter>> {
        let name = self
            .background
            .resolver()
            .resolve(&CallSiteOptions::new(), None)
            .reporter;
        let reporter = self
            .background
            .dispatcher()
            .reporters()
            .require(&name)
            .with_context(|| format!("default reporter '{name}' is not registered"))?;
        Ok(reporter)
    }
}
