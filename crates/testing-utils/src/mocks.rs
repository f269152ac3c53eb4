//! Mock implementations of the handler and message queue seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use defer_core::{
    Capture, DeferError, DeferResult, Handler, HandlerOptions, MessageQueue, TaskRegistry,
};

/// Shared, ordered log of what ran. Handlers and tasks created from the
/// same log append to it in call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Handler with scripted failures that records every call.
pub struct MockHandler {
    name: String,
    failures_left: AtomicUsize,
    always_fail: AtomicBool,
    captures: Mutex<Vec<Capture>>,
    options: Mutex<Vec<HandlerOptions>>,
    log: Option<CallLog>,
}

impl MockHandler {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failures_left: AtomicUsize::new(0),
            always_fail: AtomicBool::new(false),
            captures: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
            log: None,
        }
    }

    /// Fails on every call.
    pub fn failing(name: &str) -> Self {
        let handler = Self::new(name);
        handler.always_fail.store(true, Ordering::SeqCst);
        handler
    }

    /// Fails the first `times` calls, then succeeds.
    pub fn failing_times(name: &str, times: usize) -> Self {
        let handler = Self::new(name);
        handler.failures_left.store(times, Ordering::SeqCst);
        handler
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn call_count(&self) -> usize {
        self.captures.lock().unwrap().len()
    }

    pub fn captures(&self) -> Vec<Capture> {
        self.captures.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<HandlerOptions> {
        self.options.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Handler for MockHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, capture: &Capture, options: &HandlerOptions) -> DeferResult<()> {
        self.captures.lock().unwrap().push(capture.clone());
        self.options.lock().unwrap().push(options.clone());
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }

        let scripted_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure || self.always_fail.load(Ordering::SeqCst) {
            return Err(DeferError::handler(&self.name, "mock failure"));
        }
        Ok(())
    }
}

/// Registers a task named `name` that appends its first argument (or the
/// task name) to `log`.
pub fn register_logging_task(registry: &mut TaskRegistry, name: &str, log: CallLog) {
    let task_name = name.to_string();
    registry.register_fn(name, move |capture| {
        let entry = capture
            .args()
            .first()
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| task_name.clone());
        log.lock().unwrap().push(entry);
        Ok(())
    });
}

/// In-memory message queue with failure and latency injection.
#[derive(Default)]
pub struct MockMessageQueue {
    queues: Mutex<HashMap<String, Vec<Vec<u8>>>>,
    should_fail: AtomicBool,
    publish_delay: Mutex<Option<Duration>>,
}

impl MockMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_publish_delay(&self, delay: Duration) {
        *self.publish_delay.lock().unwrap() = Some(delay);
    }

    pub fn get_published_messages(&self, queue: &str) -> Vec<Vec<u8>> {
        self.queues
            .lock()
            .unwrap()
            .get(queue)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_message_to_queue(&self, queue: &str, payload: &[u8]) {
        self.queues
            .lock()
            .unwrap()
            .entry(queue.to_string())
            .or_default()
            .push(payload.to_vec());
    }

    pub fn clear(&self) {
        self.queues.lock().unwrap().clear();
    }

    fn check_failure(&self) -> DeferResult<()> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DeferError::MessageQueue("mock broker unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageQueue for MockMessageQueue {
    async fn publish(&self, queue: &str, payload: &[u8]) -> DeferResult<()> {
        let delay = *self.publish_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;
        self.add_message_to_queue(queue, payload);
        Ok(())
    }

    async fn consume(&self, queue: &str) -> DeferResult<Option<Vec<u8>>> {
        self.check_failure()?;
        let mut queues = self.queues.lock().unwrap();
        Ok(queues
            .get_mut(queue)
            .filter(|messages| !messages.is_empty())
            .map(|messages| messages.remove(0)))
    }

    async fn create_queue(&self, queue: &str, _durable: bool) -> DeferResult<()> {
        self.check_failure()?;
        self.queues
            .lock()
            .unwrap()
            .entry(queue.to_string())
            .or_default();
        Ok(())
    }

    async fn queue_size(&self, queue: &str) -> DeferResult<u32> {
        self.check_failure()?;
        let queues = self.queues.lock().unwrap();
        Ok(queues.get(queue).map(|q| q.len()).unwrap_or(0) as u32)
    }
}
