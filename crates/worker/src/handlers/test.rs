use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use defer_core::{Capture, DeferError, DeferResult, Handler, HandlerOptions};

/// Handler for tests: records what it was given instead of running it.
///
/// Set `fail_next_time` to make the next call fail once. `executed` is set
/// by every call, including a failing one.
#[derive(Debug, Default)]
pub struct TestHandler {
    executed: AtomicBool,
    fail_next_time: AtomicBool,
    captures: Mutex<Vec<Capture>>,
    options: Mutex<Vec<HandlerOptions>>,
}

impl TestHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> bool {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn fail_next_time(&self) {
        self.fail_next_time.store(true, Ordering::SeqCst);
    }

    /// Captures accepted so far, oldest first.
    pub fn captures(&self) -> Vec<Capture> {
        self.captures.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn last_capture(&self) -> Option<Capture> {
        self.captures().pop()
    }

    pub fn last_options(&self) -> Option<HandlerOptions> {
        self.options.lock().ok().and_then(|o| o.last().cloned())
    }

    pub fn reset(&self) {
        self.executed.store(false, Ordering::SeqCst);
        self.fail_next_time.store(false, Ordering::SeqCst);
        if let Ok(mut captures) = self.captures.lock() {
            captures.clear();
        }
        if let Ok(mut options) = self.options.lock() {
            options.clear();
        }
    }
}

#[async_trait]
impl Handler for TestHandler {
    fn name(&self) -> &str {
        "test"
    }

    fn description(&self) -> &str {
        "Records captures for inspection in tests"
    }

    async fn handle(&self, capture: &Capture, options: &HandlerOptions) -> DeferResult<()> {
        self.executed.store(true, Ordering::SeqCst);
        if self.fail_next_time.swap(false, Ordering::SeqCst) {
            return Err(DeferError::handler("test", "failed on purpose"));
        }

        if let Ok(mut captures) = self.captures.lock() {
            captures.push(capture.clone());
        }
        if let Ok(mut recorded) = self.options.lock() {
            recorded.push(options.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_next_time_fails_once() {
        let handler = TestHandler::new();
        handler.fail_next_time();

        let capture = Capture::task("log");
        assert!(handler.handle(&capture, &HandlerOptions::new()).await.is_err());
        assert!(handler.executed());
        assert!(handler.last_capture().is_none());

        handler.handle(&capture, &HandlerOptions::new()).await.unwrap();
        assert_eq!(handler.last_capture(), Some(capture));

        handler.reset();
        assert!(!handler.executed());
        assert!(handler.captures().is_empty());
    }
}
