use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use defer_core::{
    Capture, DeferError, HandlerChain, HandlerRegistry, HandlerSpec, Outcome, ReporterRegistry,
    TaskRegistry,
};
use defer_dispatcher::Dispatcher;
use defer_testing_utils::{call_log, log_entries, CaptureBuilder, MockHandler};
use defer_worker::{ForgetHandler, InProcessHandler, TestHandler, TestReporter};
use serde_json::json;

fn reporters(reporter: Arc<TestReporter>) -> Arc<ReporterRegistry> {
    let mut registry = ReporterRegistry::new();
    registry.register(reporter);
    Arc::new(registry)
}

#[tokio::test]
async fn test_first_success_after_failures_wins() {
    let log = call_log();
    let h1 = Arc::new(MockHandler::failing("h1").with_log(log.clone()));
    let h2 = Arc::new(MockHandler::failing("h2").with_log(log.clone()));
    let h3 = Arc::new(MockHandler::new("h3").with_log(log.clone()));
    let h4 = Arc::new(MockHandler::new("h4").with_log(log.clone()));

    let mut handlers = HandlerRegistry::new();
    handlers
        .register(h1.clone())
        .register(h2.clone())
        .register(h3.clone())
        .register(h4.clone());

    let reporter = Arc::new(TestReporter::new());
    let dispatcher = Dispatcher::new(Arc::new(handlers), reporters(reporter.clone()));

    let outcome = dispatcher
        .dispatch(
            &CaptureBuilder::new().build(),
            &HandlerChain::from_names(["h1", "h2", "h3", "h4"]),
            "test",
        )
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::accepted("h3"));
    assert_eq!(log_entries(&log), vec!["h1", "h2", "h3"]);
    assert_eq!(h4.call_count(), 0);
    assert_eq!(
        reporter.errors(),
        vec![
            "handler h1 failed: mock failure",
            "handler h2 failed: mock failure",
        ]
    );
}

#[tokio::test]
async fn test_all_handlers_failing_is_not_an_error() {
    let mut handlers = HandlerRegistry::new();
    for name in ["a", "b", "c"] {
        handlers.register(Arc::new(MockHandler::failing(name)));
    }
    let reporter = Arc::new(TestReporter::new());
    let dispatcher = Dispatcher::new(Arc::new(handlers), reporters(reporter.clone()));

    let outcome = dispatcher
        .dispatch(
            &CaptureBuilder::new().build(),
            &HandlerChain::from_names(["a", "b", "c"]),
            "test",
        )
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NoneAccepted);
    assert_eq!(reporter.count(), 3);
}

#[tokio::test]
async fn test_fail_once_falls_through_to_forget() {
    let test_handler = Arc::new(TestHandler::new());
    test_handler.fail_next_time();

    let mut handlers = HandlerRegistry::new();
    handlers
        .register(test_handler.clone())
        .register(Arc::new(ForgetHandler::new()));
    let reporter = Arc::new(TestReporter::new());
    let dispatcher = Dispatcher::new(Arc::new(handlers), reporters(reporter.clone()));

    let outcome = dispatcher
        .dispatch(
            &Capture::task("log"),
            &HandlerChain::from_names(["test", "forget"]),
            "test",
        )
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::accepted("forget"));
    assert_eq!(reporter.count(), 1);
    assert!(test_handler.executed());
    assert!(test_handler.captures().is_empty());
}

#[tokio::test]
async fn test_in_process_runs_task_with_no_reports() {
    let counter = Arc::new(AtomicI64::new(10));
    let mut tasks = TaskRegistry::new();
    {
        let counter = counter.clone();
        tasks.register_fn("increment", move |capture| {
            let by = capture.args().first().and_then(|v| v.as_i64()).unwrap_or(1);
            counter.fetch_add(by, Ordering::SeqCst);
            Ok(())
        });
    }

    let mut handlers = HandlerRegistry::new();
    handlers.register(Arc::new(InProcessHandler::new(Arc::new(tasks))));
    let reporter = Arc::new(TestReporter::new());
    let dispatcher = Dispatcher::new(Arc::new(handlers), reporters(reporter.clone()));

    let capture = Capture::task("increment").with_args(vec![json!(10)]);
    let outcome = dispatcher
        .dispatch(&capture, &HandlerChain::single("in_process"), "test")
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::accepted("in_process"));
    assert_eq!(counter.load(Ordering::SeqCst), 20);
    assert_eq!(reporter.count(), 0);
}

#[tokio::test]
async fn test_unknown_reporter_is_returned_before_any_handler_runs() {
    let handler = Arc::new(MockHandler::new("h1"));
    let mut handlers = HandlerRegistry::new();
    handlers.register(handler.clone());
    let dispatcher = Dispatcher::new(
        Arc::new(handlers),
        reporters(Arc::new(TestReporter::new())),
    );

    let result = dispatcher
        .dispatch(
            &Capture::task("log"),
            &HandlerChain::single("h1"),
            "pager",
        )
        .await;

    assert!(matches!(result, Err(DeferError::UnknownReporter { name }) if name == "pager"));
    assert_eq!(handler.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_handler_is_reported_and_skipped() {
    let handler = Arc::new(MockHandler::new("known"));
    let mut handlers = HandlerRegistry::new();
    handlers.register(handler.clone());
    let reporter = Arc::new(TestReporter::new());
    let dispatcher = Dispatcher::new(Arc::new(handlers), reporters(reporter.clone()));

    let outcome = dispatcher
        .dispatch(
            &Capture::task("log"),
            &HandlerChain::from_names(["missing", "known"]),
            "test",
        )
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::accepted("known"));
    assert_eq!(reporter.errors(), vec!["unknown handler: missing"]);
}

#[tokio::test]
async fn test_empty_chain_accepts_nothing() {
    let reporter = Arc::new(TestReporter::new());
    let dispatcher = Dispatcher::new(
        Arc::new(HandlerRegistry::new()),
        reporters(reporter.clone()),
    );

    let outcome = dispatcher
        .dispatch(&Capture::task("log"), &HandlerChain::default(), "test")
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NoneAccepted);
    assert_eq!(reporter.count(), 0);
}

#[tokio::test]
async fn test_handler_receives_its_spec_options() {
    let handler = Arc::new(MockHandler::new("message_queue"));
    let mut handlers = HandlerRegistry::new();
    handlers.register(handler.clone());
    let dispatcher = Dispatcher::new(
        Arc::new(handlers),
        reporters(Arc::new(TestReporter::new())),
    );

    let chain = HandlerChain::new(vec![
        HandlerSpec::new("message_queue").with_option("queue", json!("mailers"))
    ]);
    dispatcher
        .dispatch(&Capture::task("log"), &chain, "test")
        .await
        .unwrap();

    let options = handler.last_options().unwrap();
    assert_eq!(options.get("queue"), Some(&json!("mailers")));
}
