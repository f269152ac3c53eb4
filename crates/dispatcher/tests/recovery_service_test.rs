use std::sync::Arc;

use defer_core::{
    Capture, DeferError, HandlerChain, HandlerRegistry, Outcome, ReporterRegistry, TaskRegistry,
};
use defer_dispatcher::{Dispatcher, RecoveryService};
use defer_infrastructure::DiskQueue;
use defer_testing_utils::{call_log, log_entries, register_logging_task, MockHandler, TestEnv};
use defer_worker::{DiskHandler, InProcessHandler, TestHandler, TestReporter};
use serde_json::json;

fn recorded(task: &str, entry: &str) -> Capture {
    Capture::task(task).with_args(vec![json!(entry)])
}

#[tokio::test]
async fn test_disk_then_recover_round_trip() {
    let dir = TestEnv::disk_directory();
    let queue = Arc::new(DiskQueue::new(dir.path()));
    let test_handler = Arc::new(TestHandler::new());

    let mut handlers = HandlerRegistry::new();
    handlers
        .register(Arc::new(DiskHandler::new(queue.clone())))
        .register(test_handler.clone());
    let handlers = Arc::new(handlers);

    let reporter = Arc::new(TestReporter::new());
    let mut reporters = ReporterRegistry::new();
    reporters.register(reporter.clone());
    let dispatcher = Dispatcher::new(handlers.clone(), Arc::new(reporters));

    let capture = Capture::task("send_email")
        .with_args(vec![json!("ada@example.com")])
        .with_local("user_id", json!(42))
        .with_receiver(json!({ "mailer": "welcome" }));
    let outcome = dispatcher
        .dispatch(&capture, &HandlerChain::single("disk"), "test")
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::accepted("disk"));
    assert_eq!(TestEnv::file_count(dir.path()), 1);

    let recovery = RecoveryService::new(queue, handlers, reporter.clone());
    let report = recovery.recover("test").await.unwrap();

    assert_eq!(report.replayed, 1);
    assert_eq!(test_handler.captures(), vec![capture]);
    assert_eq!(TestEnv::file_count(dir.path()), 0);
    assert_eq!(reporter.count(), 0);
}

#[tokio::test]
async fn test_replays_in_submission_order_and_empties_directory() {
    let dir = TestEnv::disk_directory();
    let queue = Arc::new(DiskQueue::new(dir.path()));
    for entry in ["t1", "t2", "t3"] {
        queue.persist(&recorded("record", entry)).await.unwrap();
    }

    let log = call_log();
    let mut tasks = TaskRegistry::new();
    register_logging_task(&mut tasks, "record", log.clone());
    let mut handlers = HandlerRegistry::new();
    handlers.register(Arc::new(InProcessHandler::new(Arc::new(tasks))));

    let recovery = RecoveryService::new(
        queue.clone(),
        Arc::new(handlers),
        Arc::new(TestReporter::new()),
    );
    let report = recovery.recover("in_process").await.unwrap();

    assert_eq!(report.replayed, 3);
    assert_eq!(log_entries(&log), vec!["t1", "t2", "t3"]);
    assert!(queue.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_replay_keeps_file_and_continues() {
    let dir = TestEnv::disk_directory();
    let queue = Arc::new(DiskQueue::new(dir.path()));
    let first = queue.persist(&recorded("record", "f1")).await.unwrap();
    for entry in ["f2", "f3", "f4"] {
        queue.persist(&recorded("record", entry)).await.unwrap();
    }

    let flaky = Arc::new(MockHandler::failing_times("flaky", 1));
    let mut handlers = HandlerRegistry::new();
    handlers.register(flaky.clone());
    let reporter = Arc::new(TestReporter::new());

    let recovery = RecoveryService::new(queue.clone(), Arc::new(handlers), reporter.clone());
    let report = recovery.recover("flaky").await.unwrap();

    assert_eq!(report.replayed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.attempted(), 4);
    assert_eq!(reporter.count(), 1);

    let attempted: Vec<String> = flaky
        .captures()
        .iter()
        .map(|c| c.args()[0].as_str().unwrap().to_string())
        .collect();
    assert_eq!(attempted, vec!["f1", "f2", "f3", "f4"]);
    assert_eq!(queue.list().await.unwrap(), vec![first]);
}

#[tokio::test]
async fn test_corrupt_file_is_reported_skipped_and_kept() {
    let dir = TestEnv::disk_directory();
    let corrupt = TestEnv::write_file(
        dir.path(),
        "background_00000000000000000000_0000000000_corrupt.json",
        "{ not a capture",
    );
    let queue = Arc::new(DiskQueue::new(dir.path()));
    queue.persist(&recorded("record", "ok")).await.unwrap();

    let test_handler = Arc::new(TestHandler::new());
    let mut handlers = HandlerRegistry::new();
    handlers.register(test_handler.clone());
    let reporter = Arc::new(TestReporter::new());

    let recovery = RecoveryService::new(queue.clone(), Arc::new(handlers), reporter.clone());
    let report = recovery.recover("test").await.unwrap();

    assert_eq!(report.corrupt, vec![corrupt.clone()]);
    assert_eq!(report.replayed, 1);
    assert_eq!(test_handler.captures().len(), 1);
    assert!(reporter
        .last_error()
        .unwrap()
        .starts_with("corrupt capture file"));
    assert_eq!(queue.list().await.unwrap(), vec![corrupt]);
}

#[tokio::test]
async fn test_unknown_target_handler_is_an_error() {
    let dir = TestEnv::disk_directory();
    let queue = Arc::new(DiskQueue::new(dir.path()));
    queue.persist(&recorded("record", "kept")).await.unwrap();

    let recovery = RecoveryService::new(
        queue.clone(),
        Arc::new(HandlerRegistry::new()),
        Arc::new(TestReporter::new()),
    );
    let result = recovery.recover("nowhere").await;

    assert!(matches!(result, Err(DeferError::UnknownHandler { .. })));
    assert_eq!(queue.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_directory_recovers_nothing() {
    let dir = TestEnv::disk_directory();
    let queue = Arc::new(DiskQueue::new(dir.path().join("never-created")));
    let mut handlers = HandlerRegistry::new();
    handlers.register(Arc::new(TestHandler::new()));

    let recovery = RecoveryService::new(queue, Arc::new(handlers), Arc::new(TestReporter::new()));
    let report = recovery.recover("test").await.unwrap();

    assert_eq!(report.attempted(), 0);
}

#[tokio::test]
async fn test_file_removed_mid_sweep_is_skipped_silently() {
    let dir = TestEnv::disk_directory();
    let queue = Arc::new(DiskQueue::new(dir.path()));
    for entry in ["first", "second", "third"] {
        queue.persist(&recorded("drain", entry)).await.unwrap();
    }

    // The first replay deletes every file still waiting in the directory.
    let directory = dir.path().to_path_buf();
    let mut tasks = TaskRegistry::new();
    tasks.register_fn("drain", move |_capture| {
        for entry in std::fs::read_dir(&directory)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.starts_with("background_") && name.ends_with(".json") {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    });
    let mut handlers = HandlerRegistry::new();
    handlers.register(Arc::new(InProcessHandler::new(Arc::new(tasks))));
    let reporter = Arc::new(TestReporter::new());

    let recovery = RecoveryService::new(queue.clone(), Arc::new(handlers), reporter.clone());
    let report = recovery.recover("in_process").await.unwrap();

    assert_eq!(report.replayed, 1);
    assert_eq!(report.failed, 0);
    assert!(report.corrupt.is_empty());
    assert_eq!(reporter.count(), 0);
    assert_eq!(TestEnv::file_count(dir.path()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sweeps_deliver_each_file_once() {
    let dir = TestEnv::disk_directory();
    let writer = DiskQueue::new(dir.path());
    let mut expected = Vec::new();
    for i in 0..50 {
        let entry = format!("job-{i:02}");
        writer.persist(&recorded("record", &entry)).await.unwrap();
        expected.push(entry);
    }

    let log = call_log();
    let mut tasks = TaskRegistry::new();
    register_logging_task(&mut tasks, "record", log.clone());
    let mut handlers = HandlerRegistry::new();
    handlers.register(Arc::new(InProcessHandler::new(Arc::new(tasks))));
    let handlers = Arc::new(handlers);
    let reporter = Arc::new(TestReporter::new());

    let a = RecoveryService::new(
        Arc::new(DiskQueue::new(dir.path())),
        handlers.clone(),
        reporter.clone(),
    );
    let b = RecoveryService::new(
        Arc::new(DiskQueue::new(dir.path())),
        handlers,
        reporter.clone(),
    );
    let (report_a, report_b) = tokio::join!(a.recover("in_process"), b.recover("in_process"));
    let (report_a, report_b) = (report_a.unwrap(), report_b.unwrap());

    assert_eq!(report_a.replayed + report_b.replayed, 50);
    assert_eq!(report_a.failed + report_b.failed, 0);
    assert_eq!(reporter.count(), 0);

    let mut executed = log_entries(&log);
    executed.sort();
    assert_eq!(executed, expected);
    assert_eq!(TestEnv::file_count(dir.path()), 0);
}
