//! Receiving side of the `fork` and `runner` handlers.

use defer_core::{Capture, DeferResult, TaskRegistry};
use tracing::info;

/// Decodes a payload produced by `fork` (JSON) or `runner` (base64 JSON).
pub fn decode_payload(payload: &str) -> DeferResult<Capture> {
    let trimmed = payload.trim();
    if trimmed.starts_with('{') {
        Capture::from_json(trimmed.as_bytes())
    } else {
        Capture::decode(trimmed)
    }
}

/// Decodes `payload` and runs its work item in this process.
pub async fn execute_payload(payload: &str, tasks: &TaskRegistry) -> DeferResult<Capture> {
    let capture = decode_payload(payload)?;
    info!(
        capture_id = %capture.id,
        task = capture.task_name(),
        locals = ?capture.locals,
        "executing received capture"
    );
    tasks.execute(&capture).await?;
    info!(capture_id = %capture.id, "received capture executed");
    Ok(capture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use defer_core::DeferError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_registry() -> (TaskRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut tasks = TaskRegistry::new();
        tasks.register_fn("count", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (tasks, calls)
    }

    #[tokio::test]
    async fn test_executes_base64_and_json_payloads() {
        let (tasks, calls) = counting_registry();
        let capture = Capture::task("count");

        let encoded = capture.encode().unwrap();
        let ran = execute_payload(&format!("{encoded}\n"), &tasks).await.unwrap();
        assert_eq!(ran, capture);

        let json = String::from_utf8(capture.to_json().unwrap()).unwrap();
        execute_payload(&json, &tasks).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_rejected() {
        let (tasks, calls) = counting_registry();
        assert!(execute_payload("%%% not a payload", &tasks).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let unknown = Capture::task("missing").encode().unwrap();
        assert!(matches!(
            execute_payload(&unknown, &tasks).await,
            Err(DeferError::UnknownTask { .. })
        ));
    }
}
