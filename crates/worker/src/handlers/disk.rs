use std::sync::Arc;

use async_trait::async_trait;
use defer_core::{Capture, DeferResult, Handler, HandlerOptions};
use defer_infrastructure::DiskQueue;
use tracing::info;

/// Persists the capture into the durable disk queue for a later recovery
/// sweep. The `directory` option redirects a single dispatch to another
/// directory.
pub struct DiskHandler {
    queue: Arc<DiskQueue>,
}

impl DiskHandler {
    pub fn new(queue: Arc<DiskQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Handler for DiskHandler {
    fn name(&self) -> &str {
        "disk"
    }

    fn description(&self) -> &str {
        "Stores the work on disk for later recovery"
    }

    async fn handle(&self, capture: &Capture, options: &HandlerOptions) -> DeferResult<()> {
        let path = match options.get("directory").and_then(|v| v.as_str()) {
            Some(directory) => DiskQueue::new(directory).persist(capture).await?,
            None => self.queue.persist(capture).await?,
        };
        info!(path = %path.display(), task = capture.task_name(), "capture stored on disk");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_writes_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(DiskQueue::new(dir.path()));
        let handler = DiskHandler::new(queue.clone());

        let capture = Capture::task("log").with_args(vec![json!("x")]);
        handler.handle(&capture, &HandlerOptions::new()).await.unwrap();

        let files = queue.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(queue.load(&files[0]).await.unwrap(), capture);
    }

    #[tokio::test]
    async fn test_directory_option_overrides() {
        let default_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();
        let handler = DiskHandler::new(Arc::new(DiskQueue::new(default_dir.path())));

        let mut options = HandlerOptions::new();
        options.insert(
            "directory".to_string(),
            json!(other_dir.path().to_str().unwrap()),
        );
        handler.handle(&Capture::task("log"), &options).await.unwrap();

        assert!(DiskQueue::new(default_dir.path()).list().await.unwrap().is_empty());
        assert_eq!(DiskQueue::new(other_dir.path()).list().await.unwrap().len(), 1);
    }
}
