//! Test helper utilities.

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// Wait for a condition to be true with timeout
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }

        false
    }

    /// Fresh temporary directory for a disk queue; removed on drop.
    pub fn disk_directory() -> TempDir {
        tempfile::Builder::new()
            .prefix("defer-disk-")
            .tempdir()
            .expect("failed to create temporary directory")
    }

    /// Number of entries in `dir`, zero when it does not exist.
    pub fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Writes `contents` to `name` inside `dir` and returns the path.
    pub fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("failed to write test file");
        path
    }
}
