use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use defer_core::{DeferError, DeferResult, HandlerOptions, HandlerRegistry, Reporter};
use defer_infrastructure::{ClaimedFile, DiskQueue};
use metrics::counter;
use tracing::{debug, info, instrument, warn};

/// 恢复报告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryReport {
    /// Files handed to the target handler and deleted afterwards.
    pub replayed: usize,
    /// Files the target handler rejected; they stay on disk.
    pub failed: usize,
    /// Files that could not be decoded; they stay on disk.
    pub corrupt: Vec<PathBuf>,
    pub duration_ms: u64,
}

impl RecoveryReport {
    pub fn attempted(&self) -> usize {
        self.replayed + self.failed + self.corrupt.len()
    }
}

/// Replays captures persisted by the `disk` handler against another handler.
///
/// Files are processed oldest first and one at a time. Each file is claimed
/// before it is read, so concurrent sweeps never deliver the same file
/// twice. A file is deleted only after the target handler accepted it;
/// rejected and corrupt files are put back under their listed name.
pub struct RecoveryService {
    queue: Arc<DiskQueue>,
    handlers: Arc<HandlerRegistry>,
    reporter: Arc<dyn Reporter>,
}

impl RecoveryService {
    pub fn new(
        queue: Arc<DiskQueue>,
        handlers: Arc<HandlerRegistry>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            queue,
            handlers,
            reporter,
        }
    }

    pub fn queue(&self) -> &DiskQueue {
        &self.queue
    }

    #[instrument(skip(self), fields(directory = %self.queue.directory().display()))]
    pub async fn recover(&self, target: &str) -> DeferResult<RecoveryReport> {
        let handler = self.handlers.require(target)?;
        let started = Instant::now();
        let files = self.queue.list().await?;
        let options = HandlerOptions::new();
        let mut report = RecoveryReport::default();

        info!(pending = files.len(), handler = target, "开始恢复持久化任务");

        for path in files {
            let file = match self.queue.claim(&path).await {
                Ok(Some(file)) => file,
                Ok(None) => {
                    debug!(path = %path.display(), "file taken by another sweep");
                    continue;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to claim capture file");
                    counter!("defer_recovery_files_total", "result" => "failed").increment(1);
                    self.reporter.report(&e).await;
                    report.failed += 1;
                    continue;
                }
            };

            let capture = match self.queue.load(&file.claimed).await {
                Ok(capture) => capture,
                Err(DeferError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "file removed while claimed");
                    continue;
                }
                Err(e @ DeferError::CorruptCapture { .. }) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt capture file");
                    counter!("defer_recovery_files_total", "result" => "corrupt").increment(1);
                    self.reporter.report(&e).await;
                    self.release(&file).await;
                    report.corrupt.push(path);
                    continue;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read capture file");
                    counter!("defer_recovery_files_total", "result" => "failed").increment(1);
                    self.reporter.report(&e).await;
                    self.release(&file).await;
                    report.failed += 1;
                    continue;
                }
            };

            match handler.handle(&capture, &options).await {
                Ok(()) => {
                    if let Err(e) = self.queue.remove(&file.claimed).await {
                        warn!(path = %path.display(), error = %e, "replayed capture could not be removed");
                        self.reporter.report(&e).await;
                    }
                    counter!("defer_recovery_files_total", "result" => "replayed").increment(1);
                    debug!(path = %path.display(), capture_id = %capture.id, "capture replayed");
                    report.replayed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "replay failed, keeping file");
                    counter!("defer_recovery_files_total", "result" => "failed").increment(1);
                    self.reporter.report(&e).await;
                    self.release(&file).await;
                    report.failed += 1;
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            replayed = report.replayed,
            failed = report.failed,
            corrupt = report.corrupt.len(),
            duration_ms = report.duration_ms,
            "恢复完成"
        );
        Ok(report)
    }

    /// Returns a claimed file to the queue for the next sweep.
    async fn release(&self, file: &ClaimedFile) {
        if let Err(e) = self.queue.release(file).await {
            warn!(path = %file.claimed.display(), error = %e, "claimed capture could not be released");
            self.reporter.report(&e).await;
        }
    }
}
