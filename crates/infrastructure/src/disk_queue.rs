//! Durable on-disk queue of captures.
//!
//! One file per capture, named
//! `background_<unix-nanos>_<sequence>_<uuid>.json`. The zero-padded
//! timestamp and process-wide sequence make lexicographic order match
//! creation order. Within one process the timestamp never goes backwards,
//! even when the wall clock does. Files are written to a hidden temporary
//! name first and renamed into place, so a reader never sees a partial file
//! under a final name.
//!
//! A sweep claims a file by renaming it to `<name>.claimed` before reading
//! it. Claimed files are not listed, so two sweeps never replay the same
//! file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use defer_core::{Capture, DeferError, DeferResult};
use tokio::fs;
use tracing::{debug, warn};

pub const FILE_PREFIX: &str = "background_";
pub const FILE_SUFFIX: &str = ".json";
pub const CLAIM_SUFFIX: &str = ".claimed";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Strictly increasing within the process; follows the wall clock while it
/// moves forward.
fn next_stamp(now: u64) -> u64 {
    let mut last = LAST_STAMP.load(Ordering::SeqCst);
    loop {
        let stamp = now.max(last + 1);
        match LAST_STAMP.compare_exchange(last, stamp, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return stamp,
            Err(current) => last = current,
        }
    }
}

/// A file taken out of the queue by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedFile {
    /// Name the file is listed under.
    pub original: PathBuf,
    /// Name while claimed.
    pub claimed: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DiskQueue {
    directory: PathBuf,
}

impl DiskQueue {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn next_file_name(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let nanos = next_stamp(now);
        let sequence = SEQUENCE.fetch_add(1, Ordering::SeqCst);
        format!(
            "{FILE_PREFIX}{nanos:020}_{sequence:010}_{}{FILE_SUFFIX}",
            uuid::Uuid::new_v4().simple()
        )
    }

    /// Serializes `capture` into a new file and returns its path.
    pub async fn persist(&self, capture: &Capture) -> DeferResult<PathBuf> {
        let bytes = capture.to_json()?;

        fs::create_dir_all(&self.directory).await.map_err(|e| {
            DeferError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "failed to create directory '{}': {e}",
                    self.directory.display()
                ),
            ))
        })?;

        let file_name = self.next_file_name();
        let path = self.directory.join(&file_name);
        let tmp = self.directory.join(format!(".{file_name}.tmp"));

        if let Err(e) = fs::write(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(DeferError::Io(e));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(DeferError::Io(e));
        }

        debug!(path = %path.display(), capture_id = %capture.id, "persisted capture");
        Ok(path)
    }

    /// Capture files currently in the directory, oldest first. A missing
    /// directory is an empty queue.
    pub async fn list(&self) -> DeferResult<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DeferError::Io(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX) {
                files.push(entry.path());
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Reads a capture file. Unreadable content is reported as
    /// [`DeferError::CorruptCapture`]; I/O errors pass through unchanged.
    pub async fn load(&self, path: &Path) -> DeferResult<Capture> {
        let bytes = fs::read(path).await?;
        Capture::from_json(&bytes).map_err(|e| DeferError::CorruptCapture {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Takes `path` out of the queue. `None` when another sweep claimed or
    /// removed it first.
    pub async fn claim(&self, path: &Path) -> DeferResult<Option<ClaimedFile>> {
        let mut claimed = path.as_os_str().to_owned();
        claimed.push(CLAIM_SUFFIX);
        let claimed = PathBuf::from(claimed);

        match fs::rename(path, &claimed).await {
            Ok(()) => Ok(Some(ClaimedFile {
                original: path.to_path_buf(),
                claimed,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DeferError::Io(e)),
        }
    }

    /// Puts a claimed file back under its listed name.
    pub async fn release(&self, file: &ClaimedFile) -> DeferResult<()> {
        fs::rename(&file.claimed, &file.original).await?;
        Ok(())
    }

    /// Deletes a capture file. Already gone is not an error.
    pub async fn remove(&self, path: &Path) -> DeferResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "capture file already removed");
                Ok(())
            }
            Err(e) => Err(DeferError::Io(e)),
        }
    }
}
