use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::http::Transport;
use crate::core::integrity;

use super::item::{Integrity, WorkItem};
use super::progress::ProgressListener;

/// Concurrent, SHA-1 validated downloader.
///
/// A batch is all-or-nothing: the first failure stops further work and is
/// returned once every worker has joined.
pub struct Downloader {
    transport: Arc<dyn Transport>,
    /// Fixed worker count; derived from the machine when `None`.
    concurrency: Option<usize>,
}

impl Downloader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            concurrency: None,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n.max(1));
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    // ── Single file download ────────────────────────────

    /// Download one work item, verify it according to its policy and write it
    /// atomically to its destination.
    ///
    /// Creates parent directories as needed.
    pub fn download_file(
        &self,
        item: &WorkItem,
        listener: &dyn ProgressListener,
    ) -> UpdaterResult<()> {
        let bytes = self
            .transport
            .get(&item.url, &mut |received| listener.file_progress(item, received))?;

        match &item.integrity {
            Integrity::Verified { size, hash } => integrity::verify(&item.url, &bytes, *size, hash)?,
            Integrity::Unverified => {}
        }

        write_atomically(&item.dest, &bytes)?;

        debug!("Downloaded: {} -> {:?}", item.url, item.dest);
        Ok(())
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download every item with a bounded pool of worker threads.
    ///
    /// Workers claim items through a shared cursor, so each item is fetched
    /// exactly once. Once a failure is recorded no new items are claimed.
    pub fn download_batch(
        &self,
        items: &[WorkItem],
        listener: &dyn ProgressListener,
    ) -> UpdaterResult<()> {
        listener.update_files(items);

        let workers = self
            .concurrency
            .map(|n| n.min(items.len()).max(1))
            .unwrap_or_else(|| optimal_concurrent_download_count(items.len()));

        info!(
            "Starting batch download: {} files, workers={}",
            items.len(),
            workers
        );

        let cursor = AtomicUsize::new(0);
        let failure: OnceLock<UpdaterError> = OnceLock::new();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    while failure.get().is_none() {
                        let index = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some(item) = items.get(index) else {
                            break;
                        };

                        listener.begin_file(item);
                        match self.download_file(item, listener) {
                            Ok(()) => listener.end_file(item),
                            Err(e) => {
                                warn!("Download of {} failed: {}", item.name, e);
                                let _ = failure.set(e);
                                return;
                            }
                        }
                    }
                });
            }
        });

        if let Some(e) = failure.into_inner() {
            return Err(e);
        }

        listener.done_update();
        Ok(())
    }
}

/// Worker count for a batch: two thirds of the hardware threads, never more
/// than there are files and never less than one.
pub fn optimal_concurrent_download_count(file_count: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    concurrent_download_count(cores, file_count)
}

fn concurrent_download_count(cores: usize, file_count: usize) -> usize {
    ((cores * 2) / 3).min(file_count).max(1)
}

/// Write `bytes` next to `dest` and rename over it, so `dest` only ever holds a
/// complete file.
pub fn write_atomically(dest: &Path, bytes: &[u8]) -> UpdaterResult<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| UpdaterError::io(parent, e))?;
    }

    let staging = staging_path(dest);
    // `fs::write` closes the handle before the rename (required on Windows).
    if let Err(e) = std::fs::write(&staging, bytes) {
        let _ = std::fs::remove_file(&staging);
        return Err(UpdaterError::io(&staging, e));
    }

    if let Err(e) = std::fs::rename(&staging, dest) {
        let _ = std::fs::remove_file(&staging);
        return Err(UpdaterError::io(dest, e));
    }

    Ok(())
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".download");
    dest.with_file_name(name)
}
