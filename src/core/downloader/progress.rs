use tracing::{debug, info};

use super::item::WorkItem;

/// Receives batch and per-file progress. Has no effect on update correctness.
///
/// Callbacks arrive from worker threads; events of different files may interleave.
pub trait ProgressListener: Send + Sync {
    fn update_files(&self, items: &[WorkItem]);
    fn begin_file(&self, item: &WorkItem);
    /// `bytes` is the cumulative count received for `item`.
    fn file_progress(&self, item: &WorkItem, bytes: u64);
    fn end_file(&self, item: &WorkItem);
    fn done_update(&self);
}

/// Reports progress as log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressListener;

impl ProgressListener for TracingProgressListener {
    fn update_files(&self, items: &[WorkItem]) {
        info!("Updating {} files", items.len());
    }

    fn begin_file(&self, item: &WorkItem) {
        debug!("Downloading {}", item.name);
    }

    fn file_progress(&self, item: &WorkItem, bytes: u64) {
        tracing::trace!("{}: {} bytes", item.name, bytes);
    }

    fn end_file(&self, item: &WorkItem) {
        debug!("Finished {} -> {:?}", item.name, item.dest);
    }

    fn done_update(&self) {
        info!("Update batch complete");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressListener;

impl ProgressListener for NullProgressListener {
    fn update_files(&self, _items: &[WorkItem]) {}
    fn begin_file(&self, _item: &WorkItem) {}
    fn file_progress(&self, _item: &WorkItem, _bytes: u64) {}
    fn end_file(&self, _item: &WorkItem) {}
    fn done_update(&self) {}
}
