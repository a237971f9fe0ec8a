pub mod client;
pub mod item;
pub mod progress;

pub use client::{optimal_concurrent_download_count, write_atomically, Downloader};
pub use item::{Integrity, WorkItem};
pub use progress::{NullProgressListener, ProgressListener, TracingProgressListener};
