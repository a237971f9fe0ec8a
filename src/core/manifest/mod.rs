pub mod client;
pub mod record;

pub use client::{fetch_manifest, fetch_release_tag};
pub use record::{parse_file_records, FileRecord};
