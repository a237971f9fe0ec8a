use std::path::PathBuf;

use crate::core::manifest::FileRecord;

/// How much the downloaded bytes can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    /// Manifest-declared size and SHA-1 must match.
    Verified { size: u64, hash: String },
    /// The URL is authoritative; nothing to compare against.
    Unverified,
}

/// A single file to fetch, claimed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Name shown to progress listeners.
    pub name: String,
    pub url: String,
    pub dest: PathBuf,
    pub integrity: Integrity,
}

impl WorkItem {
    /// Work item for a manifest record served from `data_folder_url`.
    pub fn verified(record: &FileRecord, data_folder_url: &str, dest: PathBuf) -> Self {
        Self {
            name: record.name.clone(),
            url: format!("{}{}", data_folder_url, record.name),
            dest,
            integrity: Integrity::Verified {
                size: record.size,
                hash: record.hash.clone(),
            },
        }
    }

    /// Pass-through work item: whatever `url` serves is written to `dest`.
    pub fn unverified(url: impl Into<String>, dest: PathBuf) -> Self {
        let url = url.into();
        Self {
            name: url.clone(),
            url,
            dest,
            integrity: Integrity::Unverified,
        }
    }
}
