use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::downloader::write_atomically;
use crate::core::error::UpdaterResult;

pub const VERSION_FILE: &str = ".version.json";

/// Installed release tag per tracked item, e.g. `{"rawfile_version": "v0.7.3"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonVersionRecord(BTreeMap<String, String>);

impl AddonVersionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, tag: impl Into<String>) {
        self.0.insert(key.into(), tag.into());
    }
}

pub fn version_file_path(install_dir: &Path) -> PathBuf {
    install_dir.join(VERSION_FILE)
}

/// Read the version record of an install.
///
/// `None` when the file is missing or is not a JSON object; either way every
/// tracked item has to be fetched again. Non-string values are kept as their
/// JSON text, so `7` reads back as the tag `"7"`.
pub fn read_version_record(install_dir: &Path) -> Option<AddonVersionRecord> {
    let path = version_file_path(install_dir);
    let raw = std::fs::read(&path).ok()?;

    let doc: Value = match serde_json::from_slice(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Ignoring malformed version file {:?}: {}", path, e);
            return None;
        }
    };

    let Value::Object(map) = doc else {
        warn!("Ignoring version file {:?}: not a JSON object", path);
        return None;
    };

    let mut record = AddonVersionRecord::new();
    for (key, value) in map {
        match value {
            Value::String(tag) => record.set(key, tag),
            other => record.set(key, other.to_string()),
        }
    }
    Some(record)
}

pub fn write_version_record(install_dir: &Path, record: &AddonVersionRecord) -> UpdaterResult<()> {
    let json = serde_json::to_vec_pretty(record)?;
    write_atomically(&version_file_path(install_dir), &json)
}
