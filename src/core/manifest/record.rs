// ─── File Records ───
// Parsing of the flat `[name, size, hash]` manifest served by the update server.

use std::path::{Component, Path};

use serde_json::Value;
use tracing::warn;

/// A single file the server expects in the installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Relative name inside the data folder, e.g. `launcher-ui/main.html`.
    pub name: String,
    pub size: u64,
    /// Lowercase hex SHA-1 of the file contents.
    pub hash: String,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, size: u64, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            hash: hash.into(),
        }
    }
}

/// Parse a manifest document.
///
/// Anything that is not a JSON array yields an empty manifest. Elements that are
/// not well formed triples, or whose name would escape the install tree, are skipped.
pub fn parse_file_records(json: &[u8]) -> Vec<FileRecord> {
    let doc: Value = match serde_json::from_slice(json) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Manifest is not valid JSON: {}", e);
            return Vec::new();
        }
    };

    let Value::Array(elements) = doc else {
        warn!("Manifest root is not an array");
        return Vec::new();
    };

    elements
        .into_iter()
        .filter(Value::is_array)
        .filter_map(|element| {
            match serde_json::from_value::<(String, u64, String)>(element.clone()) {
                Ok((name, size, hash)) if is_safe_relative(&name) => {
                    Some(FileRecord::new(name, size, hash))
                }
                Ok((name, _, _)) => {
                    warn!("Skipping manifest entry with unsafe name {:?}", name);
                    None
                }
                Err(e) => {
                    warn!("Skipping malformed manifest entry {}: {}", element, e);
                    None
                }
            }
        })
        .collect()
}

fn is_safe_relative(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
