use serde_json::Value;
use tracing::{info, warn};

use crate::core::http::Transport;

use super::record::{parse_file_records, FileRecord};

/// Fetch the channel manifest.
///
/// Transport or parse failures are not errors: an empty manifest means there is
/// nothing to update this time around.
pub fn fetch_manifest(transport: &dyn Transport, url: &str) -> Vec<FileRecord> {
    info!("Fetching update manifest from {}", url);

    match transport.get(url, &mut |_| {}) {
        Ok(body) => {
            let records = parse_file_records(&body);
            info!("Manifest lists {} files", records.len());
            records
        }
        Err(e) => {
            warn!("Could not fetch manifest {}: {}", url, e);
            Vec::new()
        }
    }
}

/// Fetch a release description and return its `tag_name`.
///
/// `None` means no comparison is possible.
pub fn fetch_release_tag(transport: &dyn Transport, url: &str) -> Option<String> {
    let body = match transport.get(url, &mut |_| {}) {
        Ok(body) => body,
        Err(e) => {
            warn!("Could not fetch release info {}: {}", url, e);
            return None;
        }
    };

    parse_release_tag(&body)
}

pub fn parse_release_tag(json: &[u8]) -> Option<String> {
    let doc: Value = serde_json::from_slice(json).ok()?;
    doc.as_object()?
        .get("tag_name")?
        .as_str()
        .map(str::to_owned)
}
