// ─── Integrity ───
// SHA-1 digests and the size/hash comparison against manifest records.

use std::io::Read;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::manifest::FileRecord;

/// Lowercase hex SHA-1 of `bytes`.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Check downloaded bytes against the declared size and hash.
pub fn verify(url: &str, bytes: &[u8], size: u64, hash: &str) -> UpdaterResult<()> {
    let actual_size = bytes.len() as u64;
    if actual_size != size {
        return Err(UpdaterError::SizeMismatch {
            url: url.to_string(),
            expected: size,
            actual: actual_size,
        });
    }

    let actual = sha1_hex(bytes);
    if !actual.eq_ignore_ascii_case(hash) {
        return Err(UpdaterError::Sha1Mismatch {
            url: url.to_string(),
            expected: hash.to_string(),
            actual,
        });
    }

    Ok(())
}

/// Whether the file at `path` disagrees with `record`: missing, wrong size or wrong hash.
pub fn is_outdated(path: &Path, record: &FileRecord) -> bool {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return true,
    };

    if metadata.len() != record.size {
        return true;
    }

    match file_sha1(path) {
        Ok(actual) => !actual.eq_ignore_ascii_case(&record.hash),
        Err(_) => true,
    }
}

fn file_sha1(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = [0u8; 8192];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
