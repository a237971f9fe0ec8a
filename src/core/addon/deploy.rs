use std::path::Path;

use tracing::{debug, info};

use crate::core::error::{UpdaterError, UpdaterResult};

/// Extract `archive` into `into`, overwriting existing files, then delete the archive.
pub fn deploy_archive(archive: &Path, into: &Path) -> UpdaterResult<()> {
    if !archive.is_file() {
        return Err(UpdaterError::ArchiveMissing(archive.to_path_buf()));
    }

    // Scoped so the archive handle is closed before the file is removed.
    {
        let zip_file = std::fs::File::open(archive).map_err(|e| UpdaterError::io(archive, e))?;
        let mut zip = zip::ZipArchive::new(zip_file)?;

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| UpdaterError::UnsafeArchiveEntry(entry.name().to_string()))?;
            let out_path = into.join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&out_path).map_err(|e| UpdaterError::io(&out_path, e))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| UpdaterError::io(parent, e))?;
            }

            let mut out =
                std::fs::File::create(&out_path).map_err(|e| UpdaterError::io(&out_path, e))?;
            std::io::copy(&mut entry, &mut out).map_err(|e| UpdaterError::io(&out_path, e))?;
            debug!("Extracted {:?}", out_path);
        }
    }

    std::fs::remove_file(archive).map_err(|e| UpdaterError::io(archive, e))?;
    info!("Deployed {:?} into {:?}", archive, into);
    Ok(())
}
