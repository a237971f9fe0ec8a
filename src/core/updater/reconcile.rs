// ─── Reconcile ───
// Removes installation entries the manifest no longer declares.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Best-effort cleanup of the installation tree.
///
/// Every removal failure is swallowed: the download pass overwrites by path anyway.
pub struct DirectoryReconciler {
    base_dir: PathBuf,
    data_dir: PathBuf,
    protected_dirs: Vec<String>,
    /// Root-level files that must survive, e.g. the running binary.
    preserved: Vec<PathBuf>,
}

impl DirectoryReconciler {
    pub fn new(
        base_dir: PathBuf,
        data_dir: PathBuf,
        protected_dirs: Vec<String>,
        preserved: Vec<PathBuf>,
    ) -> Self {
        Self {
            base_dir,
            data_dir,
            protected_dirs,
            preserved: preserved.iter().map(|p| absolute(p)).collect(),
        }
    }

    /// Clean the root, then the data directory.
    ///
    /// `legal_files` are the on-disk paths of the manifest's data files.
    pub fn reconcile(&self, legal_files: &[PathBuf]) {
        if !self.base_dir.is_dir() {
            return;
        }

        self.cleanup_root_directory();
        self.cleanup_data_directory(legal_files);
    }

    fn cleanup_root_directory(&self) {
        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list {:?}: {}", self.base_dir, e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if is_dir
                && self
                    .protected_dirs
                    .iter()
                    .any(|protected| name.to_str() == Some(protected.as_str()))
            {
                continue;
            }

            if self.preserved.contains(&absolute(&path)) {
                continue;
            }

            remove_entry(&path);
        }
    }

    fn cleanup_data_directory(&self, legal_files: &[PathBuf]) {
        if !self.data_dir.is_dir() {
            return;
        }

        let legal_files: Vec<PathBuf> = legal_files.iter().map(|p| absolute(p)).collect();

        let existing: Vec<(PathBuf, bool, bool)> = WalkDir::new(&self.data_dir)
            .min_depth(1)
            .into_iter()
            .flatten()
            .map(|entry| {
                let file_type = entry.file_type();
                (
                    entry.into_path(),
                    file_type.is_file(),
                    file_type.is_dir(),
                )
            })
            .collect();

        for (path, is_file, is_dir) in existing {
            // Already gone with a removed parent.
            if std::fs::symlink_metadata(&path).is_err() {
                continue;
            }

            let candidate = absolute(&path);
            let is_legal = legal_files.iter().any(|legal| {
                (is_dir && is_inside_folder(legal, &candidate)) || (is_file && *legal == candidate)
            });

            if !is_legal {
                remove_entry(&path);
            }
        }
    }
}

/// Lexical containment: `file` lies somewhere below `folder`.
pub fn is_inside_folder(file: &Path, folder: &Path) -> bool {
    file != folder && file.starts_with(folder)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn remove_entry(path: &Path) {
    let result = match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => debug!("Removed stale entry {:?}", path),
        Err(e) => debug!("Could not remove {:?}: {}", path, e),
    }
}
