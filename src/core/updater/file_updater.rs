use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::downloader::{Downloader, ProgressListener, WorkItem};
use crate::core::error::UpdaterResult;
use crate::core::integrity;
use crate::core::launch::Relauncher;
use crate::core::manifest::{fetch_manifest, FileRecord};
use crate::core::state::AppState;

use super::reconcile::DirectoryReconciler;
use super::self_update::{dead_file_path, delete_dead_file, SelfUpdateSequencer};

/// Result of a host update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing differed from the manifest (or the manifest was unavailable).
    UpToDate,
    /// The outdated files were replaced.
    Updated { files: usize },
    /// The launcher binary was replaced and a new process started. The current
    /// process must exit without running the rest of its startup.
    Relaunched,
    /// Updating was disabled for this run.
    Skipped,
}

/// Brings the launcher installation in line with the channel manifest.
pub struct FileUpdater<'a> {
    state: &'a AppState,
    listener: &'a dyn ProgressListener,
    relauncher: &'a dyn Relauncher,
    downloader: Downloader,
    dead_process_file: PathBuf,
}

impl<'a> FileUpdater<'a> {
    /// Create an updater. Removes a dead binary left over from a previous self-update.
    pub fn new(
        state: &'a AppState,
        listener: &'a dyn ProgressListener,
        relauncher: &'a dyn Relauncher,
    ) -> Self {
        let dead_process_file = dead_file_path(&state.process_file);
        delete_dead_file(&dead_process_file, state.settings.dead_file_retry_delay());

        Self {
            state,
            listener,
            relauncher,
            downloader: Downloader::new(state.transport.clone()),
            dead_process_file,
        }
    }

    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    /// Run a complete host pass: fetch, reconcile, resolve, self-update, download.
    pub fn run(&self) -> UpdaterResult<UpdateOutcome> {
        let files = fetch_manifest(
            self.downloader.transport(),
            &self.state.settings.manifest_url(),
        );
        if !files.is_empty() {
            self.cleanup_directories(&files);
        }

        let outdated = self.get_outdated_files(&files);
        if outdated.is_empty() {
            info!("Installation is up to date");
            return Ok(UpdateOutcome::UpToDate);
        }

        info!("{} of {} files are outdated", outdated.len(), files.len());

        if self.update_host_binary(&outdated)? {
            return Ok(UpdateOutcome::Relaunched);
        }

        self.update_files(&outdated)?;
        Ok(UpdateOutcome::Updated {
            files: outdated.len(),
        })
    }

    pub fn get_outdated_files(&self, files: &[FileRecord]) -> Vec<FileRecord> {
        files
            .iter()
            .filter(|file| self.is_outdated_file(file))
            .cloned()
            .collect()
    }

    /// Replace the launcher binary if it is part of `outdated_files`.
    ///
    /// Returns `true` once the new binary has been relaunched.
    pub fn update_host_binary(&self, outdated_files: &[FileRecord]) -> UpdaterResult<bool> {
        let Some(host_file) = outdated_files.iter().find(|file| self.is_host_binary(file)) else {
            return Ok(false);
        };

        let item = self.work_item(host_file);
        SelfUpdateSequencer::new(
            &self.downloader,
            self.relauncher,
            &self.state.process_file,
            &self.dead_process_file,
        )
        .run(&item, self.listener)?;

        Ok(true)
    }

    pub fn update_files(&self, outdated_files: &[FileRecord]) -> UpdaterResult<()> {
        let items: Vec<WorkItem> = outdated_files
            .iter()
            .map(|file| self.work_item(file))
            .collect();
        self.downloader.download_batch(&items, self.listener)
    }

    fn is_outdated_file(&self, file: &FileRecord) -> bool {
        if !self.state.settings.maintenance_build && self.is_host_binary(file) {
            return false;
        }

        let outdated = integrity::is_outdated(&self.drive_path(file), file);
        if outdated {
            debug!("Outdated: {}", file.name);
        }
        outdated
    }

    fn is_host_binary(&self, file: &FileRecord) -> bool {
        file.name == self.state.settings.host_binary
    }

    /// Local path a manifest record maps to.
    pub fn drive_path(&self, file: &FileRecord) -> PathBuf {
        if self.is_host_binary(file) {
            return self.state.process_file.clone();
        }

        self.state.data_dir().join(&file.name)
    }

    fn work_item(&self, file: &FileRecord) -> WorkItem {
        WorkItem::verified(
            file,
            &self.state.settings.data_folder_url(),
            self.drive_path(file),
        )
    }

    fn cleanup_directories(&self, files: &[FileRecord]) {
        let legal_files: Vec<PathBuf> = files
            .iter()
            .filter(|file| !self.is_host_binary(file))
            .map(|file| self.drive_path(file))
            .collect();

        DirectoryReconciler::new(
            self.state.base_dir.clone(),
            self.state.data_dir(),
            self.state.settings.protected_dirs.clone(),
            vec![
                self.state.process_file.clone(),
                self.dead_process_file.clone(),
            ],
        )
        .reconcile(&legal_files);
    }
}
