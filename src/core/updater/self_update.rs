// ─── Self Update ───
// Replaces the running launcher binary: move aside, download in place, then
// relaunch or roll back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::core::downloader::{Downloader, ProgressListener, WorkItem};
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::launch::Relauncher;

const DEAD_FILE_SUFFIX: &str = ".old";
const DEAD_FILE_REMOVE_ATTEMPTS: usize = 4;

/// Where the running binary sits while its replacement is downloaded.
pub fn dead_file_path(process_file: &Path) -> PathBuf {
    let mut name = process_file.as_os_str().to_os_string();
    name.push(DEAD_FILE_SUFFIX);
    PathBuf::from(name)
}

/// Remove a dead binary left behind by a previous update.
///
/// The previous process may still be exiting and holding the file, so removal is
/// retried a few times. Giving up is not an error.
pub fn delete_dead_file(dead_file: &Path, retry_delay: Duration) {
    for attempt in 1..=DEAD_FILE_REMOVE_ATTEMPTS {
        let _ = std::fs::remove_file(dead_file);
        if std::fs::symlink_metadata(dead_file).is_err() {
            return;
        }

        debug!(
            "Dead binary {:?} still present (attempt {}/{})",
            dead_file, attempt, DEAD_FILE_REMOVE_ATTEMPTS
        );
        if attempt < DEAD_FILE_REMOVE_ATTEMPTS {
            std::thread::sleep(retry_delay);
        }
    }
}

/// Where the host binary is in the replacement sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    Running,
    MovedAside,
    Replaced,
    Relaunched,
    RolledBack,
}

/// Scoped ownership of the moved-aside binary.
///
/// While in `MovedAside`, dropping the guard renames the dead file back over the
/// canonical path, so any error propagated out of the sequence restores the
/// original binary.
pub struct HostSwap<'a> {
    process_file: &'a Path,
    dead_file: &'a Path,
    state: SwapState,
}

impl<'a> HostSwap<'a> {
    pub fn new(process_file: &'a Path, dead_file: &'a Path) -> Self {
        Self {
            process_file,
            dead_file,
            state: SwapState::Running,
        }
    }

    /// Rename the running binary to the dead file. Only valid from `Running`.
    pub fn move_aside(&mut self) -> UpdaterResult<()> {
        if self.state != SwapState::Running {
            return Err(UpdaterError::Other(format!(
                "cannot move {:?} aside in state {:?}",
                self.process_file, self.state
            )));
        }

        std::fs::rename(self.process_file, self.dead_file)
            .map_err(|e| UpdaterError::io(self.process_file, e))?;
        self.state = SwapState::MovedAside;
        debug!("Moved {:?} aside to {:?}", self.process_file, self.dead_file);
        Ok(())
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    fn mark_replaced(&mut self) {
        self.state = SwapState::Replaced;
    }

    fn mark_relaunched(&mut self) {
        self.state = SwapState::Relaunched;
    }

    fn roll_back(&mut self) {
        match std::fs::rename(self.dead_file, self.process_file) {
            Ok(()) => {
                self.state = SwapState::RolledBack;
                info!("Restored original binary at {:?}", self.process_file);
            }
            Err(e) => error!(
                "Failed to restore {:?} from {:?}: {}",
                self.process_file, self.dead_file, e
            ),
        }
    }
}

impl Drop for HostSwap<'_> {
    fn drop(&mut self) {
        if self.state == SwapState::MovedAside {
            self.roll_back();
        }
    }
}

/// Drives the host binary through move-aside, replace and relaunch.
pub struct SelfUpdateSequencer<'a> {
    downloader: &'a Downloader,
    relauncher: &'a dyn Relauncher,
    process_file: &'a Path,
    dead_file: &'a Path,
}

impl<'a> SelfUpdateSequencer<'a> {
    pub fn new(
        downloader: &'a Downloader,
        relauncher: &'a dyn Relauncher,
        process_file: &'a Path,
        dead_file: &'a Path,
    ) -> Self {
        Self {
            downloader,
            relauncher,
            process_file,
            dead_file,
        }
    }

    /// Replace the running binary with `item` and relaunch it.
    ///
    /// `item.dest` must be the process file. On success the state is
    /// `Relaunched` and the caller must not continue its normal startup. On
    /// failure before the replacement is complete the original binary is back
    /// in place and the error is returned.
    pub fn run(&self, item: &WorkItem, listener: &dyn ProgressListener) -> UpdaterResult<SwapState> {
        debug_assert_eq!(item.dest, self.process_file);
        info!("Updating launcher binary {:?}", self.process_file);

        let mut swap = HostSwap::new(self.process_file, self.dead_file);
        swap.move_aside()?;

        self.downloader
            .download_batch(std::slice::from_ref(item), listener)?;
        carry_permissions(self.dead_file, self.process_file)?;
        swap.mark_replaced();

        self.relauncher.relaunch(self.process_file)?;
        swap.mark_relaunched();

        Ok(swap.state())
    }
}

fn carry_permissions(from: &Path, to: &Path) -> UpdaterResult<()> {
    let permissions = std::fs::metadata(from)
        .map_err(|e| UpdaterError::io(from, e))?
        .permissions();
    std::fs::set_permissions(to, permissions).map_err(|e| UpdaterError::io(to, e))
}
