// ─── Relaunch ───
// Starts the freshly replaced launcher binary with this process's invocation context.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;

use crate::core::error::{UpdaterError, UpdaterResult};

/// Starts a new launcher process after its binary has been replaced.
pub trait Relauncher: Send + Sync {
    fn relaunch(&self, binary: &Path) -> UpdaterResult<()>;
}

/// Spawns `binary` with the current command-line arguments and working directory.
///
/// Returns immediately after spawning; the caller is expected to exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRelauncher;

impl Relauncher for ProcessRelauncher {
    fn relaunch(&self, binary: &Path) -> UpdaterResult<()> {
        let mut cmd = Command::new(binary);
        cmd.args(std::env::args_os().skip(1));
        if let Ok(cwd) = std::env::current_dir() {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());

        let child = cmd.spawn().map_err(|source| UpdaterError::Relaunch {
            path: binary.to_path_buf(),
            source,
        })?;

        info!("Relaunched {:?} as pid {}", binary, child.id());
        Ok(())
    }
}
