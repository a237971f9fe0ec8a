pub mod file_updater;
pub mod reconcile;
pub mod self_update;

pub use file_updater::{FileUpdater, UpdateOutcome};
pub use reconcile::DirectoryReconciler;
pub use self_update::{dead_file_path, delete_dead_file, HostSwap, SelfUpdateSequencer, SwapState};
