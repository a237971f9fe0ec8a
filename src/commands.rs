use tracing::{info, warn};

use crate::core::addon::{AddonOutcome, AddonTracker};
use crate::core::downloader::{Downloader, ProgressListener};
use crate::core::error::UpdaterResult;
use crate::core::launch::Relauncher;
use crate::core::state::{AppState, UpdateChannel, UpdaterSettings};
use crate::core::updater::{FileUpdater, UpdateOutcome};

/// Host pass: bring the launcher installation in line with the channel manifest.
pub fn run_update(
    state: &AppState,
    listener: &dyn ProgressListener,
    relauncher: &dyn Relauncher,
) -> UpdaterResult<UpdateOutcome> {
    info!(
        "Checking for launcher updates on channel '{}'",
        current_channel(&state.settings).as_str()
    );
    FileUpdater::new(state, listener, relauncher).run()
}

/// Add-on pass. `None` when no add-on is configured.
pub fn update_addon(
    state: &AppState,
    listener: &dyn ProgressListener,
) -> UpdaterResult<Option<AddonOutcome>> {
    let Some(addon) = state.settings.addon.as_ref() else {
        return Ok(None);
    };

    if addon.items.is_empty() {
        warn!("Add-on at {:?} tracks no items", addon.install_dir);
    }

    AddonTracker::new(addon, Downloader::new(state.transport.clone()))
        .update_if_necessary(listener)
        .map(Some)
}

pub fn current_channel(settings: &UpdaterSettings) -> UpdateChannel {
    settings.channel
}
