mod commands;
pub mod core;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::core::downloader::TracingProgressListener;
use crate::core::error::UpdaterResult;
use crate::core::launch::ProcessRelauncher;
use crate::core::state::{
    default_base_dir, settings_path, AddonSettings, AppState, UpdateChannel, UpdaterSettings,
};
use crate::core::updater::UpdateOutcome;

pub use commands::{current_channel, run_update, update_addon};

/// Install the structured logging subscriber.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,launcher_updater=debug")),
        )
        .init();
}

/// Command-line overrides applied on top of the stored settings.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub base_dir: Option<PathBuf>,
    pub settings_file: Option<PathBuf>,
    pub channel: Option<UpdateChannel>,
    pub no_update: bool,
    pub addon_dir: Option<PathBuf>,
    pub skip_addon: bool,
}

impl RunOptions {
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(default_base_dir)
    }

    /// Stored settings with the command-line overrides applied.
    pub fn resolve_settings(&self) -> UpdaterSettings {
        let path = self
            .settings_file
            .clone()
            .unwrap_or_else(|| settings_path(&self.base_dir()));
        let mut settings = UpdaterSettings::load(&path);

        if let Some(channel) = self.channel {
            settings.channel = channel;
        }
        if let Some(addon_dir) = &self.addon_dir {
            match settings.addon.as_mut() {
                Some(addon) => addon.install_dir = addon_dir.clone(),
                None => settings.addon = Some(AddonSettings::new(addon_dir.clone())),
            }
        }

        settings
    }
}

/// Run the host pass and then the add-on pass.
///
/// Returns `UpdateOutcome::Relaunched` when the launcher binary was replaced;
/// the caller must exit straight away in that case.
pub fn run(options: &RunOptions) -> UpdaterResult<UpdateOutcome> {
    let settings = options.resolve_settings();
    let state = AppState::new(options.base_dir(), settings)?;
    let listener = TracingProgressListener;

    tracing::info!(
        "Launcher updater starting in {:?} (channel '{}')",
        state.base_dir,
        current_channel(&state.settings).as_str()
    );

    let outcome = if options.no_update {
        tracing::info!("Update check disabled");
        UpdateOutcome::Skipped
    } else {
        run_update(&state, &listener, &ProcessRelauncher)?
    };

    if outcome == UpdateOutcome::Relaunched {
        return Ok(outcome);
    }

    if !options.skip_addon {
        update_addon(&state, &listener)?;
    }

    Ok(outcome)
}
