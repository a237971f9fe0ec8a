use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use launcher_updater::core::state::UpdateChannel;
use launcher_updater::core::updater::UpdateOutcome;
use launcher_updater::{init_tracing, run, RunOptions};

#[derive(Debug, Parser)]
#[command(name = "launcher-updater", version, about = "Keeps the launcher and its add-on up to date")]
struct Cli {
    /// Installation root (defaults to the local data directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Update channel: main or dev
    #[arg(long)]
    channel: Option<UpdateChannel>,

    /// Skip the launcher update pass
    #[arg(long)]
    noupdate: bool,

    /// Add-on install directory; enables the add-on pass
    #[arg(long)]
    addon_dir: Option<PathBuf>,

    /// Skip the add-on pass
    #[arg(long)]
    skip_addon: bool,

    /// Settings file (defaults to <base-dir>/user/updater_settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let options = RunOptions {
        base_dir: cli.base_dir,
        settings_file: cli.settings,
        channel: cli.channel,
        no_update: cli.noupdate,
        addon_dir: cli.addon_dir,
        skip_addon: cli.skip_addon,
    };

    match run(&options) {
        Ok(UpdateOutcome::Relaunched) => {
            tracing::info!("Relaunched updated launcher, exiting");
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            tracing::info!("Update finished: {:?}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Update failed: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                tracing::error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
