pub mod app_state;
pub mod settings;

pub use app_state::AppState;
pub use settings::{
    default_base_dir, settings_path, AddonItemKind, AddonSettings, TrackedItem, UpdateChannel,
    UpdaterSettings,
};
