use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

const APP_DIR_NAME: &str = "xlabs";
const DEFAULT_UPDATE_SERVER: &str = "https://master.xlabs.dev/";
const DEFAULT_HOST_BINARY: &str = "xlabs.exe";

const RAWFILES_RELEASE_API: &str =
    "https://api.github.com/repos/XLabsProject/iw4x-rawfiles/releases/latest";
const RAWFILES_DOWNLOAD_URL: &str =
    "https://github.com/XLabsProject/iw4x-rawfiles/releases/latest/download/release.zip";
const LIBRARY_RELEASE_API: &str =
    "https://api.github.com/repos/XLabsProject/iw4x-client/releases/latest";
const LIBRARY_DOWNLOAD_URL: &str =
    "https://github.com/XLabsProject/iw4x-client/releases/latest/download/iw4x.dll";

/// Which manifest and data folder the host pass reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateChannel {
    #[default]
    Main,
    Dev,
}

impl UpdateChannel {
    pub fn manifest_url(self, server: &str) -> String {
        match self {
            UpdateChannel::Main => format!("{}files.json", with_trailing_slash(server)),
            UpdateChannel::Dev => format!("{}files-dev.json", with_trailing_slash(server)),
        }
    }

    pub fn data_folder_url(self, server: &str) -> String {
        match self {
            UpdateChannel::Main => format!("{}data/", with_trailing_slash(server)),
            UpdateChannel::Dev => format!("{}data-dev/", with_trailing_slash(server)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateChannel::Main => "main",
            UpdateChannel::Dev => "dev",
        }
    }
}

impl std::str::FromStr for UpdateChannel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(UpdateChannel::Main),
            "dev" | "develop" => Ok(UpdateChannel::Dev),
            other => Err(format!("unknown update channel '{other}'")),
        }
    }
}

/// How a downloaded add-on item ends up in the install directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonItemKind {
    /// Zip archive, extracted into the add-on root and then removed.
    Archive,
    /// Single file, kept as downloaded.
    File,
}

/// One independently released piece of the add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedItem {
    /// Key of this item inside `.version.json`.
    pub version_key: String,
    /// Release endpoint returning `{"tag_name": ...}`.
    pub release_url: String,
    pub download_url: String,
    pub kind: AddonItemKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonSettings {
    pub install_dir: PathBuf,
    #[serde(default = "default_tracked_items")]
    pub items: Vec<TrackedItem>,
}

impl AddonSettings {
    pub fn new(install_dir: PathBuf) -> Self {
        Self {
            install_dir,
            items: default_tracked_items(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterSettings {
    pub channel: UpdateChannel,
    pub update_server: String,
    /// Manifest name of the launcher executable itself.
    pub host_binary: String,
    pub data_dir_name: String,
    pub protected_dirs: Vec<String>,
    /// Release builds check and replace the host binary; dev builds never do.
    pub maintenance_build: bool,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub dead_file_retry_ms: u64,
    pub addon: Option<AddonSettings>,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            channel: UpdateChannel::Main,
            update_server: DEFAULT_UPDATE_SERVER.to_string(),
            host_binary: DEFAULT_HOST_BINARY.to_string(),
            data_dir_name: "data".to_string(),
            protected_dirs: vec!["user".to_string(), "data".to_string()],
            maintenance_build: !cfg!(debug_assertions),
            connect_timeout_secs: 15,
            request_timeout_secs: 30 * 60,
            dead_file_retry_ms: 2_000,
            addon: None,
        }
    }
}

impl UpdaterSettings {
    /// Load settings from a JSON file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn manifest_url(&self) -> String {
        self.channel.manifest_url(&self.update_server)
    }

    pub fn data_folder_url(&self) -> String {
        self.channel.data_folder_url(&self.update_server)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dead_file_retry_delay(&self) -> Duration {
        Duration::from_millis(self.dead_file_retry_ms)
    }
}

pub fn default_tracked_items() -> Vec<TrackedItem> {
    vec![
        TrackedItem {
            version_key: "iw4x_version".into(),
            release_url: LIBRARY_RELEASE_API.into(),
            download_url: LIBRARY_DOWNLOAD_URL.into(),
            kind: AddonItemKind::File,
        },
        TrackedItem {
            version_key: "rawfile_version".into(),
            release_url: RAWFILES_RELEASE_API.into(),
            download_url: RAWFILES_DOWNLOAD_URL.into(),
            kind: AddonItemKind::Archive,
        },
    ]
}

/// Default installation root: `<local data dir>/xlabs`.
pub fn default_base_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn settings_path(base_dir: &Path) -> PathBuf {
    base_dir.join("user").join("updater_settings.json")
}

fn with_trailing_slash(server: &str) -> String {
    if server.ends_with('/') {
        server.to_string()
    } else {
        format!("{server}/")
    }
}
