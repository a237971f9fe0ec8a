use std::path::PathBuf;
use std::sync::Arc;

use reqwest::blocking::Client;

use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::http::{build_http_client, Transport};

use super::settings::UpdaterSettings;

/// Everything an update pass needs, built once at startup and passed down explicitly.
pub struct AppState {
    pub base_dir: PathBuf,
    /// Path of the running launcher executable.
    pub process_file: PathBuf,
    pub settings: UpdaterSettings,
    pub transport: Arc<dyn Transport>,
}

impl AppState {
    pub fn new(base_dir: PathBuf, settings: UpdaterSettings) -> UpdaterResult<Self> {
        let process_file = std::env::current_exe()
            .map_err(|source| UpdaterError::io(PathBuf::from("<current exe>"), source))?;
        let http_client: Client =
            build_http_client(settings.connect_timeout(), settings.request_timeout())?;

        Ok(Self {
            base_dir,
            process_file,
            settings,
            transport: Arc::new(http_client),
        })
    }

    /// Build a state around an arbitrary transport and binary path.
    pub fn with_transport(
        base_dir: PathBuf,
        process_file: PathBuf,
        settings: UpdaterSettings,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_dir,
            process_file,
            settings,
            transport,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(&self.settings.data_dir_name)
    }
}
