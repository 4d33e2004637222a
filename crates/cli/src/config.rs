//! CLI settings and data directory

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use eventdesk_http::client::DEFAULT_REFRESH_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file looked up in the data directory when `--config` is not given
pub const SETTINGS_FILE: &str = "eventdesk.toml";

const DEFAULT_BASE_URL: &str = "http://localhost:4000";
/// Requests wait indefinitely unless a timeout is configured
const DEFAULT_TIMEOUT_SECS: u64 = 0;
const DEFAULT_BUCKET: &str = "posters";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
}

/// Events API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,

    /// Refresh endpoint, relative to `base_url` or absolute
    pub refresh_path: String,

    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
}

/// Poster object storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub url: Option<String>,
    pub bucket: String,
    pub api_key: Option<String>,
}

impl Settings {
    /// Load settings from defaults, the settings file and `EVENTDESK_*`
    /// environment variables, in increasing priority.
    ///
    /// An explicit `config_file` must exist. Without one the settings file in
    /// `data_dir` is read if present.
    pub fn load(config_file: Option<&Path>, data_dir: &Path) -> Result<Self> {
        Self::load_with_env(config_file, data_dir, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("EVENTDESK")
            .prefix_separator("_")
            .separator("__")
    }

    fn load_with_env(
        config_file: Option<&Path>,
        data_dir: &Path,
        environment: Environment,
    ) -> Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (data_dir.join(SETTINGS_FILE), false),
        };

        let settings = Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.refresh_path", DEFAULT_REFRESH_PATH)?
            .set_default("api.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("storage.bucket", DEFAULT_BUCKET)?
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        Ok(settings.try_deserialize()?)
    }
}

/// Data directory: the explicit flag, then `EVENTDESK_STATE_DIR`, then the
/// platform data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        if let Ok(dir) = std::env::var("EVENTDESK_STATE_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("eventdesk")
        }
    })
}
