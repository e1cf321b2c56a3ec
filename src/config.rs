use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// Default directory name for digitrack data.
pub const DATA_DIR: &str = ".digitrack";
/// Default database filename.
const DB_FILE: &str = "digitrack.db";
/// Config filename.
const CONFIG_FILE: &str = "config.toml";
/// Persisted UI state filename.
const STATE_FILE: &str = "state.json";

/// Data-directory configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the data directory (`.digitrack/` by default).
    pub data_dir: PathBuf,
    /// Path to the `SQLite` database.
    pub db_path: PathBuf,
    /// Path to the config file.
    pub config_path: PathBuf,
    /// Path to the persisted state file.
    pub state_path: PathBuf,
    /// User settings loaded from config.toml.
    pub settings: UserSettings,
}

/// User-configurable settings from .digitrack/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Remote tracking service.
    pub service: ServiceSettings,
    /// Folder scanning.
    pub scan: ScanSettings,
    pub display: DisplaySettings,
    pub output: OutputSettings,
}

/// Connection settings for the remote tracking service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the REST API, e.g. `http://localhost:8000/api`.
    pub base_url: Option<String>,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

/// Folder scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Whether dot-files and dot-directories are tracked.
    pub scan_hidden: bool,
    /// Maximum file size in MB to track (larger files are skipped).
    pub max_file_size_mb: u64,
    /// Extensions never tracked, with or without the leading dot.
    pub exclude_extensions: Vec<String>,
    /// Whether to hash file contents to detect same-size, same-mtime edits.
    pub hash_files: bool,
    /// Minutes after which a project's last scan counts as stale on the
    /// dashboard. Clamped to 5..=1440.
    pub interval_minutes: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            scan_hidden: false,
            max_file_size_mb: 100,
            exclude_extensions: Vec::new(),
            hash_files: false,
            interval_minutes: 60,
        }
    }
}

/// Bounds accepted for [`ScanSettings::interval_minutes`].
pub const SCAN_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 5..=1440;

impl ScanSettings {
    /// The scan interval, clamped into [`SCAN_INTERVAL_RANGE`].
    #[must_use]
    pub fn scan_interval(&self) -> chrono::Duration {
        let minutes = self
            .interval_minutes
            .clamp(*SCAN_INTERVAL_RANGE.start(), *SCAN_INTERVAL_RANGE.end());
        chrono::Duration::minutes(minutes as i64)
    }

    /// Check if a file is too large to track.
    #[must_use]
    pub fn is_file_too_large(&self, size_bytes: u64) -> bool {
        let max_bytes = self.max_file_size_mb.saturating_mul(1024 * 1024);
        size_bytes > max_bytes
    }

    /// Check if a file's extension is excluded, ignoring case.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.exclude_extensions
            .iter()
            .any(|x| x.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Minutes east of UTC used to assign activity to calendar days.
    pub utc_offset_minutes: i32,
}

/// Output-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output format: "minified" (default) or "pretty".
    pub format: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "minified".into(),
        }
    }
}

impl OutputSettings {
    #[must_use]
    pub fn is_pretty(&self) -> bool {
        self.format == "pretty"
    }
}

impl Config {
    /// Create config rooted at a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let db_path = data_dir.join(DB_FILE);
        let config_path = data_dir.join(CONFIG_FILE);
        let state_path = data_dir.join(STATE_FILE);

        let settings = Self::load_settings(&config_path).unwrap_or_default();

        Self {
            data_dir,
            db_path,
            config_path,
            state_path,
            settings,
        }
    }

    /// Create config for `.digitrack/` under the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| TrackError::Config(format!("cannot get cwd: {e}")))?;
        Ok(Self::new(cwd.join(DATA_DIR)))
    }

    /// Load settings from config.toml if it exists and parses.
    fn load_settings(config_path: &Path) -> Option<UserSettings> {
        if !config_path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(config_path).ok()?;
        match toml::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("ignoring invalid {}: {e}", config_path.display());
                None
            }
        }
    }

    /// Save current settings to config.toml.
    pub fn save_settings(&self) -> Result<()> {
        self.ensure_data_dir()?;
        let content = toml::to_string_pretty(&self.settings)
            .map_err(|e| TrackError::Config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Base URL of the remote service, if one is configured.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        self.settings
            .service
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
    }
}
