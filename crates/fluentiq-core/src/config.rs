use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub export: ExportConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/fluentiq/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.upload.validate()?;
        Ok(config)
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fluentiq")
            .join("config.toml")
    }

    /// Data directory for the last-result slot and shell history.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("fluentiq")
        })
    }
}

/// Remote analysis/history service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the analysis backend.
    pub base_url: String,
    /// Asset kind segment of `POST /analyze/<asset-kind>`.
    pub asset_kind: String,
    /// Timeout for history fetches. Uploads are governed by `[upload]`.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            asset_kind: "audio".into(),
            request_timeout_secs: 30,
        }
    }
}

/// Progress mapping for upload jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Percent reached when all bytes are on the wire.
    pub upload_ceiling: u8,
    /// Heuristic ticker period while awaiting the analysis result.
    pub tick_interval_ms: u64,
    /// Percent added per tick.
    pub tick_step: u8,
    /// The ticker never goes past this.
    pub tick_ceiling: u8,
    /// Percent shown when the transport cannot report a byte total.
    pub unknown_length_percent: u8,
    /// Give up waiting for the analysis result after this many seconds.
    /// 0 waits forever.
    pub result_timeout_secs: u64,
    /// Bytes per body chunk handed to the transport.
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_ceiling: 80,
            tick_interval_ms: 700,
            tick_step: 3,
            tick_ceiling: 96,
            unknown_length_percent: 20,
            result_timeout_secs: 300,
            chunk_size: 64 * 1024,
        }
    }
}

impl UploadConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn result_timeout(&self) -> Option<Duration> {
        (self.result_timeout_secs > 0).then(|| Duration::from_secs(self.result_timeout_secs))
    }

    /// Percent bands must be ordered and stay below 100, which is reserved
    /// for success.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.unknown_length_percent > self.upload_ceiling {
            anyhow::bail!("upload.unknown_length_percent must not exceed upload.upload_ceiling");
        }
        if self.upload_ceiling > self.tick_ceiling || self.tick_ceiling >= 100 {
            anyhow::bail!("upload ceilings must satisfy upload_ceiling <= tick_ceiling < 100");
        }
        if self.tick_interval_ms == 0 {
            anyhow::bail!("upload.tick_interval_ms must be greater than zero");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("upload.chunk_size must be greater than zero");
        }
        Ok(())
    }
}

/// Export artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory artifacts are written to (None = current directory).
    pub output_dir: Option<PathBuf>,
    /// Product prefix used in artifact filenames.
    pub product: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            product: "fluentiq".into(),
        }
    }
}

impl ExportConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}
