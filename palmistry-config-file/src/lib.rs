use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PalmistryConfigToml {
    pub server: ServerSection,
    pub store: StoreSection,
    pub analysis: AnalysisSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
    /// Origin used when building `imageUrl`. Falls back to the request origin.
    pub public_base_url: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8512,
            public_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub path: PathBuf,
    pub ttl_secs: u64,
    pub max_items: usize,
    pub max_total_bytes: u64,
    pub max_image_bytes: u64,
    pub sweep_interval_secs: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: PathBuf::from("/tmp/palmistry"),
            ttl_secs: 5 * 60,
            max_items: 256,
            max_total_bytes: 256 * 1024 * 1024,
            max_image_bytes: 10 * 1024 * 1024,
            sweep_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitModeToml {
    UploadProxy,
    InlineDataUrl,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub api_url: String,
    pub timeout_secs: Option<u64>,
    pub submit_mode: SubmitModeToml,
    pub prepare: bool,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: None,
            submit_mode: SubmitModeToml::UploadProxy,
            prepare: true,
            max_dimension: 1600,
            jpeg_quality: 85,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    IO(std::io::Error),
    Toml(toml::de::Error),
    InvalidEnv { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IO(e) => write!(f, "failed to read config file: {e}"),
            ConfigError::Toml(e) => write!(f, "failed to parse config file: {e}"),
            ConfigError::InvalidEnv { key, value } => write!(f, "invalid value for {key}: {value}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl PalmistryConfigToml {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Reads `path` when given (a missing file is an error), otherwise
    /// `PALMISTRY_CONFIG` or `./palmistry.toml` when they exist, then
    /// applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os("PALMISTRY_CONFIG")
                .map(PathBuf::from)
                .or_else(|| {
                    let default = PathBuf::from("palmistry.toml");
                    default.exists().then_some(default)
                }),
        };

        let mut config = match path {
            Some(path) => {
                info!("loading config from {}", path.display());
                let s = std::fs::read_to_string(&path).map_err(ConfigError::IO)?;
                Self::from_toml_str(&s)?
            }
            None => {
                info!("no config file, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_env_overrides_with<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = var("PALMISTRY_API_URL").or_else(|| var("NEXT_PUBLIC_API_URL")) {
            self.analysis.api_url = api_url;
        }
        if let Some(port) = var("PALMISTRY_PORT") {
            self.server.port = port.parse().map_err(|_| {
                warn!("PALMISTRY_PORT is not a port number: {port}");
                ConfigError::InvalidEnv {
                    key: "PALMISTRY_PORT".to_string(),
                    value: port.clone(),
                }
            })?;
        }
        if let Some(public_base_url) = var("PALMISTRY_PUBLIC_BASE_URL") {
            self.server.public_base_url = Some(public_base_url);
        }
        Ok(())
    }
}
