//! Configuration file loading
//!
//! The format is chosen from the file extension. Relative paths inside the
//! file are resolved against the file's own directory so a build behaves the
//! same regardless of the working directory it was started from.

use crate::{ConfigError, GardenConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "garden.toml";

/// Supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (`.toml`)
    Toml,
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// JSON (`.json`)
    Json,
}

impl ConfigFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

/// Loads [`GardenConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, resolve and validate a config file
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<GardenConfig, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::from_str(&content, format)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.resolve_paths(&base);
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load an explicit file, or `garden.toml` from the working directory,
    /// or fall back to defaults when neither exists
    pub async fn load(explicit: Option<&Path>) -> Result<GardenConfig, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).await;
        }

        let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Self::load_from_file(&candidate).await;
        }

        debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
        let config = GardenConfig::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text without touching the filesystem
    pub fn from_str(content: &str, format: ConfigFormat) -> Result<GardenConfig, ConfigError> {
        match format {
            ConfigFormat::Toml => Self::parse_toml(content),
            ConfigFormat::Yaml => Self::parse_yaml(content),
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                    format: "JSON",
                    message: e.to_string(),
                })
            }
        }
    }

    #[cfg(feature = "toml")]
    fn parse_toml(content: &str) -> Result<GardenConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            format: "TOML",
            message: e.to_string(),
        })
    }

    #[cfg(not(feature = "toml"))]
    fn parse_toml(_content: &str) -> Result<GardenConfig, ConfigError> {
        Err(ConfigError::UnsupportedFormat("toml".to_string()))
    }

    #[cfg(feature = "yaml")]
    fn parse_yaml(content: &str) -> Result<GardenConfig, ConfigError> {
        if content.trim().is_empty() {
            return Ok(GardenConfig::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            format: "YAML",
            message: e.to_string(),
        })
    }

    #[cfg(not(feature = "yaml"))]
    fn parse_yaml(_content: &str) -> Result<GardenConfig, ConfigError> {
        Err(ConfigError::UnsupportedFormat("yaml".to_string()))
    }
}
