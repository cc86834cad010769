//! Top-level configuration and validation

use crate::components::{BuildConfig, ContentConfig, EnrichmentConfig, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a config file
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not name a supported format
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The file could not be deserialized
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        /// Format that was attempted
        format: &'static str,
        /// Deserializer message
        message: String,
    },

    /// An exclusion glob failed to compile
    #[error("Invalid exclusion pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// A value is out of range or empty
    #[error("Invalid value for {field}: {message}")]
    Invalid {
        /// Dotted field name
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Complete garden configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// Note discovery
    pub content: ContentConfig,
    /// Build output and policy
    pub build: BuildConfig,
    /// Edit-history collection
    pub enrichment: EnrichmentConfig,
    /// Log output
    pub logging: LoggingConfig,
}

impl GardenConfig {
    /// Check value ranges and compile patterns once to surface errors early
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.index_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "content.index_name",
                message: "must not be empty".to_string(),
            });
        }
        if self.content.extensions.is_empty() {
            return Err(ConfigError::Invalid {
                field: "content.extensions",
                message: "at least one note extension is required".to_string(),
            });
        }
        if self.build.parse_workers == 0 {
            return Err(ConfigError::Invalid {
                field: "build.parse_workers",
                message: "must be at least 1".to_string(),
            });
        }
        if self.enrichment.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                field: "enrichment.max_concurrent",
                message: "must be at least 1".to_string(),
            });
        }
        if self.enrichment.quiescence_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "enrichment.quiescence_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        self.content.exclusion_matcher()?;
        Ok(())
    }

    /// Resolve relative paths against `base` (normally the config file's directory)
    pub fn resolve_paths(&mut self, base: &Path) {
        fn rebase(path: &mut PathBuf, base: &Path) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }

        rebase(&mut self.content.root, base);
        rebase(&mut self.build.output, base);
        if let Some(bib) = self.build.bibliography.as_mut() {
            rebase(bib, base);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        GardenConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = GardenConfig::default();
        config.build.parse_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("build.parse_workers"));
    }

    #[test]
    fn test_empty_index_name_rejected() {
        let mut config = GardenConfig::default();
        config.content.index_name = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "content.index_name",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_glob_rejected() {
        let mut config = GardenConfig::default();
        config.content.exclude = vec!["[unclosed".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_resolve_paths_only_touches_relative() {
        let mut config = GardenConfig::default();
        config.build.output = PathBuf::from("/abs/out");
        config.build.bibliography = Some(PathBuf::from("refs.json"));
        config.resolve_paths(Path::new("/site"));

        assert_eq!(config.content.root, PathBuf::from("/site/content"));
        assert_eq!(config.build.output, PathBuf::from("/abs/out"));
        assert_eq!(
            config.build.bibliography,
            Some(PathBuf::from("/site/refs.json"))
        );
    }
}
