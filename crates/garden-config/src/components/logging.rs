//! Logging configuration

use serde::{Deserialize, Serialize};

/// Logging configuration consumed by the CLI when it installs a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter (`off`, `error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,

    /// Emit ANSI colors
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}
