use serde::{Deserialize, Serialize};

use crate::error::{ConductorError, Result};

/// Host-facing runtime configuration, fixed for the life of the [`App`].
///
/// [`App`]: crate::app::App
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Emit an info event with the elapsed startup time once the init pass
    /// completes.
    pub log_startup_timing: bool,
    /// Emit a debug event per controller as the init pass walks the
    /// resolved order.
    pub log_init_sequence: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_startup_timing: true,
            log_init_sequence: false,
        }
    }
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConductorError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConductorError::Config(e.to_string()))?;
        Self::from_json_str(&raw)
    }
}
