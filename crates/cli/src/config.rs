use std::path::{Path, PathBuf};

use bug_warden_core::config::{load_bug_warden_config, BugWardenConfig};
use bug_warden_core::errors::ConfigLoadError;
use tracing::debug;

use crate::errors::CliError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "bug-warden.toml";

/// Get the path to the configuration file
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        // Look for config in current directory
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}

/// Loads the bug warden configuration used to resolve branch policies.
pub fn load_config(path: &Path) -> Result<BugWardenConfig, CliError> {
    debug!("Loading configuration from {:?}", path);

    load_bug_warden_config(path).map_err(|e| match e {
        ConfigLoadError::NotFound(p) => {
            CliError::ConfigError(format!("Configuration file not found: {}", p))
        }
        other => CliError::ConfigError(other.to_string()),
    })
}
