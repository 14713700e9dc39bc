//! Reading `debase.toml`.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::DriverConfig;

/// Name of the configuration file looked up in the output directory.
pub const CONFIG_FILE: &str = "debase.toml";

/// Reads and validates the configuration at `path`.
pub fn load_config(path: &Path) -> Result<DriverConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates configuration text. Every key is optional.
pub fn load_config_from_str(content: &str) -> Result<DriverConfig, ConfigError> {
    let config: DriverConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    check_values(&config)?;
    Ok(config)
}

/// Rejects values that parse but cannot drive a build.
fn check_values(config: &DriverConfig) -> Result<(), ConfigError> {
    if config.tools.debase.is_empty() {
        return Err(ConfigError::Missing("tools.debase"));
    }
    if config.tools.llc.is_empty() {
        return Err(ConfigError::Missing("tools.llc"));
    }
    if config.build.manifest.is_empty() {
        return Err(ConfigError::Missing("build.manifest"));
    }
    if config.lower.jobs == 0 {
        return Err(ConfigError::Invalid(
            "lower.jobs must be at least 1".to_string(),
        ));
    }
    Ok(())
}
