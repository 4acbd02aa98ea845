//! Configuration loader with environment variable expansion

use super::{expand_env_vars, Config, ConfigError};
use std::path::Path;

/// Matches `${VAR}` and `${VAR:-default}`
pub(crate) const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text after expanding `${VAR}` references
    pub fn from_yaml(content: &str) -> Result<Config, ConfigError> {
        let re = regex_lite::Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        let expanded = expand_env_vars(content, &re);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }
}
