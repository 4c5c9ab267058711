//! Renderer configuration, loadable from TOML
//!
//! ```toml
//! fan_out = true
//!
//! [cache]
//! capacity = 512
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Template cache settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of template shapes kept; unbounded when absent
    pub capacity: Option<usize>,
}

/// Configuration for a [`Renderer`](crate::Renderer)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub cache: CacheConfig,
    /// Resolve siblings concurrently in the async engine
    pub fan_out: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            fan_out: true,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the template cache, evicting least recently used shapes
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache.capacity = Some(capacity);
        self
    }

    /// Enable or disable concurrent sibling resolution
    pub fn with_fan_out(mut self, fan_out: bool) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(config.fan_out);
        assert_eq!(config.cache.capacity, None);
        assert_eq!(RenderConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_parse_toml() {
        let config = RenderConfig::from_toml_str(
            r#"
            fan_out = false

            [cache]
            capacity = 64
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            RenderConfig::new().with_fan_out(false).with_cache_capacity(64)
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = RenderConfig::from_toml_str("fanout = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RenderConfig::from_file("/nonexistent/markup-weave.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
