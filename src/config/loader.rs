//! Configuration loading and merging logic
//!
//! Handles loading configuration from the optional config file and
//! environment overrides, on top of built-in defaults.

use super::{defaults, paths, schema::Config};
use crate::error::DiagError;
use anyhow::{Context, Result};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Config file
    /// 3. Built-in defaults
    pub fn load() -> Result<Config> {
        let mut config = Self::load_defaults();

        let path = paths::config_path();
        if path.exists() {
            config = Self::load_file(&path)?;
            tracing::debug!("Loaded configuration from {}", path.display());
        }

        Self::apply_env_overrides(config)
    }

    /// Load configuration from a file
    ///
    /// Keys missing from the file fall back to their defaults.
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
            DiagError::Config(format!("{}: {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides from the process environment
    fn apply_env_overrides(config: Config) -> Result<Config> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables
    pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(product) = lookup("FOSSA_DIAG_PRODUCT") {
            config.product = product;
        }

        if let Some(countdown) = lookup("FOSSA_DIAG_COUNTDOWN") {
            config.countdown_secs = countdown.trim().parse().map_err(|_| {
                DiagError::Config(format!(
                    "FOSSA_DIAG_COUNTDOWN must be a number of seconds, got '{}'",
                    countdown
                ))
            })?;
        }

        if let Some(kubectl) = lookup("FOSSA_DIAG_KUBECTL") {
            config.tools.kubectl = kubectl;
        }

        if let Some(helm) = lookup("FOSSA_DIAG_HELM") {
            config.tools.helm = helm;
        }

        if config.product.trim().is_empty() {
            return Err(DiagError::Config("product must not be empty".to_string()).into());
        }

        Ok(config)
    }
}
