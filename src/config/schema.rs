//! Configuration schema definitions
//!
//! Defines the structure of the optional configuration file using serde.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Substring a Helm chart identifier must contain to count as the product
    #[serde(default = "default_product")]
    pub product: String,

    /// Archive path used when no `-f`/`-o` flag is given
    #[serde(default = "default_output")]
    pub default_output: PathBuf,

    /// Seconds to wait before bulk collection starts
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,

    /// ConfigMap name suffixes (after `<release>-`) that are never collected
    #[serde(default = "default_sensitive_suffixes")]
    pub sensitive_config_map_suffixes: Vec<String>,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// External binaries the collector shells out to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    /// Binary name or path for the cluster client
    #[serde(default = "default_kubectl")]
    pub kubectl: String,

    /// Binary name or path for the release manager
    #[serde(default = "default_helm")]
    pub helm: String,
}

fn default_product() -> String {
    "fossa".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("./fossa-diag.tar.gz")
}

fn default_countdown_secs() -> u64 {
    15
}

fn default_sensitive_suffixes() -> Vec<String> {
    vec!["config".to_string(), "scotland-yard".to_string()]
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_helm() -> String {
    "helm".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            product: default_product(),
            default_output: default_output(),
            countdown_secs: default_countdown_secs(),
            sensitive_config_map_suffixes: default_sensitive_suffixes(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            kubectl: default_kubectl(),
            helm: default_helm(),
        }
    }
}
