//! Configuration system for fossa-diag
//!
//! Runtime settings come from three layers: built-in defaults, an optional
//! YAML file in the user's config directory, and environment overrides.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, ToolsConfig};
