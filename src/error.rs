//! Error taxonomy for the diagnostics collector
//!
//! Every fatal condition the collector can hit maps to one variant here.
//! `main` renders them as a single `ERROR: <message>` line.

use std::path::PathBuf;

/// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum DiagError {
    #[error("required tool '{tool}' was not found")]
    MissingDependency { tool: String },

    #[error("required tools are missing: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),

    #[error("invalid save path: {}", .0.display())]
    InvalidSavePath(PathBuf),

    #[error("{0} is required in non-interactive mode")]
    MissingInput(&'static str),

    #[error("input closed while waiting for a selection")]
    InputClosed,

    #[error("no {product} releases found")]
    NoReleases { product: String },

    #[error("release selected is not {product}")]
    NotProduct { product: String },

    #[error("release record is missing {0}")]
    MissingField(&'static str),

    #[error("`{program} {args}` failed: {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        stderr: String,
    },

    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("interrupted")]
    Interrupted,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for collector operations
pub type DiagResult<T> = Result<T, DiagError>;
