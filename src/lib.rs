//! fossa-diag library
//!
//! Core functionality of the `fossa-diag` support bundle collector. The
//! binary is a thin wrapper; everything here is usable from tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod kube;
pub mod services;

// Re-export commonly used types for convenience
pub use error::{DiagError, DiagResult};
pub use kube::inventory::{Denylist, ObjectRef, is_sensitive, parse_manifest};
pub use kube::release::{HelmRelease, ReleaseDescriptor, chart_version};
pub use kube::{CommandOutput, CommandRunner, ProcessRunner};
pub use services::{ArchiveSummary, Staging};
