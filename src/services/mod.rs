//! Service layer
//!
//! Collection logic and the staging area it writes into. Services talk to the
//! cluster only through [`crate::kube::CommandRunner`].

pub mod collector;
pub mod staging;

pub use collector::{CollectionReport, Collector, StepOutcome, StepStatus};
pub use staging::{ArchiveSummary, Staging};
