//! CLI handling module
//!
//! Argument parsing, interactive prompts, logging setup, and the top-level
//! run sequence.

pub mod args;
mod logging;
pub mod prompt;
pub mod run;

pub use args::{Args, Mode, Options, Target};
pub use logging::init_logging;
pub use prompt::Prompter;
pub use run::{Outcome, run};
