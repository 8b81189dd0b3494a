//! Command-line flags and invocation options

use crate::error::{DiagError, DiagResult};
use crate::kube::tools::MissingPolicy;
use clap::{ArgAction, CommandFactory, Parser};
use std::path::PathBuf;

/// Environment variable forcing non-interactive mode
pub const NONINTERACTIVE_ENV: &str = "NONINTERACTIVE";

/// Environment variable that keeps checking after a missing dependency
pub const NO_EXIT_ON_MISSING_DEP_ENV: &str = "NO_EXIT_ON_MISSING_DEP";

/// Collect Kubernetes diagnostics for a FOSSA Helm release
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "fossa-diag", version)]
#[command(
    about = "Collects Kubernetes diagnostics for a FOSSA Helm release into a support tarball",
    long_about = None
)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Namespace the release is installed in
    #[arg(short = 'n', value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Helm release name
    #[arg(short = 'r', value_name = "RELEASE")]
    pub release: Option<String>,

    /// Save the archive to PATH without prompting
    #[arg(short = 'f', value_name = "PATH", conflicts_with = "output")]
    pub file: Option<PathBuf>,

    /// Save the archive to PATH without prompting (same as -f)
    #[arg(short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Check required tools, explain what is missing, and exit
    #[arg(short = 'R')]
    pub explain: bool,

    /// Enable debug logging
    #[arg(short = 'd')]
    pub debug: bool,

    /// Print help
    #[arg(short = 'h', action = ArgAction::SetTrue)]
    pub help: bool,
}

impl Args {
    /// Rendered help text
    pub fn help_text() -> String {
        Self::command().render_help().to_string()
    }
}

/// How missing inputs are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Missing inputs are prompted for
    Interactive,
    /// Missing inputs are fatal
    NonInteractive,
}

/// Which release to diagnose
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Release and namespace given on the command line
    Given { release: String, namespace: String },
    /// Pick from the product releases Helm knows about
    Choose,
}

/// Resolved invocation options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub release: Option<String>,
    pub namespace: Option<String>,
    pub output: Option<PathBuf>,
    pub debug: bool,
    pub explain_only: bool,
    pub mode: Mode,
    pub missing_policy: MissingPolicy,
}

impl Options {
    /// Resolve options from parsed flags and the process environment
    pub fn from_env(args: Args) -> Self {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve options using `lookup` to read environment variables
    ///
    /// Interactive unless both release and namespace were given or the
    /// non-interactive override is set.
    pub fn resolve<F>(args: Args, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let release = non_empty(args.release);
        let namespace = non_empty(args.namespace);

        let forced = lookup(NONINTERACTIVE_ENV).is_some_and(|v| is_truthy(&v));
        let mode = if forced || (release.is_some() && namespace.is_some()) {
            Mode::NonInteractive
        } else {
            Mode::Interactive
        };

        let keep_checking = lookup(NO_EXIT_ON_MISSING_DEP_ENV).is_some_and(|v| is_truthy(&v));
        let missing_policy = if args.explain || keep_checking {
            MissingPolicy::Collect
        } else {
            MissingPolicy::Abort
        };

        Self {
            release,
            namespace,
            output: args.file.or(args.output),
            debug: args.debug,
            explain_only: args.explain,
            mode,
            missing_policy,
        }
    }

    /// Decide which release to diagnose
    ///
    /// In non-interactive mode a missing release or namespace is fatal. In
    /// interactive mode a partial pair falls back to the selection menu.
    pub fn target(&self) -> DiagResult<Target> {
        match (&self.release, &self.namespace, self.mode) {
            (Some(release), Some(namespace), _) => Ok(Target::Given {
                release: release.clone(),
                namespace: namespace.clone(),
            }),
            (_, _, Mode::Interactive) => Ok(Target::Choose),
            (None, _, Mode::NonInteractive) => Err(DiagError::MissingInput("release name (-r)")),
            (Some(_), None, Mode::NonInteractive) => Err(DiagError::MissingInput("namespace (-n)")),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
