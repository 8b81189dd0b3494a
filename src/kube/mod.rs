//! Cluster tooling module
//!
//! Everything the collector learns about the cluster comes from running the
//! `kubectl` and `helm` binaries. This module owns that seam:
//! - [`CommandRunner`] abstracts process execution and binary lookup
//! - [`ProcessRunner`] is the real implementation backed by `tokio::process`
//! - submodules interpret the output of specific commands

pub mod inventory;
pub mod pods;
pub mod release;
pub mod tools;

use crate::error::{DiagError, DiagResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external binaries on behalf of the collector
///
/// Commands run one at a time and are never retried or timed out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and capture its output
    ///
    /// An `Err` means the process could not be started at all; a process that
    /// ran and exited non-zero is an `Ok` with `success == false`.
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;

    /// Resolve `program` to an executable path, if present
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        tracing::debug!("Running: {} {}", program, args.join(" "));

        // kill_on_drop: an interrupt drops the pipeline future mid-command
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        tracing::debug!(
            "{} exited with {} ({} bytes stdout, {} bytes stderr)",
            program,
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        find_executable(program, std::env::var_os("PATH").as_deref())
    }
}

/// Find `program` the way a shell would
///
/// Names containing a path separator are checked directly; bare names are
/// searched for in each `PATH` entry.
pub fn find_executable(program: &str, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    std::env::split_paths(path_var?)
        .flat_map(|dir| executable_names(program).map(move |name| dir.join(name)))
        .find(|path| is_executable(path))
}

#[cfg(windows)]
fn executable_names(program: &str) -> impl Iterator<Item = String> + '_ {
    ["", ".exe", ".cmd", ".bat"]
        .into_iter()
        .map(move |ext| format!("{}{}", program, ext))
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(program.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run a command whose failure is fatal and return its stdout
pub async fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> DiagResult<String> {
    let failed = |stderr: String| DiagError::CommandFailed {
        program: program.to_string(),
        args: args.join(" "),
        stderr,
    };

    let output = runner
        .run(program, args)
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !output.success {
        return Err(failed(output.stderr.trim().to_string()));
    }

    Ok(output.stdout)
}

/// Build an owned argument vector from string slices
pub fn args<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
