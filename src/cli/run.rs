//! Top-level run sequence
//!
//! dependency check → target and save path → staging → collection raced
//! against shutdown → archive.

use crate::cli::{Mode, Options, Prompter};
use crate::config::Config;
use crate::error::DiagError;
use crate::kube::CommandRunner;
use crate::kube::tools::{MissingPolicy, check_dependencies, required_tools};
use crate::services::{ArchiveSummary, Collector, Staging};
use anyhow::Result;
use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufRead;

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Dependency report printed, nothing collected
    Explained,
    /// Bundle written
    Collected(ArchiveSummary),
}

/// Run the collector
///
/// Once the staging area exists the bundle is always written, including when
/// collection fails or `shutdown` resolves first; the failure is returned
/// after archiving.
pub async fn run<R, W, S>(
    options: &Options,
    config: &Config,
    runner: &dyn CommandRunner,
    prompter: &mut Prompter<R, W>,
    shutdown: S,
) -> Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    let tools = required_tools(config);
    let mut stdout = std::io::stdout();

    if options.explain_only {
        match check_dependencies(runner, &tools, MissingPolicy::Collect, true, &mut stdout) {
            Ok(()) => println!("All required tools are installed"),
            Err(e) => println!("{}", e),
        }
        return Ok(Outcome::Explained);
    }

    check_dependencies(runner, &tools, options.missing_policy, false, &mut stdout)?;

    let target = options.target()?;
    let output = resolve_output_path(options, config, prompter).await?;
    validate_save_path(&output)?;

    let staging = Staging::create(&output)?;
    let collector = Collector::new(runner, config);

    let result = tokio::select! {
        biased;
        result = collector.run(&target, prompter, &staging) => result.map(|_| ()),
        _ = shutdown => {
            println!();
            tracing::warn!("Interrupted, packing what was collected so far");
            Err(DiagError::Interrupted.into())
        }
    };

    let summary = seal_after(staging, &result)?;
    println!("{}", summary.confirmation());

    result.map(|()| Outcome::Collected(summary))
}

/// Where the bundle goes: explicit flag, prompt, or the configured default
async fn resolve_output_path<R, W>(
    options: &Options,
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<PathBuf>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(path) = &options.output {
        return Ok(path.clone());
    }

    match options.mode {
        Mode::Interactive => prompter.ask_output_path(&config.default_output).await,
        Mode::NonInteractive => Ok(config.default_output.clone()),
    }
}

/// Archive the staging area after collection ended with `result`
///
/// A packing failure keeps the collection error in its message.
fn seal_after(staging: Staging, result: &Result<()>) -> Result<ArchiveSummary> {
    staging.seal().map_err(|e| match result {
        Err(cause) => {
            let cause = error_message(cause);
            tracing::error!("Collection failed before archiving: {}", cause);
            e.context(format!("collection had already failed: {}", cause))
        }
        Ok(()) => e,
    })
}

/// Check that the bundle can be created at `path`
///
/// The parent directory must exist, `path` must not be a directory, and the
/// file must be writable. A file created by the check is removed again.
pub fn validate_save_path(path: &Path) -> Result<(), DiagError> {
    let invalid = || DiagError::InvalidSavePath(path.to_path_buf());

    if path.file_name().is_none() || path.is_dir() {
        return Err(invalid());
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !parent.is_dir() {
        return Err(invalid());
    }

    let existed = path.exists();
    if let Err(e) = OpenOptions::new().write(true).create(true).open(path) {
        tracing::debug!("Cannot write {}: {}", path.display(), e);
        return Err(invalid());
    }
    if !existed {
        let _ = std::fs::remove_file(path);
    }

    Ok(())
}

/// Single-line message for a fatal error
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DiagError>() {
        Some(diag) => diag.to_string(),
        None => format!("{:#}", err),
    }
}
