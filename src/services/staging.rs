//! Staging area and support bundle packing
//!
//! [`Staging`] owns the two process-private temporary directories:
//! - the staging directory, whose contents become the support bundle
//! - the scratch directory, for intermediate data that is never shipped
//!
//! The bundle is written exactly once, either by [`Staging::seal`] or, if the
//! guard is dropped unsealed (early return, panic unwind), by `Drop`.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Result of packing the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub bytes: u64,
}

impl ArchiveSummary {
    /// Confirmation line shown to the operator
    pub fn confirmation(&self) -> String {
        format!(
            "Diagnostics saved to {} ({})",
            self.path.display(),
            format_size(self.bytes)
        )
    }
}

/// Guard over the staging and scratch directories
pub struct Staging {
    /// `None` once the directory has been kept after a failed pack
    staging: Option<TempDir>,
    dir: PathBuf,
    scratch: TempDir,
    output: PathBuf,
    sealed: bool,
}

impl Staging {
    /// Create both directories; the bundle will be written to `output`
    pub fn create(output: impl Into<PathBuf>) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix("fossa-diag-")
            .tempdir()
            .context("Failed to create staging directory")?;
        let scratch = tempfile::Builder::new()
            .prefix("fossa-diag-scratch-")
            .tempdir()
            .context("Failed to create scratch directory")?;

        tracing::debug!(
            "Staging in {}, scratch in {}",
            staging.path().display(),
            scratch.path().display()
        );

        Ok(Self {
            dir: staging.path().to_path_buf(),
            staging: Some(staging),
            scratch,
            output: output.into(),
            sealed: false,
        })
    }

    /// Directory whose contents are archived
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory for data that is not archived
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Write a file into the staging directory
    ///
    /// `name` may contain subdirectories (e.g. `logs/pod.log`).
    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        write_file(self.dir(), name, contents.as_ref())
    }

    /// Write a file into the scratch directory
    pub fn write_scratch(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        write_file(self.scratch_dir(), name, contents.as_ref())
    }

    /// Pack the staging directory into the bundle and remove both directories
    ///
    /// If packing fails the staging directory is left on disk and the error
    /// names its location.
    pub fn seal(mut self) -> Result<ArchiveSummary> {
        self.finish()
    }

    fn finish(&mut self) -> Result<ArchiveSummary> {
        self.sealed = true;

        pack(&self.dir, &self.output).map_err(|e| match self.staging.take() {
            Some(staging) => {
                let kept = staging.keep();
                e.context(format!("collected files kept in {}", kept.display()))
            }
            None => e,
        })
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if self.sealed {
            return;
        }

        match self.finish() {
            Ok(summary) => eprintln!("{}", summary.confirmation()),
            Err(e) => tracing::error!("Failed to pack staging area: {:#}", e),
        }
    }
}

fn write_file(root: &Path, name: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Write `dir` as a gzip-compressed tarball at `output`
///
/// Entries are rooted under a single directory named after the archive.
pub fn pack(dir: &Path, output: &Path) -> Result<ArchiveSummary> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create archive {}", output.display()))?;

    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);
    builder
        .append_dir_all(archive_root(output), dir)
        .with_context(|| format!("Failed to add {} to archive", dir.display()))?;

    let encoder = builder.into_inner().context("Failed to finish tar stream")?;
    let file = encoder.finish().context("Failed to finish gzip stream")?;
    file.sync_all()
        .with_context(|| format!("Failed to flush archive {}", output.display()))?;

    let bytes = std::fs::metadata(output)
        .with_context(|| format!("Failed to stat archive {}", output.display()))?
        .len();

    Ok(ArchiveSummary {
        path: output.to_path_buf(),
        bytes,
    })
}

/// Top-level directory name inside the archive (`fossa-diag.tar.gz` → `fossa-diag`)
pub fn archive_root(output: &Path) -> String {
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let root = [".tar.gz", ".tgz", ".gz", ".tar"]
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(&file_name);

    if root.is_empty() {
        "fossa-diag".to_string()
    } else {
        root.to_string()
    }
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["KiB", "MiB", "GiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}
