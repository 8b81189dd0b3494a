//! Interactive prompts
//!
//! Input is read asynchronously so an interrupt can cancel a pending prompt.

use crate::error::DiagError;
use crate::kube::release::{HelmRelease, render_menu};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Prompts the operator for missing inputs
pub struct Prompter<R, W> {
    input: R,
    output: W,
    prompts: usize,
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            prompts: 0,
        }
    }

    /// Number of prompts shown so far
    pub fn prompts_shown(&self) -> usize {
        self.prompts
    }

    /// Give back the output writer
    pub fn into_output(self) -> W {
        self.output
    }

    /// Show `question` and read one line; `None` at end of input
    async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        self.prompts += 1;
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .await
            .context("Failed to read from standard input")?;

        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Let the operator pick one release; returns its index in `releases`
    ///
    /// Re-prompts until the answer is a number in `1..=releases.len()`.
    pub async fn choose_release(&mut self, releases: &[HelmRelease]) -> Result<usize> {
        writeln!(self.output, "Available releases:")?;
        write!(self.output, "{}", render_menu(releases))?;

        let question = format!("Select a release [1-{}]: ", releases.len());
        loop {
            let Some(answer) = self.ask(&question).await? else {
                return Err(DiagError::InputClosed.into());
            };

            match parse_selection(&answer, releases.len()) {
                Some(idx) => return Ok(idx),
                None => writeln!(
                    self.output,
                    "Invalid selection '{}': enter a number between 1 and {}",
                    answer,
                    releases.len()
                )?,
            }
        }
    }

    /// Ask where to save the bundle; an empty answer keeps `default`
    pub async fn ask_output_path(&mut self, default: &Path) -> Result<PathBuf> {
        let question = format!("Save diagnostics to [{}]: ", default.display());
        match self.ask(&question).await? {
            Some(answer) if !answer.is_empty() => Ok(PathBuf::from(answer)),
            Some(_) => Ok(default.to_path_buf()),
            None => Err(DiagError::InputClosed.into()),
        }
    }
}

/// Parse a 1-based menu answer into a 0-based index
pub fn parse_selection(answer: &str, len: usize) -> Option<usize> {
    let choice: usize = answer.trim().parse().ok()?;
    (1..=len).contains(&choice).then(|| choice - 1)
}
