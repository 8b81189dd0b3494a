//! Dependency check for the external tools the collector needs

use super::CommandRunner;
use crate::config::Config;
use crate::error::{DiagError, DiagResult};
use std::io::Write;

/// An external binary the collector cannot work without
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredTool {
    /// Binary name or path
    pub name: String,
    /// What the collector uses it for
    pub purpose: &'static str,
    /// Where to get it
    pub install_url: &'static str,
}

/// What to do when a tool is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Fail on the first missing tool
    Abort,
    /// Check every tool, then fail if any was missing
    Collect,
}

/// The tools required with the given configuration
pub fn required_tools(config: &Config) -> Vec<RequiredTool> {
    vec![
        RequiredTool {
            name: config.tools.kubectl.clone(),
            purpose: "query cluster objects, events, and logs",
            install_url: "https://kubernetes.io/docs/tasks/tools/",
        },
        RequiredTool {
            name: config.tools.helm.clone(),
            purpose: "discover releases and render manifests",
            install_url: "https://helm.sh/docs/intro/install/",
        },
    ]
}

/// Check that every tool is present
///
/// Missing tools are reported to `out` with their purpose and install URL.
/// When `report_found` is set, present tools are reported as well.
pub fn check_dependencies(
    runner: &dyn CommandRunner,
    tools: &[RequiredTool],
    policy: MissingPolicy,
    report_found: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut missing = Vec::new();

    for tool in tools {
        match runner.locate(&tool.name) {
            Some(path) => {
                tracing::debug!("Found {} at {}", tool.name, path.display());
                if report_found {
                    writeln!(out, "Found {} at {}", tool.name, path.display())?;
                }
            }
            None => {
                writeln!(out, "Missing dependency: {}", tool.name)?;
                writeln!(out, "  Purpose: {}", tool.purpose)?;
                writeln!(out, "  Install: {}", tool.install_url)?;

                if policy == MissingPolicy::Abort {
                    return Err(DiagError::MissingDependency {
                        tool: tool.name.clone(),
                    }
                    .into());
                }
                missing.push(tool.name.clone());
            }
        }
    }

    finish(missing).map_err(Into::into)
}

fn finish(missing: Vec<String>) -> DiagResult<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DiagError::MissingDependencies(missing))
    }
}
