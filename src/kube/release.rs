//! Helm release discovery and validation
//!
//! Releases are read from `helm list -o yaml`. A release belongs to the
//! product when its chart identifier (`<chart>-<version>`) contains the
//! configured product name.

use super::{CommandRunner, args, run_checked};
use crate::error::{DiagError, DiagResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One release record as reported by `helm list -o yaml`
///
/// Fields the collector does not interpret are kept in `extra` so the
/// persisted record matches what Helm reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelmRelease {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl HelmRelease {
    /// Whether the chart identifier names the product
    pub fn is_product(&self, product: &str) -> bool {
        self.chart
            .as_deref()
            .is_some_and(|chart| chart.contains(product))
    }

    /// One-line description used in the selection menu
    pub fn menu_label(&self) -> String {
        format!(
            "{} (namespace: {}, chart: {}, status: {})",
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.namespace.as_deref().unwrap_or("-"),
            self.chart.as_deref().unwrap_or("-"),
            self.status.as_deref().unwrap_or("-"),
        )
    }
}

/// Resolved identity of the release being diagnosed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDescriptor {
    pub name: String,
    pub namespace: String,
    pub chart_version: String,
}

impl ReleaseDescriptor {
    /// Extract the descriptor from a release record
    ///
    /// Every field is required; the first missing one is reported.
    pub fn from_record(record: &HelmRelease) -> DiagResult<Self> {
        let namespace = non_empty(record.namespace.as_deref())
            .ok_or(DiagError::MissingField("namespace"))?;
        let name =
            non_empty(record.name.as_deref()).ok_or(DiagError::MissingField("release name"))?;
        let chart_version = record
            .chart
            .as_deref()
            .and_then(chart_version)
            .ok_or(DiagError::MissingField("chart version"))?;

        Ok(Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            chart_version,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse the chart version out of a chart identifier
///
/// The identifier is split on `-`; the version is everything from the third
/// segment on (`fossa-core-1.2.3` → `1.2.3`, `fossa-core-1.2.3-rc.1` →
/// `1.2.3-rc.1`). Identifiers with fewer than three segments have no version.
pub fn chart_version(chart: &str) -> Option<String> {
    let segments: Vec<&str> = chart.trim().split('-').collect();
    if segments.len() < 3 {
        return None;
    }

    let version = segments[2..].join("-");
    (!version.is_empty()).then_some(version)
}

/// Parse `helm list -o yaml` output
///
/// Helm prints `[]` when there are no releases; blank output is treated the
/// same way.
pub fn parse_release_list(yaml: &str) -> DiagResult<Vec<HelmRelease>> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }

    let releases: Option<Vec<HelmRelease>> =
        serde_yaml::from_str(yaml).map_err(|e| DiagError::Parse {
            what: "helm release list",
            message: e.to_string(),
        })?;

    Ok(releases.unwrap_or_default())
}

/// Keep only the releases whose chart names the product, in Helm's order
pub fn filter_product(releases: Vec<HelmRelease>, product: &str) -> Vec<HelmRelease> {
    releases
        .into_iter()
        .filter(|release| release.is_product(product))
        .collect()
}

/// List releases in every namespace
///
/// Returns the raw Helm output alongside the parsed records.
pub async fn list_all(
    runner: &dyn CommandRunner,
    helm: &str,
) -> DiagResult<(String, Vec<HelmRelease>)> {
    let raw = run_checked(runner, helm, &args(["list", "--all-namespaces", "-o", "yaml"])).await?;
    let releases = parse_release_list(&raw)?;
    tracing::debug!("helm reported {} releases", releases.len());
    Ok((raw, releases))
}

/// Look up a release by exact name in a namespace and validate it
pub async fn find_release(
    runner: &dyn CommandRunner,
    helm: &str,
    name: &str,
    namespace: &str,
    product: &str,
) -> DiagResult<HelmRelease> {
    let filter = format!("^{}$", name);
    let raw = run_checked(
        runner,
        helm,
        &args(["list", "-n", namespace, "--filter", filter.as_str(), "-o", "yaml"]),
    )
    .await?;

    parse_release_list(&raw)?
        .into_iter()
        .find(|release| release.name.as_deref() == Some(name) && release.is_product(product))
        .ok_or_else(|| DiagError::NotProduct {
            product: product.to_string(),
        })
}

/// Render the numbered selection menu (1-based)
pub fn render_menu(releases: &[HelmRelease]) -> String {
    releases
        .iter()
        .enumerate()
        .map(|(idx, release)| format!("{}) {}\n", idx + 1, release.menu_label()))
        .collect()
}
