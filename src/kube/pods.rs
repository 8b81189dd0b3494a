//! Pod selection for failure diagnostics
//!
//! Works on `kubectl get pods -o json` output and picks the product pods that
//! are neither running nor completed.

use crate::error::{DiagError, DiagResult};
use serde::Deserialize;

/// Phases that need no further attention
const HEALTHY_PHASES: &[&str] = &["Running", "Succeeded"];

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    spec: PodSpec,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    containers: Vec<Container>,
    #[serde(default)]
    init_containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct Container {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(default)]
    phase: Option<String>,
}

impl Pod {
    fn is_healthy(&self) -> bool {
        self.status
            .phase
            .as_deref()
            .is_some_and(|phase| HEALTHY_PHASES.contains(&phase))
    }

    fn runs_product(&self, product: &str) -> bool {
        self.spec
            .containers
            .iter()
            .chain(&self.spec.init_containers)
            .filter_map(|c| c.image.as_deref())
            .any(|image| image.contains(product))
    }
}

/// Names of product pods whose phase is neither Running nor Succeeded
///
/// A pod with no reported phase counts as not running. Order follows the
/// pod list.
pub fn not_running_product_pods(pods_json: &str, product: &str) -> DiagResult<Vec<String>> {
    let list: PodList = serde_json::from_str(pods_json).map_err(|e| DiagError::Parse {
        what: "pod list",
        message: e.to_string(),
    })?;

    Ok(list
        .items
        .into_iter()
        .filter(|pod| !pod.is_healthy() && pod.runs_product(product))
        .map(|pod| pod.metadata.name)
        .collect())
}
