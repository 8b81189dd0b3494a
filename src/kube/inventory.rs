//! Object inventory for a Helm release
//!
//! Extracts the objects a release manages from its rendered manifest and
//! decides which of them are safe to collect.

use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A cluster object rendered by the release, addressed as `Kind/name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    pub kind: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Extract every object from a multi-document manifest
///
/// The result is deduplicated and sorted by `Kind/name`. Documents that are
/// empty, unparseable, or lack a kind or name are skipped.
pub fn parse_manifest(manifest: &str) -> Vec<ObjectRef> {
    let mut objects = BTreeSet::new();

    for (idx, doc) in split_documents(manifest).into_iter().enumerate() {
        let resource: Value = match serde_yaml::from_str(&doc) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse manifest document {}: {}", idx, e);
                continue;
            }
        };

        if resource.is_null() {
            continue;
        }

        let kind = resource.get("kind").and_then(Value::as_str);
        let name = resource
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str);

        match (kind, name) {
            (Some(kind), Some(name)) => {
                objects.insert(ObjectRef::new(kind, name));
            }
            _ => tracing::warn!("Manifest document {} has no kind or metadata.name", idx),
        }
    }

    tracing::debug!("Release manifest lists {} objects", objects.len());
    objects.into_iter().collect()
}

/// Split a manifest on `---` separator lines
fn split_documents(manifest: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current = String::new();

    for line in manifest.lines() {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed.starts_with("--- ") {
            docs.push(std::mem::take(&mut current));
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    docs.push(current);

    docs.retain(|doc| !doc.trim().is_empty());
    docs
}

/// Whether an object of a release carries secrets and must not be collected
///
/// Sensitive objects are ConfigMaps named `<release>-<suffix>` for any of the
/// configured suffixes.
pub fn is_sensitive(kind: &str, name: &str, release: &str, suffixes: &[String]) -> bool {
    if kind != "ConfigMap" {
        return false;
    }

    name.strip_prefix(release)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|suffix| suffixes.iter().any(|s| s == suffix))
}

/// Denylist of sensitive objects for one release
#[derive(Debug, Clone, Copy)]
pub struct Denylist<'a> {
    pub release: &'a str,
    pub suffixes: &'a [String],
}

impl<'a> Denylist<'a> {
    pub fn new(release: &'a str, suffixes: &'a [String]) -> Self {
        Self { release, suffixes }
    }

    pub fn matches(&self, object: &ObjectRef) -> bool {
        is_sensitive(&object.kind, &object.name, self.release, self.suffixes)
    }

    /// Drop sensitive objects, preserving order
    pub fn filter(&self, objects: &[ObjectRef]) -> Vec<ObjectRef> {
        objects
            .iter()
            .filter(|object| !self.matches(object))
            .cloned()
            .collect()
    }
}

/// Render objects one `Kind/name` per line
pub fn render_list(objects: &[ObjectRef]) -> String {
    objects.iter().map(|object| format!("{}\n", object)).collect()
}
