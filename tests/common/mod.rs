//! Shared fixtures for integration tests
//!
//! [`FakeRunner`] answers `kubectl`/`helm` invocations from a script instead
//! of running processes.

#![allow(dead_code)]

use async_trait::async_trait;
use fossa_diag::config::{Config, ConfigLoader};
use fossa_diag::kube::{CommandOutput, CommandRunner};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Scripted command runner
///
/// Responses are matched in registration order against the start of the
/// space-joined argument list. Unmatched commands fail.
#[derive(Default)]
pub struct FakeRunner {
    responses: Vec<(String, String, CommandOutput)>,
    installed: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner with `kubectl` and `helm` on the fake PATH
    pub fn with_tools() -> Self {
        Self::new().installed("kubectl").installed("helm")
    }

    pub fn installed(mut self, program: &str) -> Self {
        self.installed.push(program.to_string());
        self
    }

    pub fn respond(mut self, program: &str, args_prefix: &str, output: CommandOutput) -> Self {
        self.responses
            .push((program.to_string(), args_prefix.to_string(), output));
        self
    }

    /// Every command run so far, as `program arg arg ...`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<String> {
        let prefix = format!("{} ", program);
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(&prefix))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let joined = args.join(" ");
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, joined));

        let output = self
            .responses
            .iter()
            .find(|(p, prefix, _)| p == program && joined.starts_with(prefix.as_str()))
            .map(|(_, _, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::failed(format!("unexpected command: {}", joined)));
        Ok(output)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .iter()
            .any(|p| p == program)
            .then(|| PathBuf::from("/usr/local/bin").join(program))
    }
}

/// Defaults with the countdown disabled and the bundle written into `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = ConfigLoader::load_defaults();
    config.countdown_secs = 0;
    config.default_output = dir.join("fossa-diag.tar.gz");
    config
}

/// Entry paths and contents of a gzipped tarball
pub fn archive_entries(path: &Path) -> Vec<(String, String)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));

    let mut entries = Vec::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path().unwrap().to_string_lossy().into_owned();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        entries.push((name, contents));
    }
    entries.sort();
    entries
}

pub const RELEASE_LIST: &str = r#"- name: myrelease
  namespace: myns
  revision: "2"
  updated: 2024-05-01 10:00:00.000000 +0000 UTC
  status: deployed
  chart: fossa-core-1.2.3
  app_version: 4.5.0
"#;

pub const ALL_RELEASES: &str = r#"- name: myrelease
  namespace: myns
  status: deployed
  chart: fossa-core-1.2.3
- name: ingress
  namespace: kube-system
  status: deployed
  chart: ingress-nginx-4.10.0
- name: staging
  namespace: fossa-staging
  status: failed
  chart: fossa-core-1.3.0
"#;

pub const MANIFEST: &str = r#"---
# Source: fossa-core/templates/configmap.yaml
apiVersion: v1
kind: ConfigMap
metadata:
  name: myrelease-config
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: myrelease-scotland-yard
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: myrelease-feature-flags
---
apiVersion: v1
kind: Service
metadata:
  name: myrelease-core
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: myrelease-core
"#;

pub const PODS: &str = r#"{
  "items": [
    {
      "metadata": {"name": "myrelease-core-7d9f-abcde"},
      "spec": {"containers": [{"image": "quay.io/fossa/fossa-core:4.5.0"}]},
      "status": {"phase": "Running"}
    },
    {
      "metadata": {"name": "myrelease-core-7d9f-fghij"},
      "spec": {"containers": [{"image": "quay.io/fossa/fossa-core:4.5.0"}]},
      "status": {"phase": "Pending"}
    },
    {
      "metadata": {"name": "redis-0"},
      "spec": {"containers": [{"image": "redis:7"}]},
      "status": {"phase": "Pending"}
    }
  ]
}"#;

/// Runner scripted for a healthy `myrelease` in `myns`
pub fn cluster_runner() -> FakeRunner {
    FakeRunner::with_tools()
        .respond("helm", "list -n myns", CommandOutput::ok(RELEASE_LIST))
        .respond("helm", "list --all-namespaces", CommandOutput::ok(ALL_RELEASES))
        .respond("helm", "get manifest myrelease -n myns", CommandOutput::ok(MANIFEST))
        .respond("kubectl", "get pods -n myns -o json", CommandOutput::ok(PODS))
        .respond("kubectl", "get pods ", CommandOutput::ok("NAME READY STATUS\n"))
        .respond("kubectl", "get events", CommandOutput::ok("LAST SEEN TYPE REASON\n"))
        .respond("kubectl", "get ", CommandOutput::ok("NAME AGE\n"))
        .respond("kubectl", "describe ", CommandOutput::ok("Name: x\n"))
        .respond("kubectl", "logs ", CommandOutput::ok("booting\n"))
}
