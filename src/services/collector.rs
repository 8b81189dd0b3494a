//! Diagnostics collection service
//!
//! Drives the collection pipeline for one release:
//! release resolution → metadata extraction → object enumeration →
//! countdown → bulk get/describe/logs/events.
//!
//! Every step writes its own file into the staging area. Only release
//! resolution and object enumeration are fatal; the bulk steps record their
//! failures and move on.

use crate::cli::{Prompter, Target};
use crate::config::Config;
use crate::error::DiagError;
use crate::kube::inventory::{self, Denylist, ObjectRef};
use crate::kube::release::{self, HelmRelease, ReleaseDescriptor};
use crate::kube::{CommandRunner, args, pods, run_checked};
use crate::services::staging::Staging;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tokio::io::AsyncBufRead;

/// Outcome of a single bulk step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Failed,
    Skipped,
}

/// Record of one collection step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: String,
    pub file: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StepOutcome {
    fn new(step: &str, file: &str, status: StepStatus, note: Option<String>) -> Self {
        Self {
            step: step.to_string(),
            file: file.to_string(),
            status,
            note,
        }
    }
}

/// Everything a completed collection produced
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub release: ReleaseDescriptor,
    /// Every object in the release manifest
    pub objects: Vec<ObjectRef>,
    /// Objects that were collected (sensitive ones removed)
    pub collected: Vec<ObjectRef>,
    /// Product pods that were neither running nor completed
    pub not_running: Vec<String>,
    pub steps: Vec<StepOutcome>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSummary<'a> {
    tool: String,
    collected_at: String,
    release: &'a ReleaseDescriptor,
    objects: usize,
    excluded_objects: usize,
    not_running_pods: &'a [String],
    steps: &'a [StepOutcome],
}

/// Service collecting diagnostics through `kubectl` and `helm`
pub struct Collector<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a Config,
}

impl<'a> Collector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    fn kubectl(&self) -> &str {
        &self.config.tools.kubectl
    }

    fn helm(&self) -> &str {
        &self.config.tools.helm
    }

    /// Run the whole pipeline into `staging`
    pub async fn run<R, W>(
        &self,
        target: &Target,
        prompter: &mut Prompter<R, W>,
        staging: &Staging,
    ) -> Result<CollectionReport>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let record = self.resolve_release(target, prompter, staging).await?;
        let yaml = serde_yaml::to_string(&record).context("Failed to serialize release record")?;
        staging.write("selected-release.yaml", yaml)?;

        let release = ReleaseDescriptor::from_record(&record)?;
        println!(
            "Collecting diagnostics for release {} in namespace {} (chart version {})",
            release.name, release.namespace, release.chart_version
        );

        let objects = self.enumerate_objects(&release, staging).await?;
        let collected =
            Denylist::new(&release.name, &self.config.sensitive_config_map_suffixes).filter(&objects);
        staging.write("release-objects-filtered.txt", inventory::render_list(&collected))?;
        if collected.len() != objects.len() {
            println!(
                "Excluding {} object(s) that may contain credentials",
                objects.len() - collected.len()
            );
        }

        self.countdown().await;

        let (steps, not_running) = self.collect_bulk(&release, &collected, staging).await?;

        let report = CollectionReport {
            release,
            objects,
            collected,
            not_running,
            steps,
        };
        self.write_summary(&report, staging)?;

        println!("Collection finished");
        Ok(report)
    }

    /// Find the release record to diagnose
    pub async fn resolve_release<R, W>(
        &self,
        target: &Target,
        prompter: &mut Prompter<R, W>,
        staging: &Staging,
    ) -> Result<HelmRelease>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let product = &self.config.product;

        match target {
            Target::Given {
                release: name,
                namespace,
            } => {
                println!("Looking up release {} in namespace {}", name, namespace);
                let record =
                    release::find_release(self.runner, self.helm(), name, namespace, product)
                        .await?;
                Ok(record)
            }
            Target::Choose => {
                println!("Listing Helm releases in all namespaces");
                let (raw, releases) = release::list_all(self.runner, self.helm()).await?;
                staging.write_scratch("helm-releases.yaml", &raw)?;

                let mut candidates = release::filter_product(releases, product);
                if candidates.is_empty() {
                    return Err(DiagError::NoReleases {
                        product: product.clone(),
                    }
                    .into());
                }

                let idx = prompter.choose_release(&candidates).await?;
                Ok(candidates.swap_remove(idx))
            }
        }
    }

    /// List the objects the release manifest renders
    ///
    /// Writes the manifest and the full object list into staging.
    pub async fn enumerate_objects(
        &self,
        release: &ReleaseDescriptor,
        staging: &Staging,
    ) -> Result<Vec<ObjectRef>> {
        println!("Rendering release manifest");
        let manifest = run_checked(
            self.runner,
            self.helm(),
            &args([
                "get",
                "manifest",
                release.name.as_str(),
                "-n",
                release.namespace.as_str(),
            ]),
        )
        .await?;
        staging.write("release-manifest.yaml", &manifest)?;

        let objects = inventory::parse_manifest(&manifest);
        staging.write("release-objects.txt", inventory::render_list(&objects))?;
        println!("Release manages {} object(s)", objects.len());
        Ok(objects)
    }

    /// Give the operator a chance to cancel before bulk collection
    pub async fn countdown(&self) {
        let secs = self.config.countdown_secs;
        if secs == 0 {
            return;
        }

        println!("Bulk collection can take a while. Press Ctrl-C to cancel.");
        for remaining in (1..=secs).rev() {
            print!("\rStarting in {:>2}s ", remaining);
            let _ = std::io::stdout().flush();
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        println!("\rStarting now    ");
    }

    /// Run the bulk get/describe/logs/events steps
    ///
    /// Returns the step outcomes and the not-running product pods.
    pub async fn collect_bulk(
        &self,
        release: &ReleaseDescriptor,
        objects: &[ObjectRef],
        staging: &Staging,
    ) -> Result<(Vec<StepOutcome>, Vec<String>)> {
        let ns = release.namespace.as_str();
        let refs: Vec<String> = objects.iter().map(ToString::to_string).collect();
        let mut steps = Vec::new();

        if refs.is_empty() {
            for (step, file) in [
                ("release objects", "objects-get.txt"),
                ("release object descriptions", "objects-describe.txt"),
            ] {
                steps.push(self.skip(staging, step, file, "release has no collectable objects")?);
            }
        } else {
            let mut get = args(["get"]);
            get.extend(refs.iter().cloned());
            get.extend(args(["-n", ns, "-o", "wide"]));
            steps.push(
                self.capture(staging, "release objects", "objects-get.txt", get)
                    .await?,
            );

            let mut describe = args(["describe"]);
            describe.extend(refs.iter().cloned());
            describe.extend(args(["-n", ns]));
            steps.push(
                self.capture(
                    staging,
                    "release object descriptions",
                    "objects-describe.txt",
                    describe,
                )
                .await?,
            );
        }

        steps.push(
            self.capture(
                staging,
                "pod descriptions",
                "pods-describe.txt",
                args(["describe", "pods", "-n", ns]),
            )
            .await?,
        );

        let (outcome, not_running) = self.find_not_running(ns, staging).await?;
        steps.push(outcome);

        if not_running.is_empty() {
            steps.push(self.skip(
                staging,
                "not-running pods",
                "pods-not-running-get.txt",
                "no not-running pods",
            )?);
        } else {
            let mut get = args(["get", "pods"]);
            get.extend(not_running.iter().cloned());
            get.extend(args(["-n", ns, "-o", "wide"]));
            steps.push(
                self.capture(staging, "not-running pods", "pods-not-running-get.txt", get)
                    .await?,
            );

            for pod in &not_running {
                steps.push(self.capture_logs(staging, ns, pod).await?);
            }
        }

        steps.push(
            self.capture(
                staging,
                "namespace events",
                "events.txt",
                args(["get", "events", "-n", ns, "--sort-by=.lastTimestamp"]),
            )
            .await?,
        );

        Ok((steps, not_running))
    }

    /// Select the product pods that are neither running nor completed
    async fn find_not_running(
        &self,
        ns: &str,
        staging: &Staging,
    ) -> Result<(StepOutcome, Vec<String>)> {
        const STEP: &str = "not-running pod list";
        const FILE: &str = "pods-not-running.txt";

        println!("Looking for pods that are not running");
        let pods_json = match run_checked(
            self.runner,
            self.kubectl(),
            &args(["get", "pods", "-n", ns, "-o", "json"]),
        )
        .await
        {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to list pods in {}: {}", ns, e);
                staging.write(FILE, format!("# {}\n", e))?;
                let outcome = StepOutcome::new(STEP, FILE, StepStatus::Failed, Some(e.to_string()));
                return Ok((outcome, Vec::new()));
            }
        };
        staging.write_scratch("pods.json", &pods_json)?;

        match pods::not_running_product_pods(&pods_json, &self.config.product) {
            Ok(names) => {
                let listing: String = names.iter().map(|n| format!("{}\n", n)).collect();
                staging.write(FILE, listing)?;
                println!("  {} pod(s) not running", names.len());
                let outcome = StepOutcome::new(STEP, FILE, StepStatus::Ok, None);
                Ok((outcome, names))
            }
            Err(e) => {
                tracing::warn!("{}", e);
                staging.write(FILE, format!("# {}\n", e))?;
                let outcome = StepOutcome::new(STEP, FILE, StepStatus::Failed, Some(e.to_string()));
                Ok((outcome, Vec::new()))
            }
        }
    }

    /// Run one best-effort kubectl step and store its output
    async fn capture(
        &self,
        staging: &Staging,
        step: &str,
        file: &str,
        kubectl_args: Vec<String>,
    ) -> Result<StepOutcome> {
        println!("Collecting {}", step);

        let outcome = match self.runner.run(self.kubectl(), &kubectl_args).await {
            Ok(output) if output.success => {
                staging.write(file, &output.stdout)?;
                StepOutcome::new(step, file, StepStatus::Ok, None)
            }
            Ok(output) => {
                let stderr = output.stderr.trim().to_string();
                tracing::warn!("Collecting {} failed: {}", step, stderr);
                staging.write(file, format!("{}\n# command failed: {}\n", output.stdout, stderr))?;
                StepOutcome::new(step, file, StepStatus::Failed, Some(stderr))
            }
            Err(e) => {
                tracing::warn!("Collecting {} failed: {}", step, e);
                staging.write(file, format!("# command failed: {}\n", e))?;
                StepOutcome::new(step, file, StepStatus::Failed, Some(e.to_string()))
            }
        };

        println!("  saved {}", file);
        Ok(outcome)
    }

    /// Fetch logs for one pod; failures leave whatever output there was
    async fn capture_logs(&self, staging: &Staging, ns: &str, pod: &str) -> Result<StepOutcome> {
        let file = format!("logs/{}.log", pod);
        println!("Collecting logs for {}", pod);

        let result = self
            .runner
            .run(self.kubectl(), &args(["logs", pod, "-n", ns, "--all-containers"]))
            .await;

        let (stdout, status) = match result {
            Ok(output) => {
                if !output.success {
                    tracing::debug!("Logs for {} unavailable: {}", pod, output.stderr.trim());
                }
                let status = if output.success {
                    StepStatus::Ok
                } else {
                    StepStatus::Failed
                };
                (output.stdout, status)
            }
            Err(e) => {
                tracing::debug!("Logs for {} unavailable: {}", pod, e);
                (String::new(), StepStatus::Failed)
            }
        };

        staging.write(&file, stdout)?;
        Ok(StepOutcome::new(&format!("logs {}", pod), &file, status, None))
    }

    fn skip(&self, staging: &Staging, step: &str, file: &str, reason: &str) -> Result<StepOutcome> {
        println!("Skipping {}: {}", step, reason);
        staging.write(file, format!("# skipped: {}\n", reason))?;
        Ok(StepOutcome::new(
            step,
            file,
            StepStatus::Skipped,
            Some(reason.to_string()),
        ))
    }

    fn write_summary(&self, report: &CollectionReport, staging: &Staging) -> Result<()> {
        let summary = CollectionSummary {
            tool: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            collected_at: chrono::Utc::now().to_rfc3339(),
            release: &report.release,
            objects: report.objects.len(),
            excluded_objects: report.objects.len() - report.collected.len(),
            not_running_pods: &report.not_running,
            steps: &report.steps,
        };

        let yaml = serde_yaml::to_string(&summary).context("Failed to serialize summary")?;
        staging.write("collection-summary.yaml", yaml)?;
        Ok(())
    }
}
