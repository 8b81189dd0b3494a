//! Release discovery and selection tests

mod common;

use common::{ALL_RELEASES, FakeRunner, RELEASE_LIST, test_config};
use fossa_diag::cli::{Args, Options, Prompter, Target};
use fossa_diag::kube::CommandOutput;
use fossa_diag::kube::release::{self, chart_version};
use fossa_diag::services::{Collector, Staging};
use fossa_diag::{DiagError, ReleaseDescriptor};

fn no_env(_: &str) -> Option<String> {
    None
}

fn staging(dir: &tempfile::TempDir) -> Staging {
    Staging::create(dir.path().join("bundle.tar.gz")).unwrap()
}

#[tokio::test]
async fn test_invalid_selection_reprompts() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let runner = FakeRunner::with_tools().respond(
        "helm",
        "list --all-namespaces",
        CommandOutput::ok(ALL_RELEASES),
    );
    let staging = staging(&dir);

    let mut prompter = Prompter::new(&b"0\nabc\n9\n2\n"[..], Vec::new());
    let record = Collector::new(&runner, &config)
        .resolve_release(&Target::Choose, &mut prompter, &staging)
        .await
        .unwrap();

    // Only the two fossa releases are offered; "2" is the second of them
    assert_eq!(record.name.as_deref(), Some("staging"));
    assert_eq!(prompter.prompts_shown(), 4);

    let output = String::from_utf8(prompter.into_output()).unwrap();
    assert!(output.contains("1) myrelease (namespace: myns"));
    assert!(output.contains("2) staging (namespace: fossa-staging"));
    assert!(!output.contains("ingress"));
    assert_eq!(output.matches("Invalid selection").count(), 3);
}

#[tokio::test]
async fn test_closed_input_during_selection_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let runner = FakeRunner::with_tools().respond(
        "helm",
        "list --all-namespaces",
        CommandOutput::ok(ALL_RELEASES),
    );
    let staging = staging(&dir);

    let mut prompter = Prompter::new(&b"7\n"[..], Vec::new());
    let err = Collector::new(&runner, &config)
        .resolve_release(&Target::Choose, &mut prompter, &staging)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DiagError>(),
        Some(DiagError::InputClosed)
    ));
}

#[tokio::test]
async fn test_given_release_needs_no_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let runner =
        FakeRunner::with_tools().respond("helm", "list -n myns", CommandOutput::ok(RELEASE_LIST));
    let staging = staging(&dir);

    let options = Options::resolve(
        Args {
            release: Some("myrelease".to_string()),
            namespace: Some("myns".to_string()),
            ..Args::default()
        },
        no_env,
    );
    let target = options.target().unwrap();

    let mut prompter = Prompter::new(&b""[..], Vec::new());
    let record = Collector::new(&runner, &config)
        .resolve_release(&target, &mut prompter, &staging)
        .await
        .unwrap();

    assert_eq!(prompter.prompts_shown(), 0);
    assert_eq!(
        runner.calls(),
        vec!["helm list -n myns --filter ^myrelease$ -o yaml".to_string()]
    );
    assert_eq!(
        ReleaseDescriptor::from_record(&record).unwrap(),
        ReleaseDescriptor {
            name: "myrelease".to_string(),
            namespace: "myns".to_string(),
            chart_version: "1.2.3".to_string(),
        }
    );
}

#[tokio::test]
async fn test_given_release_of_other_product_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let list = "- name: web\n  namespace: myns\n  chart: ingress-nginx-4.10.0\n";
    let runner = FakeRunner::with_tools().respond("helm", "list -n myns", CommandOutput::ok(list));
    let staging = staging(&dir);

    let target = Target::Given {
        release: "web".to_string(),
        namespace: "myns".to_string(),
    };
    let mut prompter = Prompter::new(&b""[..], Vec::new());
    let err = Collector::new(&runner, &config)
        .resolve_release(&target, &mut prompter, &staging)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "release selected is not fossa");
}

#[tokio::test]
async fn test_no_product_releases() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let list = "- name: web\n  namespace: default\n  chart: ingress-nginx-4.10.0\n";
    let runner = FakeRunner::with_tools().respond(
        "helm",
        "list --all-namespaces",
        CommandOutput::ok(list),
    );
    let staging = staging(&dir);

    let mut prompter = Prompter::new(&b"1\n"[..], Vec::new());
    let err = Collector::new(&runner, &config)
        .resolve_release(&Target::Choose, &mut prompter, &staging)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "no fossa releases found");
    assert_eq!(prompter.prompts_shown(), 0);
}

#[tokio::test]
async fn test_helm_failure_is_fatal() {
    let runner = FakeRunner::with_tools().respond(
        "helm",
        "list --all-namespaces",
        CommandOutput::failed("Error: Kubernetes cluster unreachable"),
    );

    let err = release::list_all(&runner, "helm").await.unwrap_err();
    assert!(matches!(err, DiagError::CommandFailed { .. }));
    assert!(err.to_string().contains("Kubernetes cluster unreachable"));
}

#[test]
fn test_missing_chart_version_is_named() {
    let record: fossa_diag::HelmRelease =
        serde_yaml::from_str("name: myrelease\nnamespace: myns\nchart: fossa\n").unwrap();

    let err = ReleaseDescriptor::from_record(&record).unwrap_err();
    assert!(err.to_string().contains("chart version"));
}

#[test]
fn test_chart_version_extraction() {
    assert_eq!(chart_version("fossa-core-1.2.3"), Some("1.2.3".to_string()));
    assert_eq!(
        chart_version("fossa-core-1.2.3-rc.1"),
        Some("1.2.3-rc.1".to_string())
    );
    assert_eq!(chart_version("fossa-1.2.3"), None);
}

#[test]
fn test_non_interactive_requires_inputs() {
    let forced = |key: &str| (key == "NONINTERACTIVE").then(|| "true".to_string());

    let options = Options::resolve(Args::default(), forced);
    assert_eq!(
        options.target().unwrap_err().to_string(),
        "release name (-r) is required in non-interactive mode"
    );

    let options = Options::resolve(
        Args {
            release: Some("myrelease".to_string()),
            ..Args::default()
        },
        forced,
    );
    assert_eq!(
        options.target().unwrap_err().to_string(),
        "namespace (-n) is required in non-interactive mode"
    );
}
