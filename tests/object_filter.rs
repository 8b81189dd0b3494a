//! Sensitive object filtering tests
//!
//! The denylist must drop exactly the release's credential-bearing
//! ConfigMaps and nothing else, whatever the manifest contains.

mod common;

use fossa_diag::config::ConfigLoader;
use fossa_diag::kube::inventory::render_list;
use fossa_diag::{Denylist, ObjectRef, is_sensitive, parse_manifest};
use insta::assert_snapshot;

fn default_suffixes() -> Vec<String> {
    ConfigLoader::load_defaults().sensitive_config_map_suffixes
}

#[test]
fn test_filter_drops_release_config_maps() {
    let suffixes = default_suffixes();
    let objects = parse_manifest(common::MANIFEST);
    let kept = Denylist::new("myrelease", &suffixes).filter(&objects);

    assert_eq!(objects.len(), 5);
    assert_snapshot!(render_list(&kept).trim_end(), @r"
    ConfigMap/myrelease-feature-flags
    Deployment/myrelease-core
    Service/myrelease-core
    ");
}

#[test]
fn test_filtered_list_is_complement_of_denylist() {
    let suffixes = default_suffixes();
    let releases = ["myrelease", "fossa", "fossa.prod", "a"];
    let kinds = ["ConfigMap", "Secret", "Deployment", "configmap"];
    let names = [
        "myrelease-config",
        "myrelease-scotland-yard",
        "myrelease-configs",
        "fossa-config",
        "fossaXprod-config",
        "fossa.prod-config",
        "a-config",
        "config",
        "other-scotland-yard",
    ];

    for release in releases {
        let objects: Vec<ObjectRef> = kinds
            .iter()
            .flat_map(|kind| names.iter().map(move |name| ObjectRef::new(*kind, *name)))
            .collect();

        let denylist = Denylist::new(release, &suffixes);
        let kept = denylist.filter(&objects);

        for object in &objects {
            let expected_sensitive = object.kind == "ConfigMap"
                && suffixes
                    .iter()
                    .any(|suffix| object.name == format!("{}-{}", release, suffix));

            assert_eq!(
                is_sensitive(&object.kind, &object.name, release, &suffixes),
                expected_sensitive,
                "{} for release {}",
                object,
                release
            );
            assert_eq!(
                kept.contains(object),
                !expected_sensitive,
                "{} for release {}",
                object,
                release
            );
        }
    }
}

#[test]
fn test_filter_preserves_order() {
    let suffixes = default_suffixes();
    let objects = vec![
        ObjectRef::new("Service", "b"),
        ObjectRef::new("ConfigMap", "rel-config"),
        ObjectRef::new("Deployment", "a"),
    ];

    let kept = Denylist::new("rel", &suffixes).filter(&objects);
    assert_eq!(
        kept,
        vec![ObjectRef::new("Service", "b"), ObjectRef::new("Deployment", "a")]
    );
}

#[test]
fn test_custom_suffixes() {
    let suffixes = vec!["secrets".to_string()];
    let denylist = Denylist::new("myrelease", &suffixes);

    assert!(denylist.matches(&ObjectRef::new("ConfigMap", "myrelease-secrets")));
    assert!(!denylist.matches(&ObjectRef::new("ConfigMap", "myrelease-config")));
}

#[test]
fn test_empty_manifest_yields_no_objects() {
    assert!(parse_manifest("").is_empty());
    assert!(parse_manifest("---\n---\n").is_empty());
}
