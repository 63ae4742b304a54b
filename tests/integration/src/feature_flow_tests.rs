//! Builtin catalog features driven through the manager against a simulated
//! package library.

use std::sync::Arc;
use std::time::Duration;

use deps_catalog::{Catalog, FeatureGate};
use deps_core::{
    CachePolicy, DependencyManager, EventBus, Failure, ManagerConfig, ManagerEvent, Outcome,
};
use deps_test_utils::{FakeInterface, FakeService};
use pretty_assertions::assert_eq;

struct Harness {
    service: Arc<FakeService>,
    ui: Arc<FakeInterface>,
    gate: FeatureGate,
}

impl Harness {
    fn new(service: FakeService, ui: FakeInterface) -> Self {
        Self::with_config(service, ui, ManagerConfig::default())
    }

    fn with_config(service: FakeService, ui: FakeInterface, config: ManagerConfig) -> Self {
        let service = Arc::new(service);
        let ui = Arc::new(ui);
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let manager = DependencyManager::new(service.clone(), ui.clone(), config);
        let gate = FeatureGate::new(catalog, manager, ui.clone());
        Self { service, ui, gate }
    }

    fn manager(&self) -> &DependencyManager {
        self.gate.manager()
    }
}

/// A library holding every package of `feature` apart from `missing`.
fn library_for(feature: &str, missing: &[&str]) -> FakeService {
    let catalog = Catalog::builtin().unwrap();
    catalog
        .dependencies(feature)
        .unwrap()
        .into_iter()
        .filter(|dep| !missing.contains(&dep.name.as_str()))
        .fold(FakeService::new(), |service, dep| {
            let version = if dep.min_version.is_empty() {
                "1.0"
            } else {
                dep.min_version.as_str()
            };
            service.with_installed(&dep.name, version)
        })
}

#[tokio::test]
async fn test_installed_feature_is_cached_across_features() {
    let harness = Harness::new(library_for("rmarkdown", &[]), FakeInterface::default());

    assert!(harness.gate.with_feature("rmarkdown", None).await.unwrap());
    assert_eq!(harness.service.check_count(), 1);

    // tinytex, the only package of this feature, was verified by rmarkdown
    // under the identity cache policy
    assert!(harness.gate.with_feature("tinytex", None).await.unwrap());
    assert_eq!(harness.service.check_count(), 1);

    let caps = harness.gate.capabilities().snapshot();
    assert_eq!(caps, vec!["knit-with-parameters", "powerpoint", "rmarkdown"]);
}

#[tokio::test]
async fn test_versioned_policy_rechecks_higher_minimum_across_features() {
    let harness = Harness::with_config(
        library_for("rmarkdown", &[]),
        FakeInterface::default(),
        ManagerConfig::default().with_cache_policy(CachePolicy::Versioned),
    );

    assert!(harness.gate.with_feature("rmarkdown", None).await.unwrap());
    // rmarkdown verified tinytex 0.11; the tinytex feature needs 0.16
    let outcome = harness.gate.ensure("tinytex", None).await.unwrap();

    assert_eq!(harness.service.check_count(), 2);
    assert!(matches!(outcome, Outcome::Failed(Failure::VersionConflict(_))));
}

#[tokio::test]
async fn test_import_csv_install_scenario() {
    let service = FakeService::new()
        .with_installed("Rcpp", "1.0.5")
        .with_available("readr", "1.4.0");
    let harness = Harness::new(service, FakeInterface::answering(true));

    let outcome = harness
        .gate
        .ensure("import-csv", Some("Importing data.csv"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Satisfied { checked: 2, installed: 1 });
    assert_eq!(harness.service.install_calls()[0].len(), 1);
    assert!(harness.gate.capabilities().is_enabled("import-csv"));
    assert_eq!(harness.ui.confirmations().len(), 1);

    // a second feature sharing Rcpp only checks its own package
    harness.service.set_installed("haven", "2.3.0");
    assert!(harness.gate.with_feature("import-sav", None).await.unwrap());
    let last_check = harness.service.check_calls().pop().unwrap();
    assert_eq!(last_check.len(), 1);
    assert_eq!(last_check[0].name, "haven");
}

#[tokio::test]
async fn test_shiny_uses_feature_prompt() {
    let service = library_for("shiny", &["shiny"]).with_available("shiny", "1.7.0");
    let harness = Harness::new(service, FakeInterface::answering(false));

    let outcome = harness.gate.ensure("shiny", None).await.unwrap();

    assert_eq!(outcome, Outcome::Failed(Failure::Declined));
    let confirmations = harness.ui.confirmations();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].0, "Install Shiny Package");
    assert!(confirmations[0]
        .1
        .starts_with("Running Shiny applications requires installation"));
}

#[tokio::test]
async fn test_package_state_event_invalidates_cache() {
    let harness = Harness::new(
        FakeService::new().with_installed("DBI", "1.1.0"),
        FakeInterface::default(),
    );
    let bus = EventBus::default();
    let _listener = harness.manager().listen(bus.subscribe());

    assert!(harness.gate.with_feature("dbi", None).await.unwrap());
    assert!(!harness.manager().cache().is_empty());

    // DBI removed behind the manager's back
    harness.service.uninstall("DBI");
    bus.publish(ManagerEvent::PackageStateChanged);
    tokio::time::timeout(Duration::from_secs(5), async {
        while !harness.manager().cache().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    let outcome = harness.gate.ensure("dbi", None).await.unwrap();
    assert!(matches!(outcome, Outcome::Failed(Failure::VersionConflict(_))));
    assert_eq!(harness.service.check_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_feature_requests_are_serialized() {
    let service = FakeService::new()
        .with_installed("DBI", "1.1.0")
        .with_installed("RSQLite", "2.2.0")
        .with_installed("keyring", "1.1.0");
    let gate_open = service.hold_checks();
    let harness = Arc::new(Harness::new(service, FakeInterface::default()));

    let mut tasks = Vec::new();
    for feature in ["dbi", "rsqlite", "keyring", "dbi"] {
        let harness = Arc::clone(&harness);
        tasks.push(tokio::spawn(async move {
            harness.gate.with_feature(feature, None).await.unwrap()
        }));
    }

    tokio::time::timeout(Duration::from_secs(5), harness.service.wait_for_checks(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(harness.service.check_count(), 1);

    gate_open.open();
    for task in tasks {
        assert!(task.await.unwrap());
    }

    // DBI is checked once; the repeated dbi request short-circuits
    let checked: Vec<String> = harness
        .service
        .check_calls()
        .into_iter()
        .flatten()
        .map(|d| d.name)
        .collect();
    assert_eq!(checked.iter().filter(|n| *n == "DBI").count(), 1);
    assert!(checked.contains(&"RSQLite".to_string()));
    assert!(checked.contains(&"keyring".to_string()));
}
