//! Catalog features resolved through a real agent subprocess.
#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;

use deps_agent::{AgentConfig, CommandService};
use deps_catalog::{Catalog, FeatureGate};
use deps_core::{DependencyManager, Failure, ManagerConfig, Outcome};
use deps_test_utils::{FakeInterface, UiEvent};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CATALOG: &str = r#"
[[feature]]
id = "import-csv"
label = "Preparing Import from CSV"
action = "Importing data from CSV"
enables = ["import-csv"]
dependency = [
  { name = "readr", version = "1.1.0" },
  { name = "Rcpp", version = "0.11.5" },
]
"#;

/// Unsatisfied until the install script leaves its marker behind.
const CHECK: &str = r#"cat > /dev/null
if [ -f installed ]; then
  echo '[]'
else
  echo '[{"name":"readr","version":"1.1.0","available_version":"1.3.1","version_satisfied":true}]'
fi"#;

const INSTALL: &str = r#"for p in "$@"; do echo "installing $p"; done; touch installed"#;

fn sh(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string(), "agent".to_string()]
}

fn gate(dir: &Path, install: &str, ui: &Arc<FakeInterface>) -> FeatureGate {
    let service = CommandService::new(
        AgentConfig::new("sh")
            .check_args(sh(CHECK))
            .install_args(sh(install))
            .working_dir(dir),
    );
    let manager = DependencyManager::new(Arc::new(service), ui.clone(), ManagerConfig::default());
    let catalog = Arc::new(Catalog::from_toml_str(CATALOG).unwrap());
    FeatureGate::new(catalog, manager, ui.clone())
}

#[tokio::test]
async fn test_feature_installed_through_agent() {
    let dir = TempDir::new().unwrap();
    let ui = Arc::new(FakeInterface::answering(true));
    let gate = gate(dir.path(), INSTALL, &ui);

    let outcome = gate.ensure("import-csv", None).await.unwrap();

    assert_eq!(outcome, Outcome::Satisfied { checked: 2, installed: 1 });
    assert!(dir.path().join("installed").exists());
    assert!(gate.capabilities().is_enabled("import-csv"));
    assert_eq!(ui.install_output(), vec!["installing readr"]);
    assert!(ui
        .events()
        .iter()
        .any(|event| matches!(event, UiEvent::InstallFinished(id) if id.starts_with("sh:"))));

    // both packages are now cached; the agent is not consulted again
    assert!(gate.with_feature("import-csv", None).await.unwrap());
}

#[tokio::test]
async fn test_agent_that_installs_nothing_is_reported() {
    let dir = TempDir::new().unwrap();
    let ui = Arc::new(FakeInterface::answering(true));
    let gate = gate(dir.path(), "exit 0", &ui);

    let outcome = gate.ensure("import-csv", None).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::Failed(Failure::StillUnsatisfied(ref left)) if left.len() == 1
    ));
    assert!(!gate.capabilities().is_enabled("import-csv"));
    assert_eq!(
        ui.errors(),
        vec![(
            "Dependency installation failed".to_string(),
            "The following packages could not be installed: readr.".to_string()
        )]
    );
}

#[tokio::test]
async fn test_declined_install_leaves_library_untouched() {
    let dir = TempDir::new().unwrap();
    let ui = Arc::new(FakeInterface::answering(false));
    let gate = gate(dir.path(), INSTALL, &ui);

    let outcome = gate.ensure("import-csv", Some("Opening sales.csv")).await.unwrap();

    assert_eq!(outcome, Outcome::Failed(Failure::Declined));
    assert!(!dir.path().join("installed").exists());
    assert!(ui.errors().is_empty());
    assert!(ui.confirmations()[0].1.starts_with("Opening sales.csv requires"));
}
