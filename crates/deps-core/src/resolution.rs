//! Remote resolution client and version-conflict detection

use std::fmt::Write as _;
use std::sync::Arc;

use crate::Result;
use crate::dependency::Dependency;
use crate::service::DependencyService;

/// Title used for conflict reports when the request has no user action.
pub const PACKAGES_NOT_FOUND_TITLE: &str = "Packages Not Found";

/// Asks the service which dependencies are unsatisfied.
#[derive(Clone)]
pub struct ResolutionClient {
    service: Arc<dyn DependencyService>,
}

impl ResolutionClient {
    pub fn new(service: Arc<dyn DependencyService>) -> Self {
        Self { service }
    }

    pub async fn check_unsatisfied(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> Result<Vec<Dependency>> {
        tracing::debug!(count = dependencies.len(), "Checking dependencies");
        let unsatisfied = self
            .service
            .check_unsatisfied(dependencies, silent_embedded_update)
            .await?;
        tracing::debug!(
            checked = dependencies.len(),
            unsatisfied = unsatisfied.len(),
            "Dependency check finished"
        );
        Ok(unsatisfied)
    }
}

/// Unsatisfied dependencies for which no acceptable version is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    entries: Vec<Dependency>,
}

impl VersionConflict {
    /// Collect every entry with `version_satisfied = false`, if any.
    pub fn detect(unsatisfied: &[Dependency]) -> Option<Self> {
        let entries: Vec<Dependency> = unsatisfied
            .iter()
            .filter(|d| d.is_version_conflict())
            .cloned()
            .collect();
        (!entries.is_empty()).then_some(Self { entries })
    }

    pub fn entries(&self) -> &[Dependency] {
        &self.entries
    }

    pub fn title(user_action: Option<&str>) -> String {
        match user_action {
            Some(action) if !action.is_empty() => action.to_string(),
            _ => PACKAGES_NOT_FOUND_TITLE.to_string(),
        }
    }

    /// One line per conflicting package.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for dep in &self.entries {
            let _ = write!(out, "{} {}", dep.name, dep.min_version);
            match dep.available_version.as_deref() {
                Some(version) if !version.is_empty() => {
                    let _ = writeln!(out, " is required but {} is available", version);
                }
                _ => out.push_str(" is not available\n"),
            }
        }
        out
    }

    pub fn message(&self) -> String {
        format!(
            "Required package versions could not be found:\n\n{}\n\
             Check that the configured package repository contains the needed package versions.",
            self.describe()
        )
    }
}
