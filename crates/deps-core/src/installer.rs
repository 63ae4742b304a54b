//! Installation through the external agent, followed by re-verification
//!
//! Success means "after the agent exits, nothing in the set is unsatisfied",
//! not "the agent exited with code 0".

use std::sync::Arc;

use crate::Error;
use crate::dependency::Dependency;
use crate::resolution::ResolutionClient;
use crate::service::DependencyService;
use crate::ui::UserInterface;

/// What happened to an installation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallResult {
    /// Post-install check found everything satisfied
    Satisfied,
    /// Post-install check still reports these packages
    StillUnsatisfied(Vec<Dependency>),
    /// The agent could not be started
    LaunchFailed(Error),
    /// The agent ran, but the post-install check failed
    VerifyFailed(Error),
}

pub struct Installer {
    service: Arc<dyn DependencyService>,
    resolver: ResolutionClient,
    ui: Arc<dyn UserInterface>,
}

impl Installer {
    pub fn new(service: Arc<dyn DependencyService>, ui: Arc<dyn UserInterface>) -> Self {
        Self {
            resolver: ResolutionClient::new(Arc::clone(&service)),
            service,
            ui,
        }
    }

    /// Launch the agent for `dependencies`, wait for it to exit, then check
    /// the same set again.
    pub async fn install(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> InstallResult {
        self.install_observed(dependencies, silent_embedded_update, || {})
            .await
    }

    /// As [`Installer::install`], calling `on_exit` once the agent has exited
    /// and before re-verification starts.
    pub async fn install_observed<F>(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
        on_exit: F,
    ) -> InstallResult
    where
        F: FnOnce() + Send,
    {
        let names: Vec<&str> = dependencies.iter().map(|d| d.name.as_str()).collect();
        tracing::info!(packages = %names.join(", "), "Installing dependencies");

        let process = match self
            .service
            .install(dependencies, silent_embedded_update)
            .await
        {
            Ok(process) => process,
            Err(e) => {
                tracing::warn!(error = %e, "Installer could not be launched");
                return InstallResult::LaunchFailed(e);
            }
        };

        let process_id = process.id().to_string();
        self.ui.install_started(&process_id);

        let ui = Arc::clone(&self.ui);
        let code = process.wait_with_output(|line| ui.install_output(line)).await;
        tracing::debug!(process = %process_id, ?code, "Installer exited");
        on_exit();

        let result = match self
            .resolver
            .check_unsatisfied(dependencies, silent_embedded_update)
            .await
        {
            Ok(remaining) if remaining.is_empty() => InstallResult::Satisfied,
            Ok(remaining) => {
                tracing::warn!(
                    remaining = remaining.len(),
                    "Dependencies still unsatisfied after install"
                );
                InstallResult::StillUnsatisfied(remaining)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Post-install check failed");
                InstallResult::VerifyFailed(e)
            }
        };

        self.ui.install_finished(&process_id);
        result
    }
}
