//! Running catalog features through the dependency manager

use std::sync::Arc;

use deps_core::{
    Dependency, DependencyManager, DependencyRequest, ManagerEvent, Outcome, UserInterface,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::capabilities::Capabilities;
use crate::catalog::Catalog;
use crate::Result;
use crate::prompt::TemplatePrompt;

/// Resolves catalog features and switches their capabilities on once their
/// packages are present.
#[derive(Clone)]
pub struct FeatureGate {
    catalog: Arc<Catalog>,
    manager: DependencyManager,
    ui: Arc<dyn UserInterface>,
    capabilities: Arc<Capabilities>,
}

impl FeatureGate {
    pub fn new(
        catalog: Arc<Catalog>,
        manager: DependencyManager,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        Self {
            catalog,
            manager,
            ui,
            capabilities: Arc::new(Capabilities::new()),
        }
    }

    /// Share an existing capability set instead of a fresh one.
    pub fn with_capabilities(mut self, capabilities: Arc<Capabilities>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn manager(&self) -> &DependencyManager {
        &self.manager
    }

    pub fn capabilities(&self) -> &Arc<Capabilities> {
        &self.capabilities
    }

    /// Build the request for feature `id`.
    ///
    /// A blank or missing `user_action` falls back to the feature's own.
    pub fn request_for(&self, id: &str, user_action: Option<&str>) -> Result<DependencyRequest> {
        let feature = self.catalog.feature(id)?;
        let dependencies = self.catalog.dependencies(id)?;
        let action = user_action
            .filter(|a| !a.trim().is_empty())
            .or(feature.action.as_deref());

        let mut request = DependencyRequest::new(feature.label.clone(), dependencies)
            .silent_embedded_update(feature.silent_embedded_update);
        if let Some(action) = action {
            request = request.user_action(action);
        }
        if let Some(prompt) = &feature.prompt {
            let prompt = TemplatePrompt::new(
                prompt.clone(),
                action.unwrap_or(&feature.label),
                Arc::clone(&self.ui),
            );
            request = request.prompt(Arc::new(prompt));
        }
        Ok(request)
    }

    /// Make sure feature `id`'s packages are installed, asking the user first.
    ///
    /// On success the feature's capabilities are enabled before this returns.
    pub async fn ensure(&self, id: &str, user_action: Option<&str>) -> Result<Outcome> {
        let request = self.request_for(id, user_action)?;
        let enables = self.catalog.feature(id)?.enables.clone();
        let capabilities = Arc::clone(&self.capabilities);

        let request = request.on_complete(move |succeeded| {
            if succeeded {
                capabilities.enable(enables);
            }
        });
        Ok(self.manager.resolve(request).await)
    }

    /// As [`FeatureGate::ensure`], collapsed to success or failure.
    pub async fn with_feature(&self, id: &str, user_action: Option<&str>) -> Result<bool> {
        Ok(self.ensure(id, user_action).await?.success())
    }

    /// Which of feature `id`'s packages are unsatisfied, without installing.
    pub async fn check(&self, id: &str) -> Result<Vec<Dependency>> {
        let dependencies = self.catalog.dependencies(id)?;
        Ok(self.manager.check(&dependencies).await?)
    }

    /// Service `FeatureRequested` events until the bus closes.
    pub fn listen(&self, mut events: broadcast::Receiver<ManagerEvent>) -> JoinHandle<()> {
        let gate = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ManagerEvent::FeatureRequested {
                        feature,
                        user_action,
                    }) => {
                        let gate = gate.clone();
                        tokio::spawn(async move {
                            let action = Some(user_action.as_str());
                            if let Err(e) = gate.with_feature(&feature, action).await {
                                tracing::warn!(%feature, error = %e, "Feature request failed");
                            }
                        });
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Missed feature requests");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
