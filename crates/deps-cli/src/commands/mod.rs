//! Command implementations

mod check;
mod ensure;
mod features;
mod install;

pub use check::run_check;
pub use ensure::run_ensure;
pub use features::run_features;
pub use install::run_install;

use std::sync::Arc;

use deps_agent::CommandService;
use deps_catalog::{Catalog, FeatureGate};
use deps_core::DependencyManager;

use crate::config::DepsConfig;
use crate::error::Result;
use crate::interactive::TerminalInterface;

/// Everything a command needs, wired from the loaded configuration.
pub struct Context {
    pub catalog: Arc<Catalog>,
    pub manager: DependencyManager,
    pub ui: Arc<TerminalInterface>,
}

impl Context {
    pub fn new(config: DepsConfig, assume_yes: bool) -> Result<Self> {
        let catalog = Arc::new(config.catalog()?);
        let ui = Arc::new(TerminalInterface::new(assume_yes));
        let service = Arc::new(CommandService::new(config.agent));
        let manager = DependencyManager::new(service, ui.clone(), config.manager);
        Ok(Self {
            catalog,
            manager,
            ui,
        })
    }

    pub fn gate(&self) -> FeatureGate {
        FeatureGate::new(
            Arc::clone(&self.catalog),
            self.manager.clone(),
            self.ui.clone(),
        )
    }
}
