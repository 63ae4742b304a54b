//! Shared fixtures for deps-core integration tests

#![allow(dead_code)]

use std::sync::Arc;

use deps_core::{Dependency, DependencyManager, ManagerConfig};
use deps_test_utils::{FakeInterface, FakeService};

pub fn readr() -> Dependency {
    Dependency::remote("readr", "1.1.0")
}

pub fn manager_with(service: &Arc<FakeService>, ui: &Arc<FakeInterface>) -> DependencyManager {
    manager_with_config(service, ui, ManagerConfig::default())
}

pub fn manager_with_config(
    service: &Arc<FakeService>,
    ui: &Arc<FakeInterface>,
    config: ManagerConfig,
) -> DependencyManager {
    DependencyManager::new(service.clone(), ui.clone(), config)
}
