//! Simulated package library and repository.
//!
//! The library holds installed versions, the repository the versions that
//! could be installed. Checks compare requests against the library;
//! installs copy repository versions into it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use deps_core::{Dependency, DependencyService, Error, ProcessHandle, Result};
use tokio::sync::watch;

#[derive(Debug, Default)]
struct State {
    installed: HashMap<String, String>,
    repository: HashMap<String, String>,
    check_calls: Vec<Vec<Dependency>>,
    install_calls: Vec<Vec<Dependency>>,
    check_failures: VecDeque<String>,
    install_failure: Option<String>,
    install_is_noop: bool,
    exit_code: i32,
}

/// Holds back checks until opened.
#[derive(Debug)]
pub struct Gate {
    sender: watch::Sender<bool>,
}

impl Gate {
    /// Let every held and future check through.
    pub fn open(&self) {
        self.sender.send_replace(true);
    }
}

/// A [`DependencyService`] backed by in-memory maps.
#[derive(Debug, Default)]
pub struct FakeService {
    state: Mutex<State>,
    gate: Mutex<Option<watch::Receiver<bool>>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Builder: `name` is installed at `version`.
    pub fn with_installed(self, name: &str, version: &str) -> Self {
        self.set_installed(name, version);
        self
    }

    /// Builder: the repository offers `name` at `version`.
    pub fn with_available(self, name: &str, version: &str) -> Self {
        self.lock()
            .repository
            .insert(name.to_string(), version.to_string());
        self
    }

    pub fn set_installed(&self, name: &str, version: &str) {
        self.lock()
            .installed
            .insert(name.to_string(), version.to_string());
    }

    pub fn uninstall(&self, name: &str) {
        self.lock().installed.remove(name);
    }

    pub fn installed_version(&self, name: &str) -> Option<String> {
        self.lock().installed.get(name).cloned()
    }

    /// The next check fails with `message`.
    pub fn fail_next_check(&self, message: &str) {
        self.lock().check_failures.push_back(message.to_string());
    }

    /// Every install launch fails with `message`.
    pub fn fail_install(&self, message: &str) {
        self.lock().install_failure = Some(message.to_string());
    }

    /// The agent exits without installing anything.
    pub fn install_is_noop(&self) {
        self.lock().install_is_noop = true;
    }

    pub fn set_exit_code(&self, code: i32) {
        self.lock().exit_code = code;
    }

    /// Hold every check until the returned gate is opened.
    pub fn hold_checks(&self) -> Gate {
        let (sender, receiver) = watch::channel(false);
        *self.gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(receiver);
        Gate { sender }
    }

    pub fn check_calls(&self) -> Vec<Vec<Dependency>> {
        self.lock().check_calls.clone()
    }

    pub fn install_calls(&self) -> Vec<Vec<Dependency>> {
        self.lock().install_calls.clone()
    }

    pub fn check_count(&self) -> usize {
        self.lock().check_calls.len()
    }

    pub fn install_count(&self) -> usize {
        self.lock().install_calls.len()
    }

    /// Wait until at least `count` checks have been issued.
    pub async fn wait_for_checks(&self, count: usize) {
        while self.check_count() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn evaluate(state: &State, dependency: &Dependency) -> Option<Dependency> {
        if let Some(version) = state.installed.get(&dependency.name)
            && dependency.accepts(version)
        {
            return None;
        }

        let available = state.repository.get(&dependency.name);
        let satisfied = available.is_some_and(|version| dependency.accepts(version));
        Some(
            dependency
                .clone()
                .with_available(available.map(String::as_str), satisfied),
        )
    }
}

#[async_trait]
impl DependencyService for FakeService {
    async fn check_unsatisfied(
        &self,
        dependencies: &[Dependency],
        _silent_embedded_update: bool,
    ) -> Result<Vec<Dependency>> {
        let failure = {
            let mut state = self.lock();
            state.check_calls.push(dependencies.to_vec());
            state.check_failures.pop_front()
        };

        let gate = self.gate.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }

        if let Some(message) = failure {
            return Err(Error::service(message));
        }

        let state = self.lock();
        Ok(dependencies
            .iter()
            .filter_map(|dependency| Self::evaluate(&state, dependency))
            .collect())
    }

    async fn install(
        &self,
        dependencies: &[Dependency],
        _silent_embedded_update: bool,
    ) -> Result<ProcessHandle> {
        let mut state = self.lock();
        state.install_calls.push(dependencies.to_vec());
        if let Some(message) = &state.install_failure {
            return Err(Error::launch(message.clone()));
        }

        let (handle, reporter) =
            ProcessHandle::channel(format!("install-{}", state.install_calls.len()));
        for dependency in dependencies {
            reporter.output(format!("Installing package '{}'", dependency.name));
            if !state.install_is_noop {
                let version = state
                    .repository
                    .get(&dependency.name)
                    .cloned()
                    .unwrap_or_else(|| dependency.min_version.clone());
                state.installed.insert(dependency.name.clone(), version);
            }
        }
        reporter.exited(Some(state.exit_code));
        Ok(handle)
    }
}
