//! The dependency manager: cache filter, remote check, confirmation, install
//!
//! Requests go through a single [`RequestQueue`]. Whoever enqueues into an
//! idle queue spawns a driver task that services requests one after another
//! until the queue drains, so at most one resolution/installation cycle is
//! ever running.
//!
//! Each request walks the states in [`ResolutionState`]:
//!
//! ```text
//! Idle -> CheckingCache -> ShortCircuitSuccess
//!                       -> AwaitingResolution -> Satisfied
//!                                             -> VersionConflict
//!                                             -> AwaitingConfirmation -> Declined
//!                                                                     -> Installing
//!                                                                        -> AwaitingPostInstallVerify
//!                                                                           -> Satisfied | StillUnsatisfied
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::cache::SatisfiedCache;
use crate::config::ManagerConfig;
use crate::confirm::{self, Decision};
use crate::dependency::Dependency;
use crate::events::ManagerEvent;
use crate::installer::{InstallResult, Installer};
use crate::outcome::{Failure, Outcome, ResolutionState};
use crate::queue::RequestQueue;
use crate::request::{Completion, DependencyRequest, RequestMode};
use crate::resolution::{ResolutionClient, VersionConflict};
use crate::service::DependencyService;
use crate::ui::UserInterface;
use crate::{Error, Result};

struct Queued {
    id: u64,
    request: DependencyRequest,
    on_complete: Option<Completion>,
    outcome: oneshot::Sender<Outcome>,
}

struct Inner {
    config: ManagerConfig,
    resolver: ResolutionClient,
    installer: Installer,
    ui: Arc<dyn UserInterface>,
    cache: SatisfiedCache,
    queue: RequestQueue<Queued>,
    state: watch::Sender<ResolutionState>,
    next_id: AtomicU64,
    /// Runtime the manager was created in, if any
    runtime: Option<Handle>,
}

/// Resolves and installs dependency requests, one at a time.
///
/// Cloning is cheap and every clone shares the same cache and queue.
///
/// Requests run on the Tokio runtime the manager was created in, so
/// [`DependencyManager::resolve`] may be called from any thread. A manager
/// created outside a runtime uses the caller's runtime instead, and fails
/// requests submitted where there is none.
#[derive(Clone)]
pub struct DependencyManager {
    inner: Arc<Inner>,
}

impl DependencyManager {
    pub fn new(
        service: Arc<dyn DependencyService>,
        ui: Arc<dyn UserInterface>,
        config: ManagerConfig,
    ) -> Self {
        let (state, _) = watch::channel(ResolutionState::Idle);
        Self {
            inner: Arc::new(Inner {
                resolver: ResolutionClient::new(Arc::clone(&service)),
                installer: Installer::new(service, Arc::clone(&ui)),
                ui,
                cache: SatisfiedCache::new(config.cache_policy),
                queue: RequestQueue::new(),
                state,
                next_id: AtomicU64::new(1),
                runtime: Handle::try_current().ok(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &SatisfiedCache {
        &self.inner.cache
    }

    /// Current state of the request being serviced, or `Idle`.
    pub fn state(&self) -> ResolutionState {
        *self.inner.state.borrow()
    }

    /// Observe every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<ResolutionState> {
        self.inner.state.subscribe()
    }

    /// Requests waiting behind the one in flight.
    pub fn pending(&self) -> usize {
        self.inner.queue.pending()
    }

    /// Submit `request`. Its `on_complete` continuation runs exactly once;
    /// the returned future resolves to the outcome after that.
    pub fn resolve(&self, mut request: DependencyRequest) -> PendingResolution {
        let (tx, rx) = oneshot::channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            id,
            label = %request.progress_label,
            count = request.dependencies.len(),
            "Queueing dependency request"
        );

        let on_complete = request.take_completion();
        let Some(runtime) = self.inner.runtime.clone().or_else(|| Handle::try_current().ok())
        else {
            tracing::warn!(id, "No Tokio runtime to run the dependency request on");
            let outcome = Outcome::Failed(Failure::Service(Error::NoRuntime.to_string()));
            complete(id, on_complete, outcome, tx);
            return PendingResolution { receiver: rx };
        };

        let queued = Queued {
            id,
            request,
            on_complete,
            outcome: tx,
        };
        if let Some(head) = self.inner.queue.enqueue(queued) {
            runtime.spawn(Arc::clone(&self.inner).drive(head));
        }

        PendingResolution { receiver: rx }
    }

    /// Install `names` from the public repository without checking or
    /// asking first, then verify.
    pub fn install_packages<I, S, F>(&self, names: I, on_complete: F) -> PendingResolution
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(bool) + Send + 'static,
    {
        let dependencies = names
            .into_iter()
            .map(|name| Dependency::remote(name, ""))
            .collect();
        self.resolve(DependencyRequest::install(dependencies).on_complete(on_complete))
    }

    /// Which of `dependency` is unsatisfied, bypassing the request queue.
    ///
    /// A cached dependency answers with an empty list and no remote call.
    pub async fn unsatisfied(&self, dependency: &Dependency) -> Result<Vec<Dependency>> {
        self.check(std::slice::from_ref(dependency)).await
    }

    /// Which of `dependencies` are unsatisfied, bypassing the request queue.
    ///
    /// Only uncached entries are sent to the service; the satisfied ones are
    /// cached. Nothing is installed and nothing is reported to the user.
    pub async fn check(&self, dependencies: &[Dependency]) -> Result<Vec<Dependency>> {
        let partition = self.inner.cache.partition(dependencies);
        if partition.is_fully_cached() {
            return Ok(Vec::new());
        }

        let to_check = partition.to_check;
        let unsatisfied = self.inner.resolver.check_unsatisfied(&to_check, false).await?;
        self.inner
            .cache
            .record_checked(partition.generation, &to_check, &unsatisfied);
        Ok(unsatisfied)
    }

    /// The installed package set may have changed: forget every cached entry.
    pub fn on_package_state_changed(&self) {
        tracing::debug!("Package state changed");
        self.inner.cache.clear();
    }

    /// Clear the cache whenever `events` reports a package state change.
    ///
    /// Missed events are treated as a state change.
    pub fn listen(&self, mut events: broadcast::Receiver<ManagerEvent>) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ManagerEvent::PackageStateChanged) => manager.on_package_state_changed(),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Missed manager events; clearing cache");
                        manager.on_package_state_changed();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

/// A successful installer run.
struct Installed {
    count: usize,
    /// Cache generation the post-install check started in
    verified_in: u64,
}

impl Inner {
    fn transition(&self, state: ResolutionState) {
        tracing::debug!(%state, "Dependency request state");
        self.state.send_replace(state);
    }

    /// Service `next` and every request queued behind it.
    async fn drive(self: Arc<Self>, mut next: Queued) {
        loop {
            let Queued {
                id,
                request,
                on_complete,
                outcome: outcome_tx,
            } = next;

            let outcome = match tokio::spawn(Arc::clone(&self).process(id, request)).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(id, error = %e, "Dependency request task failed");
                    self.transition(ResolutionState::Failed);
                    Outcome::Failed(Failure::Service(e.to_string()))
                }
            };

            complete(id, on_complete, outcome, outcome_tx);

            self.transition(ResolutionState::Idle);
            match self.queue.complete() {
                Some(queued) => next = queued,
                None => break,
            }
        }
    }

    async fn process(self: Arc<Self>, id: u64, request: DependencyRequest) -> Outcome {
        let span = tracing::info_span!("dependency_request", id, label = %request.progress_label);
        async {
            let outcome = match request.mode {
                RequestMode::Resolve => self.resolve_request(&request).await,
                RequestMode::InstallOnly => self.install_request(&request).await,
            };

            match &outcome {
                Outcome::Satisfied { checked, installed } => {
                    tracing::debug!(checked, installed, "Dependencies satisfied");
                }
                Outcome::Failed(failure) => {
                    tracing::info!(%failure, "Dependency request failed");
                    if let Some(report) = failure.report(request.action()) {
                        self.ui.report_error(&report.title, &report.message);
                    }
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn resolve_request(&self, request: &DependencyRequest) -> Outcome {
        self.transition(ResolutionState::CheckingCache);
        let partition = self.cache.partition(&request.dependencies);
        if partition.is_fully_cached() {
            self.transition(ResolutionState::ShortCircuitSuccess);
            return Outcome::Satisfied {
                checked: 0,
                installed: 0,
            };
        }
        let generation = partition.generation;
        let to_check = partition.to_check;

        self.transition(ResolutionState::AwaitingResolution);
        let unsatisfied = match self
            .check_with_progress(&request.progress_label, &to_check, request.silent_embedded_update)
            .await
        {
            Ok(unsatisfied) => unsatisfied,
            Err(e) => {
                self.transition(ResolutionState::Failed);
                return Outcome::Failed(Failure::Service(e.user_message()));
            }
        };

        if unsatisfied.is_empty() {
            self.cache.insert_verified(generation, &to_check);
            self.transition(ResolutionState::Satisfied);
            return Outcome::Satisfied {
                checked: to_check.len(),
                installed: 0,
            };
        }

        if let Some(conflict) = VersionConflict::detect(&unsatisfied) {
            self.transition(ResolutionState::VersionConflict);
            return Outcome::Failed(Failure::VersionConflict(conflict));
        }

        self.transition(ResolutionState::AwaitingConfirmation);
        match confirm::confirm(request, &unsatisfied, self.ui.as_ref()).await {
            Decision::Accepted => {}
            Decision::Declined => {
                self.transition(ResolutionState::Declined);
                return Outcome::Failed(Failure::Declined);
            }
            Decision::Unavailable => {
                self.transition(ResolutionState::Declined);
                return Outcome::Failed(Failure::NoConfirmation);
            }
        }

        match self
            .run_installer(&unsatisfied, request.silent_embedded_update)
            .await
        {
            Ok(Installed {
                count: installed,
                verified_in,
            }) => {
                self.cache.record_checked(generation, &to_check, &unsatisfied);
                self.cache.insert_verified(verified_in, &unsatisfied);
                Outcome::Satisfied {
                    checked: to_check.len(),
                    installed,
                }
            }
            Err(failure) => Outcome::Failed(failure),
        }
    }

    async fn install_request(&self, request: &DependencyRequest) -> Outcome {
        match self
            .run_installer(&request.dependencies, request.silent_embedded_update)
            .await
        {
            Ok(installed) => {
                self.cache
                    .insert_verified(installed.verified_in, &request.dependencies);
                Outcome::Satisfied {
                    checked: 0,
                    installed: installed.count,
                }
            }
            Err(failure) => Outcome::Failed(failure),
        }
    }

    async fn run_installer(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> std::result::Result<Installed, Failure> {
        self.transition(ResolutionState::Installing);
        let mut verified_in = self.cache.generation();
        let result = self
            .installer
            .install_observed(dependencies, silent_embedded_update, || {
                // the agent itself may have signalled a package change
                verified_in = self.cache.generation();
                self.transition(ResolutionState::AwaitingPostInstallVerify)
            })
            .await;

        match result {
            InstallResult::Satisfied => {
                self.transition(ResolutionState::Satisfied);
                Ok(Installed {
                    count: dependencies.len(),
                    verified_in,
                })
            }
            InstallResult::StillUnsatisfied(remaining) => {
                self.transition(ResolutionState::StillUnsatisfied);
                Err(Failure::StillUnsatisfied(remaining))
            }
            InstallResult::LaunchFailed(e) => {
                self.transition(ResolutionState::Failed);
                Err(Failure::LaunchFailed(e.user_message()))
            }
            InstallResult::VerifyFailed(e) => {
                self.transition(ResolutionState::Failed);
                Err(Failure::VerifyFailed(e.user_message()))
            }
        }
    }

    /// Remote check that shows `label` only if it outlasts the progress delay.
    async fn check_with_progress(
        &self,
        label: &str,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> Result<Vec<Dependency>> {
        let check = self
            .resolver
            .check_unsatisfied(dependencies, silent_embedded_update);
        tokio::pin!(check);
        let delay = tokio::time::sleep(self.config.progress_delay());
        tokio::pin!(delay);

        let mut shown = false;
        let result = loop {
            tokio::select! {
                result = &mut check => break result,
                _ = &mut delay, if !shown => {
                    shown = true;
                    self.ui.progress_started(&format!("{}...", label));
                }
            }
        };

        if shown {
            self.ui.progress_finished();
        }
        result
    }
}

/// Run the request's continuation, then hand `outcome` to its waiter.
fn complete(
    id: u64,
    on_complete: Option<Completion>,
    outcome: Outcome,
    sender: oneshot::Sender<Outcome>,
) {
    if let Some(on_complete) = on_complete {
        let success = outcome.success();
        if std::panic::catch_unwind(AssertUnwindSafe(move || on_complete(success))).is_err() {
            tracing::error!(id, "Completion callback panicked");
        }
    }
    let _ = sender.send(outcome);
}

/// Outcome of a submitted request, available once its continuation has run.
///
/// Dropping this does not cancel the request.
#[derive(Debug)]
pub struct PendingResolution {
    receiver: oneshot::Receiver<Outcome>,
}

impl Future for PendingResolution {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Outcome::Failed(Failure::Service(Error::ManagerClosed.to_string()))
            })
        })
    }
}
