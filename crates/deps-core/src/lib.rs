//! Dependency resolution and installation orchestration.
//!
//! This crate decides *whether* an external installation agent has to run
//! for a set of required packages, and interprets its outcome:
//!
//! - [`SatisfiedCache`] remembers packages already known to be present
//! - [`RequestQueue`] keeps at most one resolution/installation cycle in flight
//! - [`ResolutionClient`] asks the remote service which packages are unsatisfied
//! - [`confirm`] asks the user (or a caller-supplied [`PromptStrategy`])
//! - [`Installer`] launches the agent and re-verifies after it exits
//! - [`DependencyManager`] composes all of the above behind `resolve`
//!
//! The remote service and the user interface are collaborators expressed as
//! the [`DependencyService`] and [`UserInterface`] traits.

pub mod cache;
pub mod config;
pub mod confirm;
pub mod dependency;
pub mod error;
pub mod events;
pub mod installer;
pub mod manager;
pub mod outcome;
pub mod queue;
pub mod request;
pub mod resolution;
pub mod service;
pub mod ui;

pub use cache::{CachePolicy, Partition, SatisfiedCache};
pub use config::ManagerConfig;
pub use dependency::{Dependency, DependencyKey, DependencyKind, compare_versions};
pub use error::{Error, Result};
pub use events::{EventBus, ManagerEvent};
pub use installer::{InstallResult, Installer};
pub use manager::{DependencyManager, PendingResolution};
pub use outcome::{ErrorReport, Failure, Outcome, ResolutionState};
pub use queue::RequestQueue;
pub use request::{DependencyRequest, PromptStrategy, RequestMode};
pub use resolution::{ResolutionClient, VersionConflict};
pub use service::{DependencyService, ProcessHandle, ProcessReporter};
pub use ui::{HeadlessInterface, UserInterface};
