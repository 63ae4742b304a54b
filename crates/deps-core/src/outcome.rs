//! Request outcomes and orchestration states

use std::fmt;

use crate::dependency::Dependency;
use crate::resolution::VersionConflict;

pub const INSTALL_FAILED_TITLE: &str = "Dependency installation failed";
pub const CHECK_FAILED_TITLE: &str = "Could not determine available packages";

/// Where a request currently is in its resolution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    Idle,
    CheckingCache,
    ShortCircuitSuccess,
    AwaitingResolution,
    VersionConflict,
    AwaitingConfirmation,
    Declined,
    Installing,
    AwaitingPostInstallVerify,
    Satisfied,
    StillUnsatisfied,
    Failed,
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResolutionState::ShortCircuitSuccess
                | ResolutionState::VersionConflict
                | ResolutionState::Declined
                | ResolutionState::Satisfied
                | ResolutionState::StillUnsatisfied
                | ResolutionState::Failed
        )
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionState::Idle => "idle",
            ResolutionState::CheckingCache => "checking-cache",
            ResolutionState::ShortCircuitSuccess => "short-circuit-success",
            ResolutionState::AwaitingResolution => "awaiting-resolution",
            ResolutionState::VersionConflict => "version-conflict",
            ResolutionState::AwaitingConfirmation => "awaiting-confirmation",
            ResolutionState::Declined => "declined",
            ResolutionState::Installing => "installing",
            ResolutionState::AwaitingPostInstallVerify => "awaiting-post-install-verify",
            ResolutionState::Satisfied => "satisfied",
            ResolutionState::StillUnsatisfied => "still-unsatisfied",
            ResolutionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The remote check failed
    Service(String),
    /// At least one package cannot be offered at its minimum version
    VersionConflict(VersionConflict),
    /// Neither a custom prompt nor a user action was given
    NoConfirmation,
    /// The user said no
    Declined,
    /// The installation agent could not be started
    LaunchFailed(String),
    /// The post-install check itself failed
    VerifyFailed(String),
    /// The agent ran but packages are still unsatisfied
    StillUnsatisfied(Vec<Dependency>),
}

/// A user-visible error dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub title: String,
    pub message: String,
}

impl Failure {
    /// The dialog to show for this failure, or `None` for silent outcomes.
    pub fn report(&self, user_action: Option<&str>) -> Option<ErrorReport> {
        let (title, message) = match self {
            Failure::Service(message) => (CHECK_FAILED_TITLE.to_string(), message.clone()),
            Failure::VersionConflict(conflict) => {
                (VersionConflict::title(user_action), conflict.message())
            }
            Failure::NoConfirmation | Failure::Declined => return None,
            Failure::LaunchFailed(message) => (INSTALL_FAILED_TITLE.to_string(), message.clone()),
            Failure::VerifyFailed(message) => (CHECK_FAILED_TITLE.to_string(), message.clone()),
            Failure::StillUnsatisfied(remaining) => {
                let names: Vec<&str> = remaining.iter().map(|d| d.name.as_str()).collect();
                (
                    INSTALL_FAILED_TITLE.to_string(),
                    format!(
                        "The following packages could not be installed: {}.",
                        names.join(", ")
                    ),
                )
            }
        };
        Some(ErrorReport { title, message })
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Service(message) => write!(f, "dependency check failed: {}", message),
            Failure::VersionConflict(conflict) => {
                write!(f, "version conflict: {}", conflict.describe().trim_end())
            }
            Failure::NoConfirmation => write!(f, "installation requires confirmation"),
            Failure::Declined => write!(f, "installation declined"),
            Failure::LaunchFailed(message) => write!(f, "installer failed to start: {}", message),
            Failure::VerifyFailed(message) => write!(f, "post-install check failed: {}", message),
            Failure::StillUnsatisfied(remaining) => {
                write!(f, "{} package(s) still unsatisfied after install", remaining.len())
            }
        }
    }
}

/// Result of one dependency request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Satisfied {
        /// Dependencies that needed a remote check
        checked: usize,
        /// Dependencies handed to the installation agent
        installed: usize,
    },
    Failed(Failure),
}

impl Outcome {
    pub fn success(&self) -> bool {
        matches!(self, Outcome::Satisfied { .. })
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            Outcome::Satisfied { .. } => None,
        }
    }
}
