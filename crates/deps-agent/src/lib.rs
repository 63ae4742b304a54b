//! Subprocess-backed collaborators for deps.
//!
//! [`CommandService`] implements [`deps_core::DependencyService`] by running
//! an external agent program configured through [`AgentConfig`].

pub mod config;
pub mod error;
pub mod service;

pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use service::{AgentRequest, CommandService, SILENT_UPDATE_ENV, parse_check_output};
