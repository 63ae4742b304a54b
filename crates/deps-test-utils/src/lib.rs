//! In-memory collaborators for exercising the dependency manager.
//!
//! - [`FakeService`] simulates a package library and repository
//! - [`FakeInterface`] records dialogs, errors, progress, and install output
//! - [`ScriptedPrompt`] is a custom prompt strategy with a fixed answer

mod interface;
mod service;

pub use interface::{FakeInterface, ScriptedPrompt, UiEvent};
pub use service::{FakeService, Gate};
