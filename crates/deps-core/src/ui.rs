//! User interface collaborator
//!
//! Dialogs, progress indicators, and install output panes are owned by the
//! host application. The manager only calls into this trait.

use async_trait::async_trait;

#[async_trait]
pub trait UserInterface: Send + Sync {
    /// Ask a yes/no question. `true` means the user agreed.
    async fn confirm(&self, title: &str, message: &str) -> bool;

    /// Show a failure to the user.
    fn report_error(&self, title: &str, message: &str);

    /// A remote check is taking long enough to show `label`.
    fn progress_started(&self, _label: &str) {}

    /// The indicator shown by `progress_started` can be dismissed.
    fn progress_finished(&self) {}

    /// The installation agent for `process_id` has started.
    fn install_started(&self, _process_id: &str) {}

    /// One line of installation agent output.
    fn install_output(&self, _line: &str) {}

    /// Installation and its re-verification are over.
    fn install_finished(&self, _process_id: &str) {}
}

/// Interface for unattended use: never confirms, logs errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessInterface;

#[async_trait]
impl UserInterface for HeadlessInterface {
    async fn confirm(&self, title: &str, _message: &str) -> bool {
        tracing::info!(title, "Declining confirmation in headless mode");
        false
    }

    fn report_error(&self, title: &str, message: &str) {
        tracing::error!(title, "{}", message);
    }

    fn install_output(&self, line: &str) {
        tracing::debug!(target: "deps::install", "{}", line);
    }
}
