//! Dependency requests submitted to the manager

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::dependency::Dependency;

/// Caller-supplied confirmation, used instead of the default dialog.
#[async_trait]
pub trait PromptStrategy: Send + Sync {
    /// `unsatisfied` is the comma-joined list of package names to install.
    async fn prompt(&self, unsatisfied: &str) -> bool;
}

#[async_trait]
impl<F> PromptStrategy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn prompt(&self, unsatisfied: &str) -> bool {
        self(unsatisfied)
    }
}

pub(crate) type Completion = Box<dyn FnOnce(bool) + Send>;

/// What the manager does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Filter through the cache, check remotely, confirm, install
    #[default]
    Resolve,
    /// Install straight away and verify; no check or confirmation
    InstallOnly,
}

/// A set of packages a feature needs, plus how to ask about installing them.
pub struct DependencyRequest {
    pub(crate) progress_label: String,
    pub(crate) user_action: Option<String>,
    pub(crate) prompt: Option<Arc<dyn PromptStrategy>>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) silent_embedded_update: bool,
    on_complete: Mutex<Option<Completion>>,
    pub(crate) mode: RequestMode,
}

impl DependencyRequest {
    pub fn new(progress_label: impl Into<String>, dependencies: Vec<Dependency>) -> Self {
        Self {
            progress_label: progress_label.into(),
            user_action: None,
            prompt: None,
            dependencies,
            silent_embedded_update: false,
            on_complete: Mutex::new(None),
            mode: RequestMode::Resolve,
        }
    }

    /// An install-only request for `dependencies`.
    pub fn install(dependencies: Vec<Dependency>) -> Self {
        Self {
            mode: RequestMode::InstallOnly,
            ..Self::new("Installing packages", dependencies)
        }
    }

    /// Why the install is happening; also enables the default confirmation.
    pub fn user_action(mut self, action: impl Into<String>) -> Self {
        let action = action.into();
        self.user_action = (!action.trim().is_empty()).then_some(action);
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn PromptStrategy>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn silent_embedded_update(mut self, allow: bool) -> Self {
        self.silent_embedded_update = allow;
        self
    }

    /// Continuation invoked exactly once with the overall success flag.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(bool) + Send + 'static,
    {
        self.on_complete = Mutex::new(Some(Box::new(f)));
        self
    }

    /// Detach the completion continuation so it can run exactly once.
    pub(crate) fn take_completion(&mut self) -> Option<Completion> {
        self.on_complete
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn progress_label(&self) -> &str {
        &self.progress_label
    }

    pub fn action(&self) -> Option<&str> {
        self.user_action.as_deref()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn allows_silent_embedded_update(&self) -> bool {
        self.silent_embedded_update
    }

    pub fn has_prompt(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }
}

impl fmt::Debug for DependencyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRequest")
            .field("progress_label", &self.progress_label)
            .field("user_action", &self.user_action)
            .field("prompt", &self.prompt.is_some())
            .field("dependencies", &self.dependencies)
            .field("silent_embedded_update", &self.silent_embedded_update)
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = DependencyRequest::new("R Markdown", vec![Dependency::remote("rmarkdown", "1.12")]);
        assert_eq!(req.progress_label(), "R Markdown");
        assert_eq!(req.action(), None);
        assert!(!req.has_prompt());
        assert!(!req.allows_silent_embedded_update());
        assert_eq!(req.mode(), RequestMode::Resolve);
    }

    #[test]
    fn test_blank_user_action_is_absent() {
        let req = DependencyRequest::new("x", vec![]).user_action("   ");
        assert_eq!(req.action(), None);
    }

    #[test]
    fn test_completion_taken_once() {
        let mut req = DependencyRequest::new("x", vec![]).on_complete(|_| {});
        assert!(req.take_completion().is_some());
        assert!(req.take_completion().is_none());
    }

    #[test]
    fn test_install_request_mode() {
        let req = DependencyRequest::install(vec![Dependency::remote("DBI", "")]);
        assert_eq!(req.mode(), RequestMode::InstallOnly);
        assert_eq!(req.dependencies().len(), 1);
    }

    #[tokio::test]
    async fn test_closure_prompt_strategy() {
        let prompt: Arc<dyn PromptStrategy> = Arc::new(|names: &str| names.contains("shiny"));
        assert!(prompt.prompt("shiny, httpuv").await);
        assert!(!prompt.prompt("knitr").await);
    }
}
