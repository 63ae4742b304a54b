use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use deps_core::{PromptStrategy, UserInterface};

/// Something the manager asked the interface to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Confirm { title: String, message: String },
    Error { title: String, message: String },
    ProgressStarted(String),
    ProgressFinished,
    InstallStarted(String),
    InstallOutput(String),
    InstallFinished(String),
}

/// Records every interaction and answers confirmations with a fixed value.
#[derive(Debug)]
pub struct FakeInterface {
    answer: AtomicBool,
    events: Mutex<Vec<UiEvent>>,
}

impl FakeInterface {
    /// An interface whose user answers every confirmation with `answer`.
    pub fn answering(answer: bool) -> Self {
        Self {
            answer: AtomicBool::new(answer),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn set_answer(&self, answer: bool) {
        self.answer.store(answer, Ordering::SeqCst);
    }

    fn push(&self, event: UiEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// `(title, message)` of every confirmation shown.
    pub fn confirmations(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Confirm { title, message } => Some((title, message)),
                _ => None,
            })
            .collect()
    }

    /// `(title, message)` of every error reported.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Error { title, message } => Some((title, message)),
                _ => None,
            })
            .collect()
    }

    pub fn install_output(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::InstallOutput(line) => Some(line),
                _ => None,
            })
            .collect()
    }
}

impl Default for FakeInterface {
    fn default() -> Self {
        Self::answering(true)
    }
}

#[async_trait]
impl UserInterface for FakeInterface {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        self.push(UiEvent::Confirm {
            title: title.to_string(),
            message: message.to_string(),
        });
        self.answer.load(Ordering::SeqCst)
    }

    fn report_error(&self, title: &str, message: &str) {
        self.push(UiEvent::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn progress_started(&self, label: &str) {
        self.push(UiEvent::ProgressStarted(label.to_string()));
    }

    fn progress_finished(&self) {
        self.push(UiEvent::ProgressFinished);
    }

    fn install_started(&self, process_id: &str) {
        self.push(UiEvent::InstallStarted(process_id.to_string()));
    }

    fn install_output(&self, line: &str) {
        self.push(UiEvent::InstallOutput(line.to_string()));
    }

    fn install_finished(&self, process_id: &str) {
        self.push(UiEvent::InstallFinished(process_id.to_string()));
    }
}

/// Custom prompt strategy that records what it was asked.
#[derive(Debug)]
pub struct ScriptedPrompt {
    answer: bool,
    calls: AtomicUsize,
    last: Mutex<Option<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The unsatisfied package list passed to the most recent prompt.
    pub fn last_prompt(&self) -> Option<String> {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PromptStrategy for ScriptedPrompt {
    async fn prompt(&self, unsatisfied: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(unsatisfied.to_string());
        self.answer
    }
}
