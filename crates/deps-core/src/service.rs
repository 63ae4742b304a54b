//! Remote resolution/installation service collaborator

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::Result;
use crate::dependency::Dependency;

/// The remote side that knows which packages are installed and can run the
/// installation agent.
#[async_trait]
pub trait DependencyService: Send + Sync {
    /// Return the subset of `dependencies` that is not satisfied, each
    /// annotated with `available_version` and `version_satisfied`.
    async fn check_unsatisfied(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> Result<Vec<Dependency>>;

    /// Launch the installation agent for `dependencies`.
    async fn install(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> Result<ProcessHandle>;
}

/// Handle to a running installation process: its output lines and a
/// one-shot exit notification.
#[derive(Debug)]
pub struct ProcessHandle {
    id: String,
    output: mpsc::UnboundedReceiver<String>,
    exit: oneshot::Receiver<Option<i32>>,
}

/// Producer side of a [`ProcessHandle`], held by whoever runs the process.
#[derive(Debug)]
pub struct ProcessReporter {
    output: mpsc::UnboundedSender<String>,
    exit: oneshot::Sender<Option<i32>>,
}

impl ProcessHandle {
    /// Create a handle and the reporter that feeds it.
    pub fn channel(id: impl Into<String>) -> (ProcessHandle, ProcessReporter) {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();
        (
            ProcessHandle {
                id: id.into(),
                output: output_rx,
                exit: exit_rx,
            },
            ProcessReporter {
                output: output_tx,
                exit: exit_tx,
            },
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the process to exit, passing each output line to `on_output`.
    ///
    /// Returns the exit code if one was reported. A reporter dropped without
    /// calling [`ProcessReporter::exited`] counts as an exit with no code.
    pub async fn wait_with_output<F>(mut self, mut on_output: F) -> Option<i32>
    where
        F: FnMut(&str) + Send,
    {
        let mut output_open = true;
        loop {
            tokio::select! {
                line = self.output.recv(), if output_open => match line {
                    Some(line) => on_output(&line),
                    None => output_open = false,
                },
                status = &mut self.exit => {
                    while let Ok(line) = self.output.try_recv() {
                        on_output(&line);
                    }
                    return status.ok().flatten();
                }
            }
        }
    }
}

impl ProcessReporter {
    /// Forward one line of process output. Lines sent after the handle is
    /// dropped are discarded.
    pub fn output(&self, line: impl Into<String>) {
        let _ = self.output.send(line.into());
    }

    /// A sender for output lines that can be moved into reader tasks.
    pub fn output_sender(&self) -> mpsc::UnboundedSender<String> {
        self.output.clone()
    }

    /// Signal the exit notification. Consumes the reporter so it fires once.
    pub fn exited(self, code: Option<i32>) {
        let _ = self.exit.send(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_collects_output_and_code() {
        let (handle, reporter) = ProcessHandle::channel("install-1");
        assert_eq!(handle.id(), "install-1");

        reporter.output("downloading readr");
        reporter.output("installing readr");
        reporter.exited(Some(0));

        let mut lines = Vec::new();
        let code = handle.wait_with_output(|line| lines.push(line.to_string())).await;

        assert_eq!(code, Some(0));
        assert_eq!(lines, vec!["downloading readr", "installing readr"]);
    }

    #[tokio::test]
    async fn test_dropped_reporter_counts_as_exit() {
        let (handle, reporter) = ProcessHandle::channel("install-2");
        drop(reporter);
        let code = handle.wait_with_output(|_| {}).await;
        assert_eq!(code, None);
    }

    #[tokio::test]
    async fn test_output_from_background_task() {
        let (handle, reporter) = ProcessHandle::channel("install-3");
        tokio::spawn(async move {
            let sender = reporter.output_sender();
            for i in 0..3 {
                let _ = sender.send(format!("line {}", i));
                tokio::task::yield_now().await;
            }
            reporter.exited(Some(1));
        });

        let mut count = 0;
        let code = handle.wait_with_output(|_| count += 1).await;
        assert_eq!(code, Some(1));
        assert_eq!(count, 3);
    }
}
