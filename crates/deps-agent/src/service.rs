//! [`DependencyService`] backed by an external agent program
//!
//! Both commands receive a JSON [`AgentRequest`] on stdin, written while
//! their output is being read.
//!
//! Check: `program check_args...` prints a JSON array of the unsatisfied
//! dependencies, annotated with `available_version` and `version_satisfied`.
//!
//! Install: `program install_args... <name>...` runs to completion; every
//! stdout/stderr line is forwarded to the process handle. The exit code is
//! reported but not interpreted.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use deps_core::{Dependency, DependencyService, ProcessHandle};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::mpsc;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};

/// Environment variable telling the agent whether embedded packages may be
/// upgraded without asking.
pub const SILENT_UPDATE_ENV: &str = "DEPS_SILENT_EMBEDDED_UPDATE";

/// Body written to the agent's stdin.
#[derive(Debug, Serialize)]
pub struct AgentRequest<'a> {
    pub silent_embedded_update: bool,
    pub dependencies: &'a [Dependency],
}

impl AgentRequest<'_> {
    fn to_payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| AgentError::ParseError(e.to_string()))
    }
}

pub struct CommandService {
    config: AgentConfig,
}

impl CommandService {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn command(&self, args: &[String], silent_embedded_update: bool) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(args)
            .envs(&self.config.env)
            .env(SILENT_UPDATE_ENV, silent_embedded_update.to_string());
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> AgentError {
        AgentError::Spawn {
            program: self.config.program.clone(),
            source,
        }
    }

    async fn run_check(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> Result<Vec<Dependency>> {
        let payload = AgentRequest {
            silent_embedded_update,
            dependencies,
        }
        .to_payload()?;

        let mut child = self
            .command(&self.config.check_args, silent_embedded_update)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdin = child.stdin.take();
        let (written, output) =
            tokio::join!(write_request(stdin, payload), child.wait_with_output());
        let output = output?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(AgentError::CommandFailed { code, stderr });
        }
        written?;

        parse_check_output(&output.stdout)
    }

    fn spawn_install(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> Result<ProcessHandle> {
        let payload = AgentRequest {
            silent_embedded_update,
            dependencies,
        }
        .to_payload()?;

        let mut child = self
            .command(&self.config.install_args, silent_embedded_update)
            .args(dependencies.iter().map(|d| d.name.as_str()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let id = format!("{}:{}", self.config.program, child.id().unwrap_or_default());
        let (handle, reporter) = ProcessHandle::channel(id.clone());
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        tokio::spawn(async move {
            let written = tokio::spawn(write_request(stdin, payload));
            let stdout = tokio::spawn(forward_lines(stdout, reporter.output_sender()));
            let stderr = tokio::spawn(forward_lines(stderr, reporter.output_sender()));

            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    tracing::warn!(process = %id, error = %e, "Failed to wait for agent");
                    None
                }
            };
            if let Ok(Err(e)) = written.await {
                tracing::warn!(process = %id, error = %e, "Failed to send request to agent");
            }
            let _ = stdout.await;
            let _ = stderr.await;

            tracing::debug!(process = %id, ?code, "Agent exited");
            reporter.exited(code);
        });

        Ok(handle)
    }
}

/// Parse the agent's check answer. Blank output means nothing is unsatisfied.
pub fn parse_check_output(stdout: &[u8]) -> Result<Vec<Dependency>> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|e| AgentError::ParseError(e.to_string()))
}

/// Write the request and close stdin. An agent that exits without reading
/// it is not an error.
async fn write_request(stdin: Option<ChildStdin>, payload: Vec<u8>) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(&payload).await {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}

async fn forward_lines<R>(reader: Option<R>, sender: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if sender.send(line).is_err() {
            break;
        }
    }
}

#[async_trait]
impl DependencyService for CommandService {
    async fn check_unsatisfied(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> deps_core::Result<Vec<Dependency>> {
        tracing::debug!(
            program = %self.config.program,
            count = dependencies.len(),
            "Running agent check"
        );
        Ok(self.run_check(dependencies, silent_embedded_update).await?)
    }

    async fn install(
        &self,
        dependencies: &[Dependency],
        silent_embedded_update: bool,
    ) -> deps_core::Result<ProcessHandle> {
        tracing::info!(program = %self.config.program, "Launching agent install");
        Ok(self.spawn_install(dependencies, silent_embedded_update)?)
    }
}
