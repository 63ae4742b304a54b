//! Error types for agent operations

/// Errors that can occur while talking to the agent program
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The agent program could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while exchanging data with the agent
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent exited with non-zero status
    #[error("Agent failed (exit code {code}): {stderr}")]
    CommandFailed { code: i32, stderr: String },

    /// Agent output was not the expected JSON
    #[error("Failed to parse agent output: {0}")]
    ParseError(String),
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<AgentError> for deps_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Spawn { .. } => deps_core::Error::launch(err.to_string()),
            other => deps_core::Error::service(other.to_string()),
        }
    }
}
