//! Error types for deps-core

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The resolution service could not answer
    #[error("{message}")]
    Service { message: String },

    /// The installation agent could not be started
    #[error("Failed to launch installer: {message}")]
    Launch { message: String },

    /// The manager's driver went away before the request completed
    #[error("Dependency manager shut down before the request completed")]
    ManagerClosed,

    /// A request was submitted with no Tokio runtime to run it on
    #[error("No async runtime is available to run the dependency request")]
    NoRuntime,

    #[error("Invalid dependency: {reason}")]
    InvalidDependency { reason: String },
}

impl Error {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub fn invalid_dependency(reason: impl Into<String>) -> Self {
        Self::InvalidDependency {
            reason: reason.into(),
        }
    }

    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch {
            message: message.into(),
        }
    }

    /// Message suitable for showing to a user, without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            Error::Service { message } | Error::Launch { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = Error::service("connection refused");
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.user_message(), "connection refused");
    }

    #[test]
    fn test_launch_error_user_message_drops_prefix() {
        let err = Error::launch("no such program: Rscript");
        assert!(err.to_string().starts_with("Failed to launch installer"));
        assert_eq!(err.user_message(), "no such program: Rscript");
    }
}
