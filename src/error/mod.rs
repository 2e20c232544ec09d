pub mod agent_error;

use std::io;

use thiserror::Error as ThisError;

use crate::error::agent_error::AgentError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serde_json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("model error: {0}")]
    ModelError(#[from] model_gateway_rs::error::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("agent error: {0}")]
    AgentError(#[from] AgentError),
}

impl Error {
    pub fn as_agent_error(&self) -> Option<&AgentError> {
        match self {
            Error::AgentError(e) => Some(e),
            _ => None,
        }
    }

    /// Errors that abort a run instead of becoming a failed step.
    ///
    /// Only agent-level faults are recoverable; anything else (I/O, model
    /// transport, config) is treated as fatal when it reaches the executor.
    pub fn is_fatal(&self) -> bool {
        self.as_agent_error().is_none_or(AgentError::is_fatal)
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_agent_faults_are_recoverable() {
        let failure: Error = AgentError::DriverFailure("tap rejected".to_string()).into();
        assert!(!failure.is_fatal());

        let lost: Error = AgentError::DriverDisconnected("usb".to_string()).into();
        assert!(lost.is_fatal());

        let io: Error = io::Error::other("pipe closed").into();
        assert!(io.is_fatal());
        assert!(io.as_agent_error().is_none());
    }
}
