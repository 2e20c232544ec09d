#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Could not find element: {0}")]
    GroundingFailure(String),

    #[error("driver action failed: {0}")]
    DriverFailure(String),

    #[error("driver connection lost: {0}")]
    DriverDisconnected(String),

    #[error("judgment strategy unavailable")]
    JudgmentUnavailable,

    #[error("judgment response could not be parsed: {0}")]
    JudgmentParse(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("no agent registered for recipient: {0}")]
    UnroutableRecipient(String),

    #[error("{recipient} cannot handle message type {message_type}")]
    UnexpectedMessage {
        recipient: String,
        message_type: String,
    },
}

impl AgentError {
    /// Errors that end a run instead of degrading into a failed step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::DriverDisconnected(_)
                | AgentError::UnroutableRecipient(_)
                | AgentError::UnexpectedMessage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(AgentError::DriverDisconnected("adb".to_string()).is_fatal());
        assert!(AgentError::UnroutableRecipient("verifier".to_string()).is_fatal());
        assert!(!AgentError::GroundingFailure("WiFi".to_string()).is_fatal());
        assert!(!AgentError::JudgmentUnavailable.is_fatal());
        assert_eq!(
            AgentError::GroundingFailure("WiFi option".to_string()).to_string(),
            "Could not find element: WiFi option"
        );
    }
}
