//! Text-in/text-out capability used to synthesize plans, verdicts and
//! improvement suggestions.

pub mod llm;

use async_trait::async_trait;

use crate::error::{Result, agent_error::AgentError};

pub use llm::LlmJudgment;

/// Callers treat both `Err` and unparsable text as "no judgment" and fall back
/// to their deterministic rules.
#[async_trait]
pub trait JudgmentStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Never produces text, so every caller runs its built-in rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedJudgment;

#[async_trait]
impl JudgmentStrategy for RuleBasedJudgment {
    fn name(&self) -> &str {
        "rule-based"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(AgentError::JudgmentUnavailable.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_rule_based_is_always_unavailable() {
        let judgment = RuleBasedJudgment;
        let result = judgment.generate("anything").await;
        assert!(matches!(
            result,
            Err(Error::AgentError(AgentError::JudgmentUnavailable))
        ));
    }
}
