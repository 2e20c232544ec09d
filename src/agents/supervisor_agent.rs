use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    agent::{
        core::base_agent::{AgentBehavior, BaseAgent},
        types::AgentType,
    },
    error::{Result, agent_error::AgentError},
    judgment::JudgmentStrategy,
    multi_agent::communication::{Message, MessagePayload},
    prompt::builder::build_improvement_prompt,
    shared::{
        context::RunContext,
        report::{Improvement, ImprovementKind, Priority, RunReport, TestReport},
        run_history::RunHistory,
    },
    utils::string_util::JsonPayload,
};

/// Folds a finished run into a report and records it in the shared history.
pub struct SupervisorAgent {
    base: BaseAgent,
    judgment: Arc<dyn JudgmentStrategy>,
    history: Arc<RunHistory>,
}

impl SupervisorAgent {
    pub fn new(id: Option<String>, judgment: Arc<dyn JudgmentStrategy>, history: Arc<RunHistory>) -> Self {
        let id = id.unwrap_or_else(|| BaseAgent::generate_id(&AgentType::Supervisor));
        Self {
            base: BaseAgent::new(id, AgentType::Supervisor),
            judgment,
            history,
        }
    }

    pub fn history(&self) -> Arc<RunHistory> {
        self.history.clone()
    }

    async fn suggest_improvements(&self, report: &RunReport) -> Vec<Improvement> {
        let prompt = build_improvement_prompt(report);
        match self.judgment.generate(&prompt).await {
            Ok(response) => match parse_improvements(&response) {
                Ok(improvements) if !improvements.is_empty() => return improvements,
                Ok(_) => debug!("SupervisorAgent {} got no improvements", self.base.id),
                Err(e) => warn!("SupervisorAgent {} discarding improvements: {}", self.base.id, e),
            },
            Err(e) => debug!("SupervisorAgent {} judgment unavailable: {}", self.base.id, e),
        }
        default_improvements(report)
    }
}

fn parse_improvements(response: &str) -> std::result::Result<Vec<Improvement>, AgentError> {
    let value: Value = serde_json::from_str(response.json_payload())
        .map_err(|e| AgentError::JudgmentParse(e.to_string()))?;
    let items = match value {
        Value::Object(mut map) => map.remove("improvements").unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(items).map_err(|e| AgentError::JudgmentParse(e.to_string()))
}

fn default_improvements(report: &RunReport) -> Vec<Improvement> {
    let mut improvements = Vec::new();
    if report.failed_steps > 0 {
        improvements.push(Improvement {
            kind: ImprovementKind::Robustness,
            suggestion: "Add explicit waits and alternative element selectors for the failing steps"
                .to_string(),
            priority: Priority::High,
        });
    }
    if !report.bugs.is_empty() {
        improvements.push(Improvement {
            kind: ImprovementKind::BugReporting,
            suggestion: "Capture screenshots and device logs when a bug is detected".to_string(),
            priority: Priority::High,
        });
    }
    improvements.push(Improvement {
        kind: ImprovementKind::Coverage,
        suggestion: format!("Add edge-case scenarios for '{}'", report.goal),
        priority: Priority::Medium,
    });
    improvements
}

#[async_trait]
impl AgentBehavior for SupervisorAgent {
    fn get_id(&self) -> &str {
        &self.base.id
    }

    fn get_type(&self) -> AgentType {
        self.base.agent_type
    }

    async fn initialize(&mut self, context: Arc<RunContext>) -> Result<()> {
        self.base.start(context);
        info!("SupervisorAgent {} initialized", self.base.id);
        Ok(())
    }

    async fn process_message(&mut self, message: Message) -> Result<Option<Message>> {
        let MessagePayload::TestCompleted { goal, outcomes, .. } = &message.payload else {
            debug!("SupervisorAgent ignoring message type: {}", message.message_type());
            return Ok(None);
        };

        let run_id = self
            .base
            .run_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let report = RunReport::from_outcomes(run_id, goal.clone(), outcomes.clone());
        let improvements = self.suggest_improvements(&report).await;

        info!(
            "SupervisorAgent {} recorded run {}: {} ({}/{} passed)",
            self.base.id, report.run_id, report.overall_status, report.passed_steps, report.total_steps
        );
        self.history.append(report.clone()).await;

        Ok(Some(Message::response(
            &message,
            AgentType::System,
            MessagePayload::TestReport(TestReport {
                report,
                improvements,
            }),
        )))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.base.stop();
        info!("SupervisorAgent {} shutting down", self.base.id);
        Ok(())
    }

    fn get_status(&self) -> serde_json::Value {
        self.base.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::verification::{VerificationOutcome, VerificationStatus},
        ui::UiSnapshot,
    };

    fn report(statuses: &[VerificationStatus]) -> RunReport {
        let outcomes = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| VerificationOutcome {
                step_id: i as u32 + 1,
                status: *status,
                reason: String::new(),
                confidence: 0.9,
                needs_replanning: false,
                bug_description: None,
                resulting_state: UiSnapshot::default(),
            })
            .collect();
        RunReport::from_outcomes("run", "Test alarms", outcomes)
    }

    #[test]
    fn test_default_improvements() {
        let kinds = |r: &RunReport| default_improvements(r).iter().map(|i| i.kind).collect::<Vec<_>>();
        assert_eq!(kinds(&report(&[VerificationStatus::Passed])), [ImprovementKind::Coverage]);
        assert_eq!(
            kinds(&report(&[VerificationStatus::Failed, VerificationStatus::BugDetected])),
            [ImprovementKind::Robustness, ImprovementKind::BugReporting, ImprovementKind::Coverage]
        );
    }

    #[test]
    fn test_parse_improvements() {
        let parsed = parse_improvements(
            r#"{"improvements": [{"kind": "coverage", "suggestion": "Test airplane mode", "priority": "low"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed[0].priority, Priority::Low);
        assert!(parse_improvements("no suggestions").is_err());
    }
}
