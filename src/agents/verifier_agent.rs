use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    agent::{
        core::base_agent::{AgentBehavior, BaseAgent},
        types::AgentType,
        verification::{OverallStatus, Verifier},
    },
    error::Result,
    judgment::JudgmentStrategy,
    multi_agent::communication::{Message, MessagePayload},
    shared::context::{QaConfig, RunContext},
};

/// Classifies execution results and decides between replanning and reporting.
pub struct VerifierAgent {
    base: BaseAgent,
    verifier: Verifier,
    verified_steps: usize,
}

impl VerifierAgent {
    pub fn new(id: Option<String>, judgment: Arc<dyn JudgmentStrategy>, config: Arc<QaConfig>) -> Self {
        let id = id.unwrap_or_else(|| BaseAgent::generate_id(&AgentType::Verifier));
        Self {
            base: BaseAgent::new(id, AgentType::Verifier),
            verifier: Verifier::new(judgment, &config),
            verified_steps: 0,
        }
    }
}

#[async_trait]
impl AgentBehavior for VerifierAgent {
    fn get_id(&self) -> &str {
        &self.base.id
    }

    fn get_type(&self) -> AgentType {
        self.base.agent_type
    }

    async fn initialize(&mut self, context: Arc<RunContext>) -> Result<()> {
        self.base.start(context);
        self.verified_steps = 0;
        info!("VerifierAgent {} initialized", self.base.id);
        Ok(())
    }

    async fn process_message(&mut self, message: Message) -> Result<Option<Message>> {
        let MessagePayload::VerifyExecution {
            goal,
            steps,
            results,
            history,
            ..
        } = &message.payload
        else {
            debug!("VerifierAgent ignoring message type: {}", message.message_type());
            return Ok(None);
        };

        info!("VerifierAgent {} verifying {} results", self.base.id, results.len());
        let outcomes = self.verifier.verify_results(steps, results).await;
        self.verified_steps += outcomes.len();

        let mut all_outcomes = history.clone();
        all_outcomes.extend(outcomes.iter().cloned());

        if self.verifier.needs_replanning(&outcomes)
            && let Some((failed_step, error_context)) =
                self.verifier.replan_context(steps, results, &outcomes)
        {
            warn!(
                "VerifierAgent {} requesting replan after step {}: {}",
                self.base.id, failed_step.id, error_context.message
            );
            return Ok(Some(Message::response(
                &message,
                AgentType::Planner,
                MessagePayload::ReplanNeeded {
                    goal: goal.clone(),
                    failed_step: failed_step.clone(),
                    error_context,
                    history: all_outcomes,
                },
            )));
        }

        let overall_status = OverallStatus::of(&all_outcomes);
        info!("VerifierAgent {} run verified: {}", self.base.id, overall_status);
        Ok(Some(Message::response(
            &message,
            AgentType::Supervisor,
            MessagePayload::TestCompleted {
                goal: goal.clone(),
                outcomes: all_outcomes,
                overall_status,
            },
        )))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.base.stop();
        info!("VerifierAgent {} shutting down", self.base.id);
        Ok(())
    }

    fn get_status(&self) -> serde_json::Value {
        let mut status = self.base.status();
        status["verified_steps"] = self.verified_steps.into();
        status
    }
}
