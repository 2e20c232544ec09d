use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    agent::{
        core::base_agent::{AgentBehavior, BaseAgent},
        planning::{Planner, Step},
        types::AgentType,
    },
    error::Result,
    judgment::JudgmentStrategy,
    multi_agent::communication::{Message, MessagePayload},
    shared::context::{QaConfig, RunContext},
};

/// Turns goals and failure contexts into step sequences for the executor.
pub struct PlannerAgent {
    base: BaseAgent,
    planner: Planner,
    current_plan: Vec<Step>,
}

impl PlannerAgent {
    pub fn new(id: Option<String>, judgment: Arc<dyn JudgmentStrategy>, config: Arc<QaConfig>) -> Self {
        let id = id.unwrap_or_else(|| BaseAgent::generate_id(&AgentType::Planner));
        Self {
            base: BaseAgent::new(id, AgentType::Planner),
            planner: Planner::new(judgment, config),
            current_plan: Vec::new(),
        }
    }

    /// Number of steps in the most recent plan.
    pub fn plan_summary(&self) -> usize {
        self.current_plan.len()
    }

    pub fn current_plan(&self) -> &[Step] {
        &self.current_plan
    }
}

#[async_trait]
impl AgentBehavior for PlannerAgent {
    fn get_id(&self) -> &str {
        &self.base.id
    }

    fn get_type(&self) -> AgentType {
        self.base.agent_type
    }

    async fn initialize(&mut self, context: Arc<RunContext>) -> Result<()> {
        self.base.start(context);
        self.current_plan.clear();
        info!("PlannerAgent {} initialized", self.base.id);
        Ok(())
    }

    async fn process_message(&mut self, message: Message) -> Result<Option<Message>> {
        let (goal, steps, is_recovery, history) = match &message.payload {
            MessagePayload::CreatePlan { goal } => {
                info!("PlannerAgent {} handling planning request: {}", self.base.id, goal);
                let steps = self.planner.create_plan(goal).await;
                (goal.clone(), steps, false, Vec::new())
            }
            MessagePayload::ReplanNeeded {
                goal,
                failed_step,
                error_context,
                history,
            } => {
                info!(
                    "PlannerAgent {} replanning after step {} ({})",
                    self.base.id, failed_step.id, error_context.error_type
                );
                let steps = self.planner.replan(goal, failed_step, error_context).await;
                (goal.clone(), steps, true, history.clone())
            }
            _ => {
                debug!("PlannerAgent ignoring message type: {}", message.message_type());
                return Ok(None);
            }
        };

        self.current_plan = steps.clone();
        Ok(Some(Message::response(
            &message,
            AgentType::Executor,
            MessagePayload::ExecutePlan {
                goal,
                steps,
                is_recovery,
                history,
            },
        )))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.base.stop();
        info!("PlannerAgent {} shutting down", self.base.id);
        Ok(())
    }

    fn get_status(&self) -> serde_json::Value {
        let mut status = self.base.status();
        status["plan_steps"] = self.plan_summary().into();
        status
    }
}
