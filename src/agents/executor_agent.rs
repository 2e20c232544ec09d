use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    agent::{
        core::base_agent::{AgentBehavior, BaseAgent},
        execution::Executor,
        types::AgentType,
    },
    driver::UiDriver,
    error::Result,
    multi_agent::communication::{Message, MessagePayload},
    shared::context::{QaConfig, RunContext},
};

/// Runs plans against the device and forwards the results for verification.
pub struct ExecutorAgent {
    base: BaseAgent,
    executor: Executor,
}

impl ExecutorAgent {
    pub fn new(id: Option<String>, driver: Box<dyn UiDriver>, config: Arc<QaConfig>) -> Self {
        let id = id.unwrap_or_else(|| BaseAgent::generate_id(&AgentType::Executor));
        Self {
            base: BaseAgent::new(id, AgentType::Executor),
            executor: Executor::new(driver, config),
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

#[async_trait]
impl AgentBehavior for ExecutorAgent {
    fn get_id(&self) -> &str {
        &self.base.id
    }

    fn get_type(&self) -> AgentType {
        self.base.agent_type
    }

    async fn initialize(&mut self, context: Arc<RunContext>) -> Result<()> {
        self.base.start(context);
        let snapshot = self.executor.reset().await?;
        info!(
            "ExecutorAgent {} initialized, device at '{}' with {} elements",
            self.base.id,
            snapshot.activity_id,
            snapshot.element_count()
        );
        Ok(())
    }

    async fn process_message(&mut self, message: Message) -> Result<Option<Message>> {
        let MessagePayload::ExecutePlan {
            goal,
            steps,
            is_recovery,
            history,
        } = &message.payload
        else {
            debug!("ExecutorAgent ignoring message type: {}", message.message_type());
            return Ok(None);
        };

        info!(
            "ExecutorAgent {} executing {} {} steps",
            self.base.id,
            steps.len(),
            if *is_recovery { "recovery" } else { "planned" }
        );
        let results = self.executor.execute_plan(steps).await?;

        Ok(Some(Message::response(
            &message,
            AgentType::Verifier,
            MessagePayload::VerifyExecution {
                goal: goal.clone(),
                steps: steps.clone(),
                results,
                is_recovery: *is_recovery,
                history: history.clone(),
            },
        )))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.base.stop();
        info!("ExecutorAgent {} shutting down", self.base.id);
        Ok(())
    }

    fn get_status(&self) -> serde_json::Value {
        let mut status = self.base.status();
        status["execution"] = serde_json::to_value(self.executor.execution_summary())
            .unwrap_or(serde_json::Value::Null);
        status
    }
}
