use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    agent::types::{AgentLifecycleState, AgentType},
    error::Result,
    multi_agent::communication::message::Message,
    shared::context::RunContext,
};

/// Behaviour shared by every agent driven by the orchestrator.
#[async_trait]
pub trait AgentBehavior: Send + Sync {
    fn get_id(&self) -> &str;

    fn get_type(&self) -> AgentType;

    /// Called once at the start of every run.
    async fn initialize(&mut self, context: Arc<RunContext>) -> Result<()>;

    /// Handle one message and produce the next one.
    ///
    /// `Ok(None)` means this agent does not handle the message type.
    async fn process_message(&mut self, message: Message) -> Result<Option<Message>>;

    async fn shutdown(&mut self) -> Result<()>;

    fn is_healthy(&self) -> bool {
        true
    }

    /// Status snapshot for monitoring and debugging.
    fn get_status(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.get_id(),
            "type": self.get_type(),
            "healthy": self.is_healthy()
        })
    }
}

/// Identity and run context common to all agents.
#[derive(Debug, Clone)]
pub struct BaseAgent {
    pub id: String,
    pub agent_type: AgentType,
    pub state: AgentLifecycleState,
    pub context: Option<Arc<RunContext>>,
}

impl BaseAgent {
    pub fn new(id: String, agent_type: AgentType) -> Self {
        Self {
            id,
            agent_type,
            state: AgentLifecycleState::Created,
            context: None,
        }
    }

    pub fn generate_id(agent_type: &AgentType) -> String {
        format!("{}-{}", agent_type, uuid::Uuid::new_v4().simple())
    }

    pub fn start(&mut self, context: Arc<RunContext>) {
        self.context = Some(context);
        self.state = AgentLifecycleState::Running;
    }

    pub fn stop(&mut self) {
        self.state = AgentLifecycleState::Stopped;
    }

    pub fn run_id(&self) -> Option<&str> {
        self.context.as_ref().map(|c| c.run_id.as_str())
    }

    pub fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "type": self.agent_type,
            "state": self.state,
            "run_id": self.run_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::context::QaConfig;

    #[test]
    fn test_lifecycle() {
        let mut base = BaseAgent::new(BaseAgent::generate_id(&AgentType::Planner), AgentType::Planner);
        assert!(base.id.starts_with("planner-"));
        assert_eq!(base.state, AgentLifecycleState::Created);
        assert!(base.run_id().is_none());

        let context = Arc::new(RunContext::new("goal", Arc::new(QaConfig::default())));
        base.start(context.clone());
        assert_eq!(base.state, AgentLifecycleState::Running);
        assert_eq!(base.run_id(), Some(context.run_id.as_str()));

        base.stop();
        assert_eq!(base.status()["state"], "Stopped");
    }
}
