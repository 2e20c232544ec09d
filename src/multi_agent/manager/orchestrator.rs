use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    agent::{
        core::base_agent::AgentBehavior,
        types::AgentType,
        verification::{OverallStatus, VerificationOutcome},
    },
    agents::{ExecutorAgent, PlannerAgent, SupervisorAgent, VerifierAgent},
    driver::UiDriver,
    error::{Result, agent_error::AgentError},
    judgment::JudgmentStrategy,
    multi_agent::communication::{Message, MessagePayload},
    shared::{
        context::{QaConfig, RunContext},
        report::{ReportSink, TestReport},
        run_history::RunHistory,
    },
};

/// One routed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub iteration: usize,
    pub from: AgentType,
    pub to: AgentType,
    pub message_type: String,
    pub timestamp: DateTime<Utc>,
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(TestReport),
    /// The iteration cap was hit before any report was produced.
    BudgetExhausted {
        run_id: String,
        goal: String,
        iterations: usize,
        last_message_type: String,
        partial_outcomes: Vec<VerificationOutcome>,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&TestReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::BudgetExhausted { .. } => None,
        }
    }

    pub fn overall_status(&self) -> Option<OverallStatus> {
        self.report().map(|r| r.report.overall_status)
    }

    pub fn status_label(&self) -> String {
        match self {
            RunOutcome::Completed(report) => report.report.overall_status.to_string(),
            RunOutcome::BudgetExhausted { .. } => "INCONCLUSIVE".to_string(),
        }
    }
}

/// Routes messages between agents until a report reaches the system sink
/// or the iteration budget runs out.
pub struct Orchestrator {
    agents: HashMap<AgentType, Box<dyn AgentBehavior>>,
    config: Arc<QaConfig>,
    sink: Option<Arc<dyn ReportSink>>,
    transitions: Vec<Transition>,
}

impl Orchestrator {
    pub fn new(config: QaConfig) -> Self {
        Self {
            agents: HashMap::new(),
            config: Arc::new(config),
            sink: None,
            transitions: Vec::new(),
        }
    }

    /// Planner, executor, verifier and supervisor wired to the given collaborators.
    pub fn standard(
        driver: Box<dyn UiDriver>,
        judgment: Arc<dyn JudgmentStrategy>,
        history: Arc<RunHistory>,
        config: QaConfig,
    ) -> Self {
        let mut orchestrator = Self::new(config);
        let config = orchestrator.config.clone();
        orchestrator.register(Box::new(PlannerAgent::new(None, judgment.clone(), config.clone())));
        orchestrator.register(Box::new(ExecutorAgent::new(None, driver, config.clone())));
        orchestrator.register(Box::new(VerifierAgent::new(None, judgment.clone(), config)));
        orchestrator.register(Box::new(SupervisorAgent::new(None, judgment, history)));
        orchestrator
    }

    /// Register an agent under its type, returning any agent it replaces.
    pub fn register(&mut self, agent: Box<dyn AgentBehavior>) -> Option<Box<dyn AgentBehavior>> {
        info!("Orchestrator registering {} agent {}", agent.get_type(), agent.get_id());
        self.agents.insert(agent.get_type(), agent)
    }

    pub fn with_agent(mut self, agent: Box<dyn AgentBehavior>) -> Self {
        self.register(agent);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// Transitions of the most recent run, in order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn get_all_agent_status(&self) -> Vec<serde_json::Value> {
        self.agents.values().map(|a| a.get_status()).collect()
    }

    /// Run one goal to completion.
    ///
    /// `Err` is reserved for routing failures and a lost device.
    pub async fn run(&mut self, goal: &str) -> Result<RunOutcome> {
        self.transitions.clear();
        let context = Arc::new(RunContext::new(goal, self.config.clone()));
        info!("Orchestrator starting run {} for goal: {}", context.run_id, goal);

        for agent in self.agents.values_mut() {
            agent.initialize(context.clone()).await?;
        }

        let outcome = self.drive(&context).await;

        for agent in self.agents.values_mut() {
            if let Err(e) = agent.shutdown().await {
                warn!("Agent {} shutdown error: {:?}", agent.get_id(), e);
            }
        }

        match &outcome {
            Ok(outcome) => info!("Run {} finished: {}", context.run_id, outcome.status_label()),
            Err(e) => error!("Run {} aborted: {}", context.run_id, e),
        }
        outcome
    }

    async fn drive(&mut self, context: &RunContext) -> Result<RunOutcome> {
        let mut message = Message::new(
            AgentType::System,
            AgentType::Planner,
            MessagePayload::CreatePlan {
                goal: context.goal.clone(),
            },
        );
        let mut iterations = 0;
        let mut partial_outcomes: Vec<VerificationOutcome> = Vec::new();

        loop {
            if message.recipient == AgentType::System {
                return self.finish(message).await;
            }

            if iterations >= self.config.max_iterations {
                warn!(
                    "Run {} exhausted {} iterations waiting on {}",
                    context.run_id,
                    iterations,
                    message.message_type()
                );
                return Ok(RunOutcome::BudgetExhausted {
                    run_id: context.run_id.clone(),
                    goal: context.goal.clone(),
                    iterations,
                    last_message_type: message.message_type().to_string(),
                    partial_outcomes,
                });
            }
            iterations += 1;

            let recipient = message.recipient;
            let message_type = message.message_type();
            let agent = self
                .agents
                .get_mut(&recipient)
                .ok_or_else(|| AgentError::UnroutableRecipient(recipient.to_string()))?;

            let response = agent.process_message(message).await?.ok_or_else(|| {
                AgentError::UnexpectedMessage {
                    recipient: recipient.to_string(),
                    message_type: message_type.to_string(),
                }
            })?;

            info!(
                "Iteration {}: {} -> {} ({}) => {}",
                iterations,
                response.sender,
                response.recipient,
                message_type,
                response.message_type()
            );
            self.transitions.push(Transition {
                iteration: iterations,
                from: recipient,
                to: response.recipient,
                message_type: response.message_type().to_string(),
                timestamp: response.timestamp,
            });

            if let Some(outcomes) = response.payload.outcomes_so_far()
                && !outcomes.is_empty()
            {
                partial_outcomes = outcomes.to_vec();
            }
            message = response;
        }
    }

    async fn finish(&self, message: Message) -> Result<RunOutcome> {
        let message_type = message.message_type();
        let MessagePayload::TestReport(report) = message.payload else {
            return Err(AgentError::UnexpectedMessage {
                recipient: AgentType::System.to_string(),
                message_type: message_type.to_string(),
            }
            .into());
        };

        if let Some(sink) = &self.sink
            && let Err(e) = sink.accept_report(&report).await
        {
            warn!("Report sink rejected run {}: {}", report.report.run_id, e);
        }
        Ok(RunOutcome::Completed(report))
    }
}

/// Run several independent goals concurrently, each on its own orchestrator.
pub async fn run_all(runs: Vec<(Orchestrator, String)>) -> Vec<(Orchestrator, Result<RunOutcome>)> {
    join_all(runs.into_iter().map(|(mut orchestrator, goal)| async move {
        let outcome = orchestrator.run(&goal).await;
        (orchestrator, outcome)
    }))
    .await
}
