use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    agent::{
        planning::{ErrorContext, Step},
        types::{AgentType, StepResult},
        verification::{OverallStatus, VerificationOutcome},
    },
    shared::report::TestReport,
};

/// Typed message content. `history` fields carry the outcomes of earlier plan
/// executions in the same run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    CreatePlan {
        goal: String,
    },
    ExecutePlan {
        goal: String,
        steps: Vec<Step>,
        is_recovery: bool,
        history: Vec<VerificationOutcome>,
    },
    VerifyExecution {
        goal: String,
        steps: Vec<Step>,
        results: Vec<StepResult>,
        is_recovery: bool,
        history: Vec<VerificationOutcome>,
    },
    ReplanNeeded {
        goal: String,
        failed_step: Step,
        error_context: ErrorContext,
        history: Vec<VerificationOutcome>,
    },
    TestCompleted {
        goal: String,
        outcomes: Vec<VerificationOutcome>,
        overall_status: OverallStatus,
    },
    TestReport(TestReport),
}

impl MessagePayload {
    pub fn message_type(&self) -> &'static str {
        match self {
            MessagePayload::CreatePlan { .. } => "create_plan",
            MessagePayload::ExecutePlan { .. } => "execute_plan",
            MessagePayload::VerifyExecution { .. } => "verify_execution",
            MessagePayload::ReplanNeeded { .. } => "replan_needed",
            MessagePayload::TestCompleted { .. } => "test_completed",
            MessagePayload::TestReport(_) => "test_report",
        }
    }

    /// Outcomes verified so far in the run, where the payload carries them.
    pub fn outcomes_so_far(&self) -> Option<&[VerificationOutcome]> {
        match self {
            MessagePayload::ExecutePlan { history, .. }
            | MessagePayload::VerifyExecution { history, .. }
            | MessagePayload::ReplanNeeded { history, .. } => Some(history),
            MessagePayload::TestCompleted { outcomes, .. } => Some(outcomes),
            MessagePayload::TestReport(report) => Some(&report.report.outcomes),
            MessagePayload::CreatePlan { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: AgentType,
    pub recipient: AgentType,
    pub payload: MessagePayload,
    pub timestamp: DateTime<Utc>,
    /// Id of the message this one answers.
    pub correlation_id: Option<String>,
}

impl Message {
    pub fn new(sender: AgentType, recipient: AgentType, payload: MessagePayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            recipient,
            payload,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Reply to `request`, sent by its recipient.
    pub fn response(request: &Message, recipient: AgentType, payload: MessagePayload) -> Self {
        let mut msg = Self::new(request.recipient, recipient, payload);
        msg.correlation_id = Some(request.id.clone());
        msg
    }

    pub fn message_type(&self) -> &'static str {
        self.payload.message_type()
    }
}
