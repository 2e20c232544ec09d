use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ui::UiSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavTarget {
    Home,
    Back,
}

/// What a plan step asks for, before grounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Tap,
    Type,
    Scroll,
    Wait,
    Navigate(NavTarget),
    Verify,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Tap => write!(f, "tap"),
            ActionKind::Type => write!(f, "type"),
            ActionKind::Scroll => write!(f, "scroll"),
            ActionKind::Wait => write!(f, "wait"),
            ActionKind::Navigate(NavTarget::Home) => write!(f, "navigate(home)"),
            ActionKind::Navigate(NavTarget::Back) => write!(f, "navigate(back)"),
            ActionKind::Verify => write!(f, "verify"),
        }
    }
}

/// Driver-level action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Touch,
    Swipe,
    Type,
    Key,
    Screenshot,
}

/// Concrete, driver-executable instruction derived from a step and a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<(u32, u32)>,

    /// Swipe end point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_coordinates: Option<(u32, u32)>,

    /// Text to type, or the key name for `key` actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Action {
    fn bare(kind: ActionType) -> Self {
        Self {
            kind,
            coordinates: None,
            end_coordinates: None,
            text: None,
            duration_ms: None,
        }
    }

    pub fn touch(x: u32, y: u32) -> Self {
        Self {
            coordinates: Some((x, y)),
            ..Self::bare(ActionType::Touch)
        }
    }

    pub fn swipe(from: (u32, u32), to: (u32, u32), duration_ms: u64) -> Self {
        Self {
            coordinates: Some(from),
            end_coordinates: Some(to),
            duration_ms: Some(duration_ms),
            ..Self::bare(ActionType::Swipe)
        }
    }

    pub fn type_text(at: (u32, u32), text: impl Into<String>) -> Self {
        Self {
            coordinates: Some(at),
            text: Some(text.into()),
            ..Self::bare(ActionType::Type)
        }
    }

    pub fn key(target: NavTarget) -> Self {
        let name = match target {
            NavTarget::Home => "home",
            NavTarget::Back => "back",
        };
        Self {
            text: Some(name.to_string()),
            ..Self::bare(ActionType::Key)
        }
    }

    pub fn screenshot() -> Self {
        Self::bare(ActionType::Screenshot)
    }
}

/// Why a step or a run failed; also the `error_type` handed to replanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    ElementNotFound,
    DriverFailure,
    Timeout,
    VerificationFailed,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::ElementNotFound => write!(f, "element_not_found"),
            ErrorType::DriverFailure => write!(f, "driver_failure"),
            ErrorType::Timeout => write!(f, "timeout"),
            ErrorType::VerificationFailed => write!(f, "verification_failed"),
        }
    }
}

/// Record of one executed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: u32,

    pub success: bool,

    /// `None` for waits and for steps that never reached the driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<Action>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorType>,

    pub snapshot_after: UiSnapshot,

    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    Planner,
    Executor,
    Verifier,
    Supervisor,
    /// Terminal sink for finished reports; never has an agent behind it.
    System,
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentType::Planner => write!(f, "planner"),
            AgentType::Executor => write!(f, "executor"),
            AgentType::Verifier => write!(f, "verifier"),
            AgentType::Supervisor => write!(f, "supervisor"),
            AgentType::System => write!(f, "system"),
        }
    }
}

/// Agent lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentLifecycleState {
    Created,
    Running,
    Stopped,
}
