use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    agent::types::{ActionKind, NavTarget},
    error::agent_error::AgentError,
    utils::string_util::JsonPayload,
};

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// One planned UI interaction. Never mutated once the planner hands it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,

    pub action_kind: ActionKind,

    pub target: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,

    pub expected_outcome: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    pub timeout: Duration,
}

impl Step {
    pub fn new(
        id: u32,
        action_kind: ActionKind,
        target: impl Into<String>,
        expected_outcome: impl Into<String>,
    ) -> Self {
        Self {
            id,
            action_kind,
            target: target.into(),
            input_text: None,
            expected_outcome: expected_outcome.into(),
            fallback: None,
            timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_input(mut self, text: impl Into<String>) -> Self {
        self.input_text = Some(text.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.target.trim().is_empty() {
            return Err(AgentError::InvalidPlan(format!("step {} has an empty target", self.id)));
        }
        if self.expected_outcome.trim().is_empty() {
            return Err(AgentError::InvalidPlan(format!(
                "step {} has an empty expected outcome",
                self.id
            )));
        }
        Ok(())
    }

    /// Parse a judgment response into steps.
    ///
    /// Accepts a bare JSON array or an object with a `steps` array, optionally
    /// wrapped in a markdown code fence. Steps without an id are numbered from
    /// `first_id`.
    pub fn parse_plan(
        response: &str,
        first_id: u32,
        default_timeout: Duration,
    ) -> Result<Vec<Step>, AgentError> {
        let body = response.json_payload();
        let value: Value =
            serde_json::from_str(body).map_err(|e| AgentError::JudgmentParse(e.to_string()))?;

        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("steps") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(AgentError::JudgmentParse(
                        "expected a list of steps".to_string(),
                    ));
                }
            },
            _ => {
                return Err(AgentError::JudgmentParse(
                    "expected a list of steps".to_string(),
                ));
            }
        };

        if items.is_empty() {
            return Err(AgentError::InvalidPlan("plan has no steps".to_string()));
        }

        let mut steps = Vec::with_capacity(items.len());
        for (offset, item) in items.into_iter().enumerate() {
            let raw: RawStep = serde_json::from_value(item)
                .map_err(|e| AgentError::JudgmentParse(e.to_string()))?;
            let step = raw.into_step(first_id.saturating_add(offset as u32), default_timeout)?;
            step.validate()?;
            if steps.iter().any(|s: &Step| s.id == step.id) {
                return Err(AgentError::InvalidPlan(format!("duplicate step id {}", step.id)));
            }
            steps.push(step);
        }
        Ok(steps)
    }
}

/// Loose shape produced by language models; normalized into [`Step`].
#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default, alias = "step_id")]
    id: Option<u32>,

    #[serde(alias = "action_kind")]
    action: String,

    #[serde(default)]
    target: String,

    #[serde(default, alias = "text")]
    input_text: Option<String>,

    #[serde(default, alias = "verification", alias = "expected_result")]
    expected_outcome: String,

    #[serde(default)]
    fallback: Option<String>,

    #[serde(default, alias = "timeout")]
    timeout_secs: Option<f64>,
}

impl RawStep {
    fn into_step(self, default_id: u32, default_timeout: Duration) -> Result<Step, AgentError> {
        let action_kind = parse_action_kind(&self.action, &self.target).ok_or_else(|| {
            AgentError::InvalidPlan(format!("unknown action kind: {}", self.action))
        })?;

        let timeout = self
            .timeout_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(default_timeout);

        Ok(Step {
            id: self.id.unwrap_or(default_id),
            action_kind,
            target: self.target.trim().to_string(),
            input_text: self.input_text,
            expected_outcome: self.expected_outcome.trim().to_string(),
            fallback: self.fallback.filter(|f| !f.trim().is_empty()),
            timeout,
        })
    }
}

pub fn parse_action_kind(action: &str, target: &str) -> Option<ActionKind> {
    let normalized = action.trim().to_lowercase().replace(['-', ' '], "_");
    let kind = match normalized.as_str() {
        "tap" | "touch" | "click" | "press" => ActionKind::Tap,
        "type" | "input" | "enter" | "enter_text" | "type_text" => ActionKind::Type,
        "scroll" | "swipe" => ActionKind::Scroll,
        "wait" | "sleep" | "pause" => ActionKind::Wait,
        "back" | "go_back" | "navigate_back" | "press_back" => ActionKind::Navigate(NavTarget::Back),
        "home" | "go_home" | "navigate_home" | "press_home" => ActionKind::Navigate(NavTarget::Home),
        "navigate" | "navigation" => {
            if target.to_lowercase().contains("home") {
                ActionKind::Navigate(NavTarget::Home)
            } else {
                ActionKind::Navigate(NavTarget::Back)
            }
        }
        "verify" | "check" | "assert" | "screenshot" => ActionKind::Verify,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_from_array() {
        let response = r#"[
            {"action": "tap", "target": "Settings app icon", "verification": "Settings screen is open", "fallback": "Try opening from app drawer"},
            {"action": "wait", "target": "2 seconds", "verification": "WiFi networks visible"}
        ]"#;
        let steps = Step::parse_plan(response, 1, DEFAULT_STEP_TIMEOUT).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, 1);
        assert_eq!(steps[0].action_kind, ActionKind::Tap);
        assert_eq!(steps[0].fallback.as_deref(), Some("Try opening from app drawer"));
        assert_eq!(steps[1].id, 2);
        assert_eq!(steps[1].action_kind, ActionKind::Wait);
        assert!(steps[1].fallback.is_none());
    }

    #[test]
    fn test_parse_plan_from_fenced_object() {
        let response = "```json\n{\"steps\": [{\"step_id\": 7, \"action\": \"go_back\", \"target\": \"go_back\", \"expected_outcome\": \"Previous screen visible\", \"timeout\": 3}]}\n```";
        let steps = Step::parse_plan(response, 1, DEFAULT_STEP_TIMEOUT).unwrap();
        assert_eq!(steps[0].id, 7);
        assert_eq!(steps[0].action_kind, ActionKind::Navigate(NavTarget::Back));
        assert_eq!(steps[0].timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_parse_plan_rejects_bad_input() {
        assert!(matches!(
            Step::parse_plan("sure, here is a plan", 1, DEFAULT_STEP_TIMEOUT),
            Err(AgentError::JudgmentParse(_))
        ));
        assert!(matches!(
            Step::parse_plan("[]", 1, DEFAULT_STEP_TIMEOUT),
            Err(AgentError::InvalidPlan(_))
        ));
        assert!(matches!(
            Step::parse_plan(r#"[{"action": "dance", "target": "x", "verification": "y"}]"#, 1, DEFAULT_STEP_TIMEOUT),
            Err(AgentError::InvalidPlan(_))
        ));
        assert!(matches!(
            Step::parse_plan(r#"[{"action": "tap", "target": "", "verification": "y"}]"#, 1, DEFAULT_STEP_TIMEOUT),
            Err(AgentError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_unrepresentable_timeout_uses_default() {
        let steps = Step::parse_plan(
            r#"[{"action": "tap", "target": "WiFi", "verification": "WiFi visible", "timeout": 1e30},
                {"action": "tap", "target": "Toggle", "verification": "WiFi is on", "timeout": -2}]"#,
            1,
            DEFAULT_STEP_TIMEOUT,
        )
        .unwrap();
        assert_eq!(steps[0].timeout, DEFAULT_STEP_TIMEOUT);
        assert_eq!(steps[1].timeout, DEFAULT_STEP_TIMEOUT);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let response = r#"[
            {"id": 1, "action": "tap", "target": "Settings", "verification": "Settings visible"},
            {"id": 1, "action": "tap", "target": "WiFi toggle", "verification": "WiFi is now on"}
        ]"#;
        assert!(matches!(
            Step::parse_plan(response, 1, DEFAULT_STEP_TIMEOUT),
            Err(AgentError::InvalidPlan(ref msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_navigate_alias_uses_target() {
        assert_eq!(
            parse_action_kind("navigate", "Home screen"),
            Some(ActionKind::Navigate(NavTarget::Home))
        );
        assert_eq!(
            parse_action_kind("Navigate", "previous page"),
            Some(ActionKind::Navigate(NavTarget::Back))
        );
    }
}
