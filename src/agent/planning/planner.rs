use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    agent::{
        planning::{step::Step, templates},
        types::ErrorType,
    },
    judgment::JudgmentStrategy,
    prompt::builder::{build_plan_prompt, build_replan_prompt},
    shared::context::QaConfig,
    ui::UiSnapshot,
};

/// What went wrong, handed from the verifier to `replan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    pub error_type: ErrorType,
    pub message: String,
    pub current_state: UiSnapshot,
}

pub struct Planner {
    judgment: Arc<dyn JudgmentStrategy>,
    config: Arc<QaConfig>,
}

impl Planner {
    pub fn new(judgment: Arc<dyn JudgmentStrategy>, config: Arc<QaConfig>) -> Self {
        Self { judgment, config }
    }

    /// Never fails: unusable judgment output falls back to a template plan.
    pub async fn create_plan(&self, goal: &str) -> Vec<Step> {
        let prompt = build_plan_prompt(goal);
        match self.judgment.generate(&prompt).await {
            Ok(response) => {
                match Step::parse_plan(&response, 1, self.config.default_step_timeout()) {
                    Ok(steps) => {
                        info!("Planner: {} produced {} steps", self.judgment.name(), steps.len());
                        return steps;
                    }
                    Err(e) => warn!("Planner: discarding judgment plan: {}", e),
                }
            }
            Err(e) => debug!("Planner: judgment unavailable: {}", e),
        }

        let steps = templates::template_plan(goal);
        info!("Planner: using template plan with {} steps", steps.len());
        steps
    }

    /// Short recovery sequence replacing the rest of the current plan.
    pub async fn replan(&self, goal: &str, failed_step: &Step, context: &ErrorContext) -> Vec<Step> {
        let max_steps = self.config.max_recovery_steps.max(1);
        let prompt = build_replan_prompt(goal, failed_step, context);

        match self.judgment.generate(&prompt).await {
            Ok(response) => match Step::parse_plan(
                &response,
                templates::recovery_id(failed_step, 1),
                self.config.default_step_timeout(),
            ) {
                Ok(mut steps) => {
                    steps.truncate(max_steps);
                    info!("Planner: {} produced {} recovery steps", self.judgment.name(), steps.len());
                    return steps;
                }
                Err(e) => warn!("Planner: discarding judgment recovery plan: {}", e),
            },
            Err(e) => debug!("Planner: judgment unavailable for recovery: {}", e),
        }

        templates::recovery_plan(failed_step, context.error_type, max_steps)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        agent::types::ActionKind,
        error::Result,
        judgment::RuleBasedJudgment,
    };

    struct Scripted(&'static str);

    #[async_trait]
    impl JudgmentStrategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn make_planner(judgment: impl JudgmentStrategy + 'static) -> Planner {
        Planner::new(Arc::new(judgment), Arc::new(QaConfig::default()))
    }

    fn context(error_type: ErrorType) -> ErrorContext {
        ErrorContext {
            error_type,
            message: "Could not find element: WiFi option".to_string(),
            current_state: UiSnapshot::default(),
        }
    }

    #[tokio::test]
    async fn test_judgment_plan_is_used_when_valid() {
        let planner = make_planner(Scripted(
            r#"```json
[{"action": "tap", "target": "Display option", "verification": "Display settings visible"}]
```"#,
        ));
        let steps = planner.create_plan("Open display settings").await;
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].target, "Display option");
    }

    #[tokio::test]
    async fn test_garbage_falls_back_to_template() {
        let planner = make_planner(Scripted("I cannot help with that."));
        let steps = planner.create_plan("Test turning WiFi on and off").await;
        assert_eq!(steps.len(), 5);

        let planner = make_planner(Scripted("[]"));
        let steps = planner.create_plan("Test Bluetooth").await;
        assert_eq!(steps[1].target, "Bluetooth option");
    }

    #[tokio::test]
    async fn test_replan_truncates_and_renumbers() {
        let planner = make_planner(Scripted(
            r#"[
                {"action": "back", "target": "go_back", "verification": "Previous screen visible"},
                {"action": "home", "target": "go_home", "verification": "Home screen visible"},
                {"action": "tap", "target": "Settings app", "verification": "Settings screen open"},
                {"action": "tap", "target": "WiFi option", "verification": "WiFi settings visible"}
            ]"#,
        ));
        let failed = Step::new(2, ActionKind::Tap, "WiFi option", "WiFi settings visible");
        let steps = planner.replan("wifi", &failed, &context(ErrorType::ElementNotFound)).await;
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].id, 201);
        assert_eq!(steps[2].id, 203);
    }

    #[tokio::test]
    async fn test_replan_without_judgment_uses_recovery_vocabulary() {
        let planner = make_planner(RuleBasedJudgment);
        let failed = Step::new(2, ActionKind::Tap, "WiFi option", "WiFi settings visible");
        let steps = planner.replan("wifi", &failed, &context(ErrorType::DriverFailure)).await;
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].target, "go_back");
        assert_eq!(steps[0].id, 201);
    }
}
