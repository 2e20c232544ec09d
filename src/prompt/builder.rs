use crate::{
    agent::planning::{ErrorContext, Step},
    shared::report::RunReport,
    ui::UiSnapshot,
};

/// Snapshot JSON is cut to this many characters before it goes into a prompt.
const SNAPSHOT_PROMPT_CHARS: usize = 1000;

pub const JUDGMENT_SYSTEM_PROMPT: &str = r#"
You are a QA assistant for mobile applications.
Your only output should be valid JSON matching the structure requested by the user.
Never include any notes, explanations, or natural language outside the JSON.
"#;

pub fn build_plan_prompt(goal: &str) -> String {
    format!(
        r#"
Create a step-by-step test plan for the following goal on an Android device.

Test Goal: {}

Available actions: tap, type, scroll, wait, go_back, go_home, verify

Output a JSON array where each step looks like:
{{
  "step_id": 1,
  "action": "tap",
  "target": "description of the UI element",
  "verification": "what should be observable after the step",
  "fallback": "what to try if the step fails, or null"
}}

For wait steps the target is a duration such as "2 seconds".
"#,
        goal
    )
}

pub fn build_replan_prompt(goal: &str, failed_step: &Step, context: &ErrorContext) -> String {
    format!(
        r#"
A test step failed and the run needs a short recovery sequence.

Test Goal: {}
Failed Step: {} {} (expected: {})
Error Type: {}
Error: {}
Current Screen Text: {}

Output a JSON array of at most 3 recovery steps using the same step structure
as a test plan. Prefer go_back, go_home and dismissing blocking dialogs.
"#,
        goal,
        failed_step.action_kind,
        failed_step.target,
        failed_step.expected_outcome,
        context.error_type,
        context.message,
        context.current_state.extract_text(),
    )
}

pub fn build_verification_prompt(expected_outcome: &str, snapshot: &UiSnapshot) -> String {
    let snapshot_json = serde_json::to_string(snapshot).unwrap_or_default();
    let truncated: String = snapshot_json.chars().take(SNAPSHOT_PROMPT_CHARS).collect();

    format!(
        r#"
Verify whether the expected outcome is visible in the current UI state.

Expected Outcome: {}
Visible Text: {}
UI Hierarchy: {}

Output JSON:
{{
  "status": "PASSED | FAILED | BUG_DETECTED | UNKNOWN",
  "reason": "short explanation",
  "confidence": 0.0,
  "bug_description": "description if a bug was found, or null"
}}
"#,
        expected_outcome,
        snapshot.extract_text(),
        truncated
    )
}

pub fn build_improvement_prompt(report: &RunReport) -> String {
    let failures = report
        .outcomes
        .iter()
        .filter(|o| !o.status.is_passed())
        .map(|o| format!("\n - step {}: {} ({})", o.step_id, o.status, o.reason))
        .collect::<Vec<_>>()
        .join("");

    format!(
        r#"
Suggest improvements for this automated UI test.

Test Goal: {}
Overall Status: {}
Steps: {} total, {} passed, {} failed
Problems:{}

Output a JSON array of objects:
{{"kind": "robustness | bug_reporting | coverage | other", "suggestion": "text", "priority": "high | medium | low"}}
"#,
        report.goal,
        report.overall_status,
        report.total_steps,
        report.passed_steps,
        report.failed_steps,
        if failures.is_empty() { " None".to_string() } else { failures }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::types::ActionKind,
        ui::{ScreenSize, UiElement},
    };

    #[test]
    fn test_verification_prompt_truncates_hierarchy() {
        let elements = (0..200)
            .map(|i| UiElement::with_text(format!("Row {i}")).bounds(0, i, 100, i + 1))
            .collect();
        let snapshot = UiSnapshot::new(elements, ScreenSize::default(), "com.android.settings");
        let prompt = build_verification_prompt("Row 3 visible", &snapshot);
        assert!(prompt.contains("Expected Outcome: Row 3 visible"));
        assert!(prompt.len() < 1000 + 2000);
    }

    #[test]
    fn test_plan_prompt_mentions_goal() {
        let prompt = build_plan_prompt("Test turning WiFi on and off");
        assert!(prompt.contains("Test Goal: Test turning WiFi on and off"));
        let step = Step::new(2, ActionKind::Tap, "WiFi option", "WiFi settings visible");
        assert!(build_plan_prompt(&step.target).contains("WiFi option"));
    }
}
