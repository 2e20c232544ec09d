//! Deterministic plans used whenever judgment is unavailable or unusable.

use crate::agent::{
    planning::step::Step,
    types::{ActionKind, ErrorType, NavTarget},
};

/// Settings that share the open-settings / flip-toggle-twice shape.
const TOGGLE_SETTINGS: &[(&str, &str)] = &[
    ("wifi", "WiFi"),
    ("wi-fi", "WiFi"),
    ("bluetooth", "Bluetooth"),
    ("airplane", "Airplane mode"),
    ("flight mode", "Airplane mode"),
    ("location", "Location"),
];

/// Pick a template plan by goal keyword. Always returns at least one step.
pub fn template_plan(goal: &str) -> Vec<Step> {
    let goal_lower = goal.to_lowercase();

    if let Some((_, label)) = TOGGLE_SETTINGS
        .iter()
        .find(|(keyword, _)| goal_lower.contains(keyword))
    {
        return toggle_setting_plan(label);
    }

    if goal_lower.contains("alarm") || goal_lower.contains("clock") {
        return alarm_plan();
    }

    generic_plan(goal)
}

pub fn toggle_setting_plan(label: &str) -> Vec<Step> {
    vec![
        Step::new(1, ActionKind::Tap, "Settings app", "Settings screen open")
            .with_fallback("Open Settings from the app drawer"),
        Step::new(
            2,
            ActionKind::Tap,
            format!("{label} option"),
            format!("{label} settings visible"),
        )
        .with_fallback(format!("Scroll the settings list to find {label}")),
        Step::new(
            3,
            ActionKind::Tap,
            format!("{label} toggle switch"),
            format!("{label} is now on"),
        )
        .with_fallback(format!("Check whether {label} was already on")),
        Step::new(4, ActionKind::Wait, "1 second", format!("{label} toggle visible")),
        Step::new(
            5,
            ActionKind::Tap,
            format!("{label} toggle switch"),
            format!("{label} is now off"),
        )
        .with_fallback("Report a bug if the toggle does not change"),
    ]
}

fn alarm_plan() -> Vec<Step> {
    vec![
        Step::new(1, ActionKind::Tap, "Clock app", "Clock app open"),
        Step::new(2, ActionKind::Tap, "Alarm tab", "Alarm list visible")
            .with_fallback("Scroll the tab bar to find Alarm"),
        Step::new(3, ActionKind::Tap, "Add alarm button", "Alarm editor open"),
        Step::new(4, ActionKind::Tap, "Save button", "Alarm list visible")
            .with_fallback("Confirm the dialog with OK"),
    ]
}

fn generic_plan(goal: &str) -> Vec<Step> {
    vec![Step::new(1, ActionKind::Verify, goal, "Screen content visible")]
}

/// Closed recovery vocabulary keyed by what went wrong.
pub fn recovery_plan(failed_step: &Step, error_type: ErrorType, max_steps: usize) -> Vec<Step> {
    let targets: &[&str] = match error_type {
        ErrorType::ElementNotFound => &["dismiss_blocker", "go_back"],
        ErrorType::DriverFailure => &["go_back"],
        ErrorType::Timeout | ErrorType::VerificationFailed => &["go_back", "go_home"],
    };

    targets
        .iter()
        .take(max_steps.max(1))
        .enumerate()
        .map(|(n, target)| recovery_step(recovery_id(failed_step, n as u32 + 1), target))
        .collect()
}

/// Recovery steps are numbered `failed.id * 100 + n`, saturating.
pub fn recovery_id(failed_step: &Step, n: u32) -> u32 {
    failed_step.id.saturating_mul(100).saturating_add(n)
}

fn recovery_step(id: u32, target: &str) -> Step {
    match target {
        "dismiss_blocker" => Step::new(id, ActionKind::Tap, target, "Underlying screen visible")
            .with_fallback("Continue if no blocker is present"),
        "go_home" => Step::new(
            id,
            ActionKind::Navigate(NavTarget::Home),
            target,
            "Home screen visible",
        ),
        _ => Step::new(
            id,
            ActionKind::Navigate(NavTarget::Back),
            target,
            "Previous screen visible",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_goal_uses_toggle_template() {
        let steps = template_plan("Test turning WiFi on and off");
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].target, "Settings app");
        assert_eq!(steps[2].target, "WiFi toggle switch");
        assert_eq!(steps[2].expected_outcome, "WiFi is now on");
        assert_eq!(steps[3].action_kind, ActionKind::Wait);
        assert_eq!(steps[4].expected_outcome, "WiFi is now off");
        assert!(steps.iter().all(|s| s.validate().is_ok()));
    }

    #[test]
    fn test_unknown_goal_still_yields_a_step() {
        let steps = template_plan("Explore the gallery");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].action_kind, ActionKind::Verify);
        assert!(steps[0].validate().is_ok());
    }

    #[test]
    fn test_recovery_ids_and_vocabulary() {
        let failed = Step::new(3, ActionKind::Tap, "WiFi toggle switch", "WiFi is now on");

        let steps = recovery_plan(&failed, ErrorType::ElementNotFound, 3);
        let targets: Vec<_> = steps.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, ["dismiss_blocker", "go_back"]);
        assert_eq!(steps[0].id, 301);
        assert_eq!(steps[1].id, 302);

        let steps = recovery_plan(&failed, ErrorType::VerificationFailed, 1);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].action_kind, ActionKind::Navigate(NavTarget::Back));
    }
}
