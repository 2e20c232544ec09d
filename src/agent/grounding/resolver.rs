use tracing::debug;

use crate::{
    agent::{
        grounding::criteria::{coordinate_fallback, derive_criteria},
        planning::Step,
        types::{Action, ActionKind},
    },
    error::agent_error::AgentError,
    ui::{ScreenSize, UiArena, UiElement, UiSnapshot},
};

const SCROLL_DURATION_MS: u64 = 500;

/// How a resolved action was located.
#[derive(Debug, Clone, PartialEq)]
pub enum Grounding {
    /// Matched element, by arena slot and the criterion that selected it.
    Element { slot: usize, criterion: String },
    /// Screen-relative fallback table entry.
    Fallback { keyword: &'static str },
    /// Needs no element (scroll, navigation, screenshot).
    Direct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub action: Action,
    pub grounding: Grounding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollDirection {
    Down,
    Up,
    Left,
    Right,
}

/// Maps a step target onto a concrete action for the current screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundingResolver;

impl GroundingResolver {
    pub fn new() -> Self {
        Self
    }

    /// Returned actions always carry on-screen coordinates when they carry any.
    pub fn resolve(&self, step: &Step, snapshot: &UiSnapshot) -> Result<Resolution, AgentError> {
        let direct = |action| Resolution {
            action,
            grounding: Grounding::Direct,
        };

        match step.action_kind {
            ActionKind::Verify => Ok(direct(Action::screenshot())),
            ActionKind::Navigate(target) => Ok(direct(Action::key(target))),
            ActionKind::Scroll => scroll_action(&step.target, snapshot.screen_size)
                .map(direct)
                .ok_or_else(|| AgentError::GroundingFailure(step.target.clone())),
            ActionKind::Wait => Err(AgentError::GroundingFailure(step.target.clone())),
            ActionKind::Tap | ActionKind::Type => self.resolve_element(step, snapshot),
        }
    }

    fn resolve_element(&self, step: &Step, snapshot: &UiSnapshot) -> Result<Resolution, AgentError> {
        let arena = UiArena::from_snapshot(snapshot);
        let screen = snapshot.screen_size;

        for criterion in derive_criteria(step) {
            let hit = arena.flattened().find_map(|(slot, element)| {
                if !criterion.matches(element) {
                    return None;
                }
                actionable_point(element, screen).map(|point| (slot, point))
            });

            if let Some((slot, point)) = hit {
                debug!("Resolver: '{}' matched slot {} by {}", step.target, slot, criterion);
                return Ok(Resolution {
                    action: element_action(step, point),
                    grounding: Grounding::Element {
                        slot,
                        criterion: criterion.to_string(),
                    },
                });
            }
        }

        if let Some((keyword, point)) = coordinate_fallback(step, screen) {
            debug!(
                "Resolver: '{}' not on screen, using '{}' fallback at {:?}",
                step.target, keyword, point
            );
            return Ok(Resolution {
                action: element_action(step, point),
                grounding: Grounding::Fallback { keyword },
            });
        }

        Err(AgentError::GroundingFailure(step.target.clone()))
    }
}

fn element_action(step: &Step, point: (u32, u32)) -> Action {
    match step.action_kind {
        ActionKind::Type => Action::type_text(point, step.input_text.clone().unwrap_or_default()),
        _ => Action::touch(point.0, point.1),
    }
}

/// Midpoint of valid bounds, if it is on screen.
fn actionable_point(element: &UiElement, screen: ScreenSize) -> Option<(u32, u32)> {
    let bounds = element.bounds.filter(|b| b.is_valid())?;
    let (x, y) = bounds.center();
    screen.clamp_point(x, y)
}

fn scroll_direction(target: &str) -> ScrollDirection {
    let target = target.to_lowercase();
    let words: Vec<&str> = target
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.contains(&"up") {
        ScrollDirection::Up
    } else if words.contains(&"left") {
        ScrollDirection::Left
    } else if words.contains(&"right") {
        ScrollDirection::Right
    } else {
        ScrollDirection::Down
    }
}

/// Swipe between the 3/4 and 1/4 marks; the default moves content up (scrolls down).
fn scroll_action(target: &str, screen: ScreenSize) -> Option<Action> {
    let (w, h) = (screen.width, screen.height);
    if w == 0 || h == 0 {
        return None;
    }
    let (center_x, center_y) = (w / 2, h / 2);
    let (near_x, far_x) = (w * 3 / 4, w / 4);
    let (near_y, far_y) = (h * 3 / 4, h / 4);

    let (from, to) = match scroll_direction(target) {
        ScrollDirection::Down => ((center_x, near_y), (center_x, far_y)),
        ScrollDirection::Up => ((center_x, far_y), (center_x, near_y)),
        ScrollDirection::Right => ((near_x, center_y), (far_x, center_y)),
        ScrollDirection::Left => ((far_x, center_y), (near_x, center_y)),
    };
    Some(Action::swipe(from, to, SCROLL_DURATION_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::types::{ActionType, NavTarget},
        ui::Bounds,
    };

    fn snapshot(elements: Vec<UiElement>) -> UiSnapshot {
        UiSnapshot::new(elements, ScreenSize::default(), "com.android.settings")
    }

    fn tap(target: &str) -> Step {
        Step::new(1, ActionKind::Tap, target, "something visible")
    }

    #[test]
    fn test_tap_uses_floored_midpoint() {
        let snap = snapshot(vec![UiElement::with_text("Toggle").bounds(301, 101, 400, 150)]);
        let resolution = GroundingResolver::new().resolve(&tap("WiFi toggle switch"), &snap).unwrap();
        assert_eq!(resolution.action, Action::touch(350, 125));
        assert!(matches!(resolution.grounding, Grounding::Element { slot: 0, .. }));
    }

    #[test]
    fn test_far_off_screen_bounds_fall_back() {
        let snap = snapshot(vec![
            UiElement::with_text("WiFi").bounds(2_000_000_000, 0, 2_100_000_000, 10),
        ]);
        let resolution = GroundingResolver::new().resolve(&tap("WiFi option"), &snap).unwrap();
        assert_eq!(resolution.grounding, Grounding::Fallback { keyword: "wifi" });
        assert_eq!(Bounds::new(i32::MAX - 1, 0, i32::MAX, 10).center(), (i32::MAX - 1, 5));
    }

    #[test]
    fn test_first_match_in_preorder_wins() {
        let snap = snapshot(vec![
            UiElement::with_text("Network & internet")
                .bounds(0, 0, 1080, 200)
                .child(UiElement::with_text("WiFi").bounds(0, 0, 540, 100)),
            UiElement::with_text("WiFi").bounds(0, 300, 1080, 400),
        ]);
        let resolution = GroundingResolver::new().resolve(&tap("WiFi option"), &snap).unwrap();
        assert_eq!(resolution.action, Action::touch(270, 50));
        assert_eq!(resolution.grounding, Grounding::Element { slot: 1, criterion: "wifi in text".to_string() });
    }

    #[test]
    fn test_text_beats_id_beats_class() {
        let resolver = GroundingResolver::new();
        let switch = UiElement::default()
            .id("android:id/switch_widget")
            .class("android.widget.Switch")
            .bounds(0, 0, 100, 100);
        let by_id = UiElement::default()
            .id("com.android.settings:id/bluetooth_pref")
            .bounds(100, 0, 200, 100);
        let by_text = UiElement::with_text("Bluetooth").bounds(200, 0, 300, 100);

        let snap = snapshot(vec![switch.clone(), by_id.clone(), by_text]);
        let resolution = resolver.resolve(&tap("Bluetooth"), &snap).unwrap();
        assert_eq!(resolution.action, Action::touch(250, 50));

        let snap = snapshot(vec![switch.clone(), by_id]);
        let resolution = resolver.resolve(&tap("Bluetooth"), &snap).unwrap();
        assert_eq!(resolution.action, Action::touch(150, 50));

        let snap = snapshot(vec![UiElement::with_text("Other").bounds(200, 0, 300, 100), switch]);
        let resolution = resolver.resolve(&tap("Airplane mode checkbox"), &snap);
        assert!(resolution.is_err());
        let resolution = resolver.resolve(&tap("Airplane mode toggle"), &snap).unwrap();
        assert_eq!(resolution.action, Action::touch(50, 50));
    }

    #[test]
    fn test_elements_without_usable_bounds_are_skipped() {
        let snap = snapshot(vec![
            UiElement::with_text("Save"),
            UiElement::with_text("Save").bounds(50, 50, 50, 80),
            UiElement::with_text("Save").bounds(2000, 0, 2200, 100),
            UiElement::with_text("Save").bounds(10, 10, 30, 30),
        ]);
        let resolution = GroundingResolver::new().resolve(&tap("Save button"), &snap).unwrap();
        assert_eq!(resolution.action, Action::touch(20, 20));
    }

    #[test]
    fn test_fallback_table_then_not_found() {
        let snap = snapshot(vec![UiElement::with_text("Settings")]);
        let resolver = GroundingResolver::new();

        let resolution = resolver.resolve(&tap("Settings app"), &snap).unwrap();
        assert_eq!(resolution.grounding, Grounding::Fallback { keyword: "settings" });

        let err = resolver.resolve(&tap("Gallery"), &snap).unwrap_err();
        assert_eq!(err.to_string(), "Could not find element: Gallery");
    }

    #[test]
    fn test_type_targets_field() {
        let snap = snapshot(vec![
            UiElement::with_text("Network name").class("android.widget.TextView").bounds(0, 0, 100, 50),
            UiElement::default().class("android.widget.EditText").id("ssid").bounds(0, 60, 1000, 120),
        ]);
        let step = Step::new(1, ActionKind::Type, "SSID", "Name entered").with_input("Guest");
        let resolution = GroundingResolver::new().resolve(&step, &snap).unwrap();
        assert_eq!(resolution.action, Action::type_text((500, 90), "Guest"));
    }

    #[test]
    fn test_scroll_and_system_actions() {
        let snap = snapshot(Vec::new());
        let resolver = GroundingResolver::new();

        let down = resolver
            .resolve(&Step::new(1, ActionKind::Scroll, "settings list", "More visible"), &snap)
            .unwrap();
        assert_eq!(down.action, Action::swipe((540, 1440), (540, 480), 500));

        let up = resolver
            .resolve(&Step::new(1, ActionKind::Scroll, "scroll up", "Top visible"), &snap)
            .unwrap();
        assert_eq!(up.action, Action::swipe((540, 480), (540, 1440), 500));

        let back = resolver
            .resolve(&Step::new(1, ActionKind::Navigate(NavTarget::Back), "go_back", "x"), &snap)
            .unwrap();
        assert_eq!(back.action.kind, ActionType::Key);
        assert_eq!(back.action.text.as_deref(), Some("back"));

        let verify = resolver
            .resolve(&Step::new(1, ActionKind::Verify, "screen", "x"), &snap)
            .unwrap();
        assert_eq!(verify.action.kind, ActionType::Screenshot);
    }
}
