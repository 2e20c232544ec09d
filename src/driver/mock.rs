use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    agent::types::{Action, ActionType},
    driver::{DriverResponse, UiDriver},
    error::{Result, agent_error::AgentError},
    ui::{UiElement, UiSnapshot},
};

/// Every action submitted to a [`MockDriver`], in order.
pub type ActionLog = Arc<Mutex<Vec<Action>>>;

/// In-memory device holding a single screen.
///
/// Scripted failures are keyed by 1-based `step` call index counted since
/// construction.
pub struct MockDriver {
    initial: UiSnapshot,
    current: UiSnapshot,
    toggles: bool,
    failures: HashMap<usize, String>,
    always_fail: Option<String>,
    disconnect_after: Option<usize>,
    calls: usize,
    log: ActionLog,
}

impl MockDriver {
    pub fn new(snapshot: UiSnapshot) -> Self {
        Self {
            current: snapshot.clone(),
            initial: snapshot,
            toggles: false,
            failures: HashMap::new(),
            always_fail: None,
            disconnect_after: None,
            calls: 0,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Touching a toggle/switch element flips its text between "<label> ON" and "<label> OFF".
    pub fn with_toggles(mut self) -> Self {
        self.toggles = true;
        self
    }

    pub fn fail_call(mut self, call: usize, error: impl Into<String>) -> Self {
        self.failures.insert(call, error.into());
        self
    }

    pub fn always_failing(mut self, error: impl Into<String>) -> Self {
        self.always_fail = Some(error.into());
        self
    }

    /// Calls after the `calls`-th one return `DriverDisconnected`.
    pub fn disconnect_after(mut self, calls: usize) -> Self {
        self.disconnect_after = Some(calls);
        self
    }

    pub fn action_log(&self) -> ActionLog {
        self.log.clone()
    }

    fn is_disconnected(&self) -> bool {
        self.disconnect_after.is_some_and(|limit| self.calls > limit)
    }

    fn apply(&mut self, action: &Action) -> DriverResponse {
        match action.kind {
            ActionType::Screenshot => DriverResponse::ok(false),
            ActionType::Touch => {
                if self.toggles
                    && let Some((x, y)) = action.coordinates
                    && let Some(element) =
                        element_at_mut(&mut self.current.elements, x, y, &is_toggle)
                {
                    flip_toggle(element);
                }
                DriverResponse::ok(true)
            }
            ActionType::Type => {
                if let (Some((x, y)), Some(text)) = (action.coordinates, action.text.as_ref())
                    && let Some(element) =
                        element_at_mut(&mut self.current.elements, x, y, &|_: &UiElement| true)
                {
                    element.text = text.clone();
                }
                DriverResponse::ok(true)
            }
            ActionType::Swipe | ActionType::Key => DriverResponse::ok(true),
        }
    }
}

#[async_trait]
impl UiDriver for MockDriver {
    async fn reset(&mut self) -> Result<UiSnapshot> {
        if self.is_disconnected() {
            return Err(AgentError::DriverDisconnected("mock device detached".to_string()).into());
        }
        self.current = self.initial.clone();
        Ok(self.current.clone())
    }

    async fn observe(&mut self) -> Result<UiSnapshot> {
        if self.is_disconnected() {
            return Err(AgentError::DriverDisconnected("mock device detached".to_string()).into());
        }
        Ok(self.current.clone())
    }

    async fn step(&mut self, action: &Action) -> Result<DriverResponse> {
        self.calls += 1;
        if self.is_disconnected() {
            return Err(AgentError::DriverDisconnected("mock device detached".to_string()).into());
        }
        self.log.lock().await.push(action.clone());
        debug!("MockDriver call {}: {:?}", self.calls, action.kind);

        if let Some(error) = &self.always_fail {
            return Ok(DriverResponse::failed(error.clone()));
        }
        if let Some(error) = self.failures.get(&self.calls) {
            return Ok(DriverResponse::failed(error.clone()));
        }
        Ok(self.apply(action))
    }
}

fn is_toggle(element: &UiElement) -> bool {
    let text = element.text.to_lowercase();
    let id = element.resource_id.to_lowercase();
    ["toggle", "switch"]
        .iter()
        .any(|word| text.contains(word) || id.contains(word))
        || element.class_name.to_lowercase().contains("switch")
}

fn flip_toggle(element: &mut UiElement) {
    let text = element.text.trim();
    let (label, state) = if let Some(label) = strip_suffix_ignore_case(text, " on") {
        (label, "OFF")
    } else if let Some(label) = strip_suffix_ignore_case(text, " off") {
        (label, "ON")
    } else {
        (text, "ON")
    };
    let flipped = format!("{} {}", label.trim(), state).trim().to_string();
    element.text = flipped;
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    let tail = text.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &text[..split])
}

/// First element in pre-order whose bounds contain the point and that satisfies `pred`.
fn element_at_mut<'a>(
    elements: &'a mut [UiElement],
    x: u32,
    y: u32,
    pred: &dyn Fn(&UiElement) -> bool,
) -> Option<&'a mut UiElement> {
    for element in elements.iter_mut() {
        let hit = element.bounds.is_some_and(|b| b.contains(x, y)) && pred(element);
        if hit {
            return Some(element);
        }
        if let Some(found) = element_at_mut(&mut element.children, x, y, pred) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{agent::types::NavTarget, ui::ScreenSize};

    fn settings_screen() -> UiSnapshot {
        UiSnapshot::new(
            vec![
                UiElement::with_text("Settings"),
                UiElement::with_text("Toggle").bounds(300, 100, 400, 150),
            ],
            ScreenSize::default(),
            "com.android.settings",
        )
    }

    #[tokio::test]
    async fn test_touch_flips_toggle_text() {
        let mut driver = MockDriver::new(settings_screen()).with_toggles();

        driver.step(&Action::touch(350, 125)).await.unwrap();
        assert!(driver.observe().await.unwrap().extract_text().contains("toggle on"));

        driver.step(&Action::touch(350, 125)).await.unwrap();
        assert!(driver.observe().await.unwrap().extract_text().contains("toggle off"));

        driver.step(&Action::touch(10, 10)).await.unwrap();
        assert!(driver.observe().await.unwrap().extract_text().contains("toggle off"));
    }

    #[tokio::test]
    async fn test_screenshot_has_no_side_effect() {
        let mut driver = MockDriver::new(settings_screen()).with_toggles();
        let before = driver.observe().await.unwrap();
        for _ in 0..3 {
            let response = driver.step(&Action::screenshot()).await.unwrap();
            assert!(response.success);
            assert!(!response.ui_changed);
        }
        assert_eq!(driver.observe().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_scripted_failure_and_log() {
        let mut driver = MockDriver::new(settings_screen()).fail_call(2, "tap rejected");
        let log = driver.action_log();

        assert!(driver.step(&Action::key(NavTarget::Back)).await.unwrap().success);
        let response = driver.step(&Action::touch(1, 1)).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("tap rejected"));
        assert!(driver.step(&Action::touch(1, 1)).await.unwrap().success);
        assert_eq!(log.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_disconnect_is_an_error() {
        let mut driver = MockDriver::new(settings_screen()).disconnect_after(1);
        assert!(driver.step(&Action::screenshot()).await.is_ok());
        assert!(driver.step(&Action::screenshot()).await.is_err());
        assert!(driver.observe().await.is_err());
    }
}
