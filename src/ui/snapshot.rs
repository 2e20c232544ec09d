use serde::{Deserialize, Serialize};

/// Element rectangle in screen pixels, serialized as `[left, top, right, bottom]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A rectangle with positive width and height.
    pub fn is_valid(&self) -> bool {
        self.left < self.right && self.top < self.bottom
    }

    /// Integer midpoint, flooring each axis.
    pub fn center(&self) -> (i32, i32) {
        (midpoint(self.left, self.right), midpoint(self.top, self.bottom))
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.left as i64 && x < self.right as i64 && y >= self.top as i64 && y < self.bottom as i64
    }
}

// the mean of two i32 values always fits back into i32
fn midpoint(a: i32, b: i32) -> i32 {
    (a as i64 + b as i64).div_euclid(2) as i32
}

impl From<[i32; 4]> for Bounds {
    fn from(b: [i32; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }
}

impl From<Bounds> for [i32; 4] {
    fn from(b: Bounds) -> Self {
        [b.left, b.top, b.right, b.bottom]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether a signed point lies on screen; converts it when it does.
    pub fn clamp_point(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        (x < self.width && y < self.height).then_some((x, y))
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
        }
    }
}

/// One node of the accessibility tree as reported by the driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    #[serde(default)]
    pub text: String,

    #[serde(default, alias = "content-desc")]
    pub content_description: String,

    #[serde(default, alias = "resource-id", alias = "id")]
    pub resource_id: String,

    #[serde(default, alias = "class")]
    pub class_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,

    #[serde(default)]
    pub clickable: bool,

    #[serde(default)]
    pub scrollable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiElement>,
}

impl UiElement {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bounds(mut self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        self.bounds = Some(Bounds::new(left, top, right, bottom));
        self
    }

    pub fn id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = resource_id.into();
        self
    }

    pub fn class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.content_description = description.into();
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    pub fn child(mut self, child: UiElement) -> Self {
        self.children.push(child);
        self
    }

    /// Carries text, description or resource id; anything else is invisible to grounding.
    pub fn has_signal(&self) -> bool {
        !(self.text.is_empty() && self.content_description.is_empty() && self.resource_id.is_empty())
    }
}

/// The element tree plus metadata captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSnapshot {
    pub elements: Vec<UiElement>,

    #[serde(default)]
    pub screen_size: ScreenSize,

    #[serde(default)]
    pub activity_id: String,
}

impl UiSnapshot {
    pub fn new(elements: Vec<UiElement>, screen_size: ScreenSize, activity_id: impl Into<String>) -> Self {
        Self {
            elements,
            screen_size,
            activity_id: activity_id.into(),
        }
    }

    /// All `text` and `content_description` values in pre-order, space separated and lower-cased.
    pub fn extract_text(&self) -> String {
        let mut texts: Vec<&str> = Vec::new();
        let mut stack: Vec<&UiElement> = self.elements.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if !node.text.is_empty() {
                texts.push(&node.text);
            }
            if !node.content_description.is_empty() {
                texts.push(&node.content_description);
            }
            stack.extend(node.children.iter().rev());
        }
        texts.join(" ").to_lowercase()
    }

    pub fn element_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&UiElement> = self.elements.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_floors() {
        assert_eq!(Bounds::new(300, 100, 400, 150).center(), (350, 125));
        assert_eq!(Bounds::new(0, 0, 5, 3).center(), (2, 1));
        assert_eq!(Bounds::new(1, 1, 4, 4).center(), (2, 2));
    }

    #[test]
    fn test_bounds_serialize_as_array() {
        let element = UiElement::with_text("Toggle").bounds(300, 100, 400, 150);
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["bounds"], serde_json::json!([300, 100, 400, 150]));

        let parsed: UiElement = serde_json::from_value(serde_json::json!({
            "text": "WiFi",
            "resource-id": "wifi_option",
            "bounds": [50, 200, 350, 250]
        }))
        .unwrap();
        assert_eq!(parsed.resource_id, "wifi_option");
        assert_eq!(parsed.bounds, Some(Bounds::new(50, 200, 350, 250)));
    }

    #[test]
    fn test_bounds_reject_wrong_arity() {
        let parsed = serde_json::from_value::<UiElement>(serde_json::json!({
            "text": "WiFi",
            "bounds": [1, 2, 3]
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_extract_text_walks_tree_in_order() {
        let snapshot = UiSnapshot::new(
            vec![
                UiElement::with_text("Settings")
                    .child(UiElement::with_text("WiFi").description("Wireless"))
                    .child(UiElement::default().id("divider")),
                UiElement::with_text("Toggle ON"),
            ],
            ScreenSize::default(),
            "settings",
        );
        assert_eq!(snapshot.extract_text(), "settings wifi wireless toggle on");
        assert_eq!(snapshot.element_count(), 4);
    }
}
