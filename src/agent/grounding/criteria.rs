//! Keyword extraction and match criteria used by the grounding resolver.

use std::fmt;

use once_cell::sync::Lazy;

use crate::{
    agent::{planning::Step, types::ActionKind},
    ui::{ScreenSize, UiElement},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeywordRank {
    Widget,
    Domain,
    Residual,
}

struct KeywordEntry {
    group: &'static str,
    rank: KeywordRank,
    /// Words in a target that select this group.
    triggers: &'static [&'static str],
    /// Words looked for in element text and ids.
    synonyms: &'static [&'static str],
    class_hints: &'static [&'static str],
}

static VOCABULARY: Lazy<Vec<KeywordEntry>> = Lazy::new(|| {
    use KeywordRank::*;
    vec![
        KeywordEntry {
            group: "toggle",
            rank: Widget,
            triggers: &["toggle", "switch"],
            synonyms: &["toggle", "switch"],
            class_hints: &["switch", "toggle"],
        },
        KeywordEntry {
            group: "checkbox",
            rank: Widget,
            triggers: &["checkbox", "check box"],
            synonyms: &["checkbox", "check"],
            class_hints: &["checkbox"],
        },
        KeywordEntry {
            group: "button",
            rank: Widget,
            triggers: &["button"],
            synonyms: &["button"],
            class_hints: &["button"],
        },
        KeywordEntry {
            group: "field",
            rank: Widget,
            triggers: &["field", "input", "text box", "search"],
            synonyms: &["field", "input", "search", "edit"],
            class_hints: &["edittext"],
        },
        KeywordEntry {
            group: "tab",
            rank: Widget,
            triggers: &["tab"],
            synonyms: &["tab"],
            class_hints: &["tab"],
        },
        KeywordEntry {
            group: "wifi",
            rank: Domain,
            triggers: &["wifi", "wi-fi", "wireless", "wlan"],
            synonyms: &["wifi", "wi-fi", "wireless", "wlan"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "bluetooth",
            rank: Domain,
            triggers: &["bluetooth"],
            synonyms: &["bluetooth"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "network",
            rank: Domain,
            triggers: &["network", "internet"],
            synonyms: &["network", "internet"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "airplane",
            rank: Domain,
            triggers: &["airplane", "flight"],
            synonyms: &["airplane", "flight"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "location",
            rank: Domain,
            triggers: &["location", "gps"],
            synonyms: &["location"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "settings",
            rank: Domain,
            triggers: &["settings", "setting"],
            synonyms: &["settings"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "alarm",
            rank: Domain,
            triggers: &["alarm"],
            synonyms: &["alarm"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "clock",
            rank: Domain,
            triggers: &["clock"],
            synonyms: &["clock"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "back",
            rank: Domain,
            triggers: &["back"],
            synonyms: &["back", "navigate up"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "home",
            rank: Domain,
            triggers: &["home"],
            synonyms: &["home"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "dismiss",
            rank: Domain,
            triggers: &["dismiss", "blocker", "close", "cancel"],
            synonyms: &["dismiss", "close", "cancel", "got it", "not now", "skip", "allow", "ok"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "save",
            rank: Domain,
            triggers: &["save", "confirm", "done"],
            synonyms: &["save", "done", "confirm", "ok"],
            class_hints: &[],
        },
        KeywordEntry {
            group: "add",
            rank: Domain,
            triggers: &["add", "create", "new"],
            synonyms: &["add", "create", "new"],
            class_hints: &[],
        },
    ]
});

/// Target words that never become residual keywords.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "onto", "this", "that", "then", "now", "app",
    "application", "screen", "option", "options", "icon", "item", "page", "list", "element",
    "view",
];

/// Screen-relative tap points used when no element matches.
pub struct CoordinateFallback {
    pub keyword: &'static str,
    pub x_ratio: f64,
    pub y_ratio: f64,
}

static COORDINATE_FALLBACKS: Lazy<Vec<CoordinateFallback>> = Lazy::new(|| {
    let entry = |keyword: &'static str, x_ratio: f64, y_ratio: f64| CoordinateFallback {
        keyword,
        x_ratio,
        y_ratio,
    };
    vec![
        entry("toggle", 0.648, 0.104),
        entry("switch", 0.648, 0.104),
        entry("wifi", 0.278, 0.156),
        entry("wi-fi", 0.278, 0.156),
        entry("bluetooth", 0.278, 0.26),
        entry("settings", 0.185, 0.208),
        entry("back", 0.056, 0.042),
        entry("home", 0.5, 0.958),
    ]
});

/// Tap point from the fallback table, for tap steps only.
pub fn coordinate_fallback(step: &Step, screen: ScreenSize) -> Option<(&'static str, (u32, u32))> {
    if step.action_kind != ActionKind::Tap || screen.width == 0 || screen.height == 0 {
        return None;
    }
    let target = step.target.to_lowercase();
    COORDINATE_FALLBACKS
        .iter()
        .find(|entry| target.contains(entry.keyword))
        .map(|entry| {
            let x = ((entry.x_ratio * screen.width as f64) as u32).min(screen.width - 1);
            let y = ((entry.y_ratio * screen.height as f64) as u32).min(screen.height - 1);
            (entry.keyword, (x, y))
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordGroup {
    pub name: String,
    pub rank: KeywordRank,
    pub synonyms: Vec<String>,
    class_hints: Vec<String>,
}

impl KeywordGroup {
    fn matches(&self, haystack: &str) -> bool {
        self.synonyms.iter().any(|s| haystack.contains(s.as_str()))
    }
}

fn target_words(target: &str) -> Vec<String> {
    target
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn word_matches(word: &str, trigger: &str) -> bool {
    word == trigger
        || word
            .strip_prefix(trigger)
            .is_some_and(|rest| rest == "s" || rest == "es")
}

/// Keyword groups for a target, widget words first, then domain words,
/// then leftover words; ties keep target order.
pub fn keyword_groups(target: &str) -> Vec<KeywordGroup> {
    let lowered = target.to_lowercase();
    let words = target_words(target);
    let mut consumed = vec![false; words.len()];
    let mut found: Vec<(usize, KeywordGroup)> = Vec::new();

    for entry in VOCABULARY.iter() {
        let mut position = None;
        for trigger in entry.triggers {
            if trigger.contains([' ', '-']) {
                if let Some(at) = lowered.find(trigger) {
                    let word_index = lowered[..at]
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|w| !w.is_empty())
                        .count();
                    position = Some(position.map_or(word_index, |p: usize| p.min(word_index)));
                    for (i, word) in words.iter().enumerate() {
                        if trigger.split([' ', '-']).any(|part| part == word) {
                            consumed[i] = true;
                        }
                    }
                }
                continue;
            }
            for (i, word) in words.iter().enumerate() {
                if word_matches(word, trigger) {
                    consumed[i] = true;
                    position = Some(position.map_or(i, |p: usize| p.min(i)));
                }
            }
        }
        if let Some(position) = position {
            found.push((
                position,
                KeywordGroup {
                    name: entry.group.to_string(),
                    rank: entry.rank,
                    synonyms: entry.synonyms.iter().map(|s| s.to_string()).collect(),
                    class_hints: entry.class_hints.iter().map(|s| s.to_string()).collect(),
                },
            ));
        }
    }

    for (i, word) in words.iter().enumerate() {
        if consumed[i] || word.chars().count() < 3 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        if found.iter().any(|(_, g)| g.rank == KeywordRank::Residual && g.name == *word) {
            continue;
        }
        found.push((
            i,
            KeywordGroup {
                name: word.clone(),
                rank: KeywordRank::Residual,
                synonyms: vec![word.clone()],
                class_hints: Vec::new(),
            },
        ));
    }

    found.sort_by_key(|(position, group)| (group.rank, *position));
    found.into_iter().map(|(_, group)| group).collect()
}

/// One way an element can match a step target.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    PhraseInText(String),
    AllGroupsInText(Vec<KeywordGroup>),
    GroupInText(KeywordGroup),
    AllGroupsInId(Vec<KeywordGroup>),
    GroupInId(KeywordGroup),
    ClassHint(Vec<String>),
}

impl Criterion {
    pub fn matches(&self, element: &UiElement) -> bool {
        let text = || {
            format!(
                "{}\n{}",
                element.text.to_lowercase(),
                element.content_description.to_lowercase()
            )
        };
        match self {
            Criterion::PhraseInText(phrase) => text().contains(phrase.as_str()),
            Criterion::AllGroupsInText(groups) => {
                let text = text();
                groups.iter().all(|g| g.matches(&text))
            }
            Criterion::GroupInText(group) => group.matches(&text()),
            Criterion::AllGroupsInId(groups) => {
                let id = element.resource_id.to_lowercase();
                !id.is_empty() && groups.iter().all(|g| g.matches(&id))
            }
            Criterion::GroupInId(group) => {
                let id = element.resource_id.to_lowercase();
                !id.is_empty() && group.matches(&id)
            }
            Criterion::ClassHint(hints) => {
                let class = element.class_name.to_lowercase();
                !class.is_empty() && hints.iter().any(|h| class.contains(h.as_str()))
            }
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |groups: &[KeywordGroup]| {
            groups
                .iter()
                .map(|g| g.name.as_str())
                .collect::<Vec<_>>()
                .join("+")
        };
        match self {
            Criterion::PhraseInText(phrase) => write!(f, "phrase '{}' in text", phrase),
            Criterion::AllGroupsInText(groups) => write!(f, "{} in text", names(groups)),
            Criterion::GroupInText(group) => write!(f, "{} in text", group.name),
            Criterion::AllGroupsInId(groups) => write!(f, "{} in resource id", names(groups)),
            Criterion::GroupInId(group) => write!(f, "{} in resource id", group.name),
            Criterion::ClassHint(hints) => write!(f, "class like {}", hints.join("|")),
        }
    }
}

/// Criteria in evaluation order: text before id before class, specific before loose.
pub fn derive_criteria(step: &Step) -> Vec<Criterion> {
    let mut criteria = Vec::new();

    let phrase = step
        .target
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if !phrase.is_empty() {
        criteria.push(Criterion::PhraseInText(phrase));
    }

    let groups = keyword_groups(&step.target);
    if groups.len() > 1 {
        criteria.push(Criterion::AllGroupsInText(groups.clone()));
    }
    criteria.extend(groups.iter().cloned().map(Criterion::GroupInText));
    if groups.len() > 1 {
        criteria.push(Criterion::AllGroupsInId(groups.clone()));
    }
    criteria.extend(groups.iter().cloned().map(Criterion::GroupInId));

    let mut hints: Vec<String> = Vec::new();
    for hint in groups.iter().flat_map(|g| g.class_hints.iter()) {
        if !hints.contains(hint) {
            hints.push(hint.clone());
        }
    }
    if hints.is_empty() && step.action_kind == ActionKind::Type {
        hints.push("edittext".to_string());
    }
    if !hints.is_empty() {
        criteria.push(Criterion::ClassHint(hints));
    }

    criteria
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(groups: &[KeywordGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_widget_words_rank_first() {
        let groups = keyword_groups("WiFi toggle switch");
        assert_eq!(names(&groups), ["toggle", "wifi"]);

        let groups = keyword_groups("Wi-Fi Calling button");
        assert_eq!(names(&groups), ["button", "wifi", "calling"]);
    }

    #[test]
    fn test_stopwords_are_not_residual() {
        let groups = keyword_groups("Settings app icon");
        assert_eq!(names(&groups), ["settings"]);
        assert!(keyword_groups("the app").is_empty());
    }

    #[test]
    fn test_criteria_order() {
        let step = Step::new(3, ActionKind::Tap, "WiFi toggle switch", "WiFi is now on");
        let criteria = derive_criteria(&step);
        assert_eq!(criteria[0], Criterion::PhraseInText("wifi toggle switch".to_string()));
        assert!(matches!(criteria[1], Criterion::AllGroupsInText(_)));
        assert!(matches!(&criteria[2], Criterion::GroupInText(g) if g.name == "toggle"));
        assert!(matches!(&criteria[3], Criterion::GroupInText(g) if g.name == "wifi"));
        assert!(matches!(criteria[4], Criterion::AllGroupsInId(_)));
        assert!(matches!(criteria.last(), Some(Criterion::ClassHint(h)) if h[0] == "switch"));
    }

    #[test]
    fn test_type_steps_hint_edit_text() {
        let step = Step::new(1, ActionKind::Type, "Network name", "Name entered").with_input("Guest");
        let criteria = derive_criteria(&step);
        assert!(matches!(criteria.last(), Some(Criterion::ClassHint(h)) if h == &["edittext".to_string()]));
    }

    #[test]
    fn test_coordinate_fallback_is_tap_only() {
        let screen = ScreenSize::default();
        let tap = Step::new(1, ActionKind::Tap, "Settings app", "Settings screen open");
        assert_eq!(coordinate_fallback(&tap, screen), Some(("settings", (199, 399))));

        let typed = Step::new(1, ActionKind::Type, "Settings search", "Results visible");
        assert_eq!(coordinate_fallback(&typed, screen), None);

        let unknown = Step::new(1, ActionKind::Tap, "Gallery", "Photos visible");
        assert_eq!(coordinate_fallback(&unknown, screen), None);
    }
}
