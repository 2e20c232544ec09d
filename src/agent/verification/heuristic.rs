use std::collections::HashSet;

use crate::{agent::verification::status::VerificationStatus, ui::UiSnapshot};

/// Words ignored when looking for an expectation's keywords on screen.
const IGNORED_WORDS: &[&str] = &[
    "visible", "open", "opened", "the", "and", "are", "now", "with", "should", "screen", "shown",
    "displayed",
];

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicVerdict {
    pub status: VerificationStatus,
    pub reason: String,
    pub confidence: f64,
}

/// Deterministic text-matching verdicts.
///
/// Recognizes presence checks ("... visible", "... open") and binary toggle
/// checks ("... on", "... off"); everything else is a low-confidence failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicVerifier {
    pass_confidence: f64,
    unverified_confidence: f64,
}

impl HeuristicVerifier {
    pub fn new(pass_confidence: f64, unverified_confidence: f64) -> Self {
        Self {
            pass_confidence: pass_confidence.clamp(0.0, 1.0),
            unverified_confidence: unverified_confidence.clamp(0.0, 1.0),
        }
    }

    pub fn verify(&self, expected_outcome: &str, snapshot: &UiSnapshot) -> HeuristicVerdict {
        let expected = expected_outcome.to_lowercase();
        let expected_words = words(&expected);
        let screen_text = snapshot.extract_text();

        if expected.contains("visible") || expected.contains("open") {
            let found = expected_words
                .iter()
                .filter(|w| w.chars().count() >= 3 && !IGNORED_WORDS.contains(w))
                .find(|w| screen_text.contains(**w));
            if let Some(keyword) = found {
                return self.passed(format!("Expected content found: '{}'", keyword));
            }
        } else if expected_words.iter().any(|w| *w == "on" || *w == "off") {
            let screen_words: HashSet<&str> = words(&screen_text).into_iter().collect();
            let required: Vec<&str> = ["on", "off"]
                .into_iter()
                .filter(|state| expected_words.contains(state))
                .collect();
            if required.iter().all(|state| screen_words.contains(state)) {
                return self.passed(format!("Toggle state '{}' present", required.join("/")));
            }
        }

        HeuristicVerdict {
            status: VerificationStatus::Failed,
            reason: "Could not verify expected outcome".to_string(),
            confidence: self.unverified_confidence,
        }
    }

    fn passed(&self, reason: String) -> HeuristicVerdict {
        HeuristicVerdict {
            status: VerificationStatus::Passed,
            reason,
            confidence: self.pass_confidence,
        }
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{ScreenSize, UiElement};

    fn snapshot(texts: &[&str]) -> UiSnapshot {
        UiSnapshot::new(
            texts.iter().map(|t| UiElement::with_text(*t)).collect(),
            ScreenSize::default(),
            "",
        )
    }

    fn heuristic() -> HeuristicVerifier {
        HeuristicVerifier::new(0.8, 0.3)
    }

    #[test]
    fn test_presence_check() {
        let verdict = heuristic().verify("WiFi settings visible", &snapshot(&["Settings", "WiFi"]));
        assert_eq!(verdict.status, VerificationStatus::Passed);
        assert_eq!(verdict.reason, "Expected content found: 'wifi'");
        assert_eq!(verdict.confidence, 0.8);

        let verdict = heuristic().verify("Alarm list visible", &snapshot(&["Settings"]));
        assert_eq!(verdict.status, VerificationStatus::Failed);
        assert_eq!(verdict.confidence, 0.3);
    }

    #[test]
    fn test_toggle_check_needs_whole_word() {
        let verdict = heuristic().verify("WiFi is now on", &snapshot(&["WiFi", "Toggle ON"]));
        assert_eq!(verdict.status, VerificationStatus::Passed);

        // "connection" contains "on" but not as a word
        let verdict = heuristic().verify("WiFi is now on", &snapshot(&["Connection", "Toggle"]));
        assert_eq!(verdict.status, VerificationStatus::Failed);

        let verdict = heuristic().verify("WiFi is now off", &snapshot(&["Toggle ON"]));
        assert_eq!(verdict.status, VerificationStatus::Failed);
    }

    #[test]
    fn test_unrecognized_expectation_fails_low() {
        let verdict = heuristic().verify("Alarm saved", &snapshot(&["Alarm saved"]));
        assert_eq!(verdict.status, VerificationStatus::Failed);
        assert_eq!(verdict.reason, "Could not verify expected outcome");
        assert_eq!(verdict.confidence, 0.3);
    }

    #[test]
    fn test_same_input_same_verdict() {
        let snap = snapshot(&["Settings", "WiFi", "Toggle ON"]);
        for expected in ["WiFi is now on", "Settings screen open", "Network saved", "Toggle off"] {
            let first = heuristic().verify(expected, &snap);
            let second = heuristic().verify(expected, &snap);
            assert_eq!((first.status, first.reason), (second.status, second.reason));
        }
    }
}
