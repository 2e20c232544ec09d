use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ui::UiSnapshot;

/// Terminal classification of one executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Passed,
    Failed,
    BugDetected,
    Unknown,
}

impl VerificationStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, VerificationStatus::Passed)
    }

    /// Accepts the spellings judgment models tend to use.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "PASSED" | "PASS" | "SUCCESS" => Some(VerificationStatus::Passed),
            "FAILED" | "FAIL" | "FAILURE" => Some(VerificationStatus::Failed),
            "BUG_DETECTED" | "BUG" => Some(VerificationStatus::BugDetected),
            "UNKNOWN" => Some(VerificationStatus::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Passed => write!(f, "PASSED"),
            VerificationStatus::Failed => write!(f, "FAILED"),
            VerificationStatus::BugDetected => write!(f, "BUG_DETECTED"),
            VerificationStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Passed,
    Failed,
    BugDetected,
    PartialPass,
}

impl OverallStatus {
    /// BUG_DETECTED over FAILED over all-PASSED; anything else is PARTIAL_PASS.
    /// An empty set folds to PASSED.
    pub fn fold<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = VerificationStatus>,
    {
        let mut any_bug = false;
        let mut any_failed = false;
        let mut all_passed = true;
        for status in statuses {
            match status {
                VerificationStatus::BugDetected => any_bug = true,
                VerificationStatus::Failed => any_failed = true,
                VerificationStatus::Passed | VerificationStatus::Unknown => {}
            }
            all_passed &= status.is_passed();
        }

        if any_bug {
            OverallStatus::BugDetected
        } else if any_failed {
            OverallStatus::Failed
        } else if all_passed {
            OverallStatus::Passed
        } else {
            OverallStatus::PartialPass
        }
    }

    pub fn of(outcomes: &[VerificationOutcome]) -> Self {
        Self::fold(outcomes.iter().map(|o| o.status))
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Passed => write!(f, "PASSED"),
            OverallStatus::Failed => write!(f, "FAILED"),
            OverallStatus::BugDetected => write!(f, "BUG_DETECTED"),
            OverallStatus::PartialPass => write!(f, "PARTIAL_PASS"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub step_id: u32,
    pub status: VerificationStatus,
    pub reason: String,
    /// Always within [0, 1].
    pub confidence: f64,
    pub needs_replanning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug_description: Option<String>,
    pub resulting_state: UiSnapshot,
}
