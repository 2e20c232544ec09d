use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    agent::verification::{OverallStatus, VerificationOutcome, VerificationStatus},
    error::Result,
};

/// Folded result of one run; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub goal: String,
    pub overall_status: OverallStatus,
    pub total_steps: usize,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub outcomes: Vec<VerificationOutcome>,
    /// Outcomes classified BUG_DETECTED, in step order.
    pub bugs: Vec<VerificationOutcome>,
    pub created_at: DateTime<Utc>,
}

impl RunReport {
    pub fn from_outcomes(
        run_id: impl Into<String>,
        goal: impl Into<String>,
        outcomes: Vec<VerificationOutcome>,
    ) -> Self {
        let count = |status: VerificationStatus| {
            outcomes.iter().filter(|o| o.status == status).count()
        };
        Self {
            run_id: run_id.into(),
            goal: goal.into(),
            overall_status: OverallStatus::of(&outcomes),
            total_steps: outcomes.len(),
            passed_steps: count(VerificationStatus::Passed),
            failed_steps: count(VerificationStatus::Failed),
            bugs: outcomes
                .iter()
                .filter(|o| o.status == VerificationStatus::BugDetected)
                .cloned()
                .collect(),
            outcomes,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementKind {
    Robustness,
    BugReporting,
    Coverage,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Improvement {
    #[serde(alias = "type")]
    pub kind: ImprovementKind,
    pub suggestion: String,
    pub priority: Priority,
}

/// What the supervisor hands to the terminal sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub report: RunReport,
    pub improvements: Vec<Improvement>,
}

/// Cross-run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_runs: usize,
    pub pass_rate: f64,
    pub total_bugs: usize,
    pub run_history: Vec<RunReport>,
}

/// Consumer of finished reports; storage format is up to the implementation.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn accept_report(&self, report: &TestReport) -> Result<()>;

    async fn accept_summary(&self, summary: &RunSummary) -> Result<()>;
}

/// Writes reports to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReportSink;

#[async_trait]
impl ReportSink for TracingReportSink {
    async fn accept_report(&self, report: &TestReport) -> Result<()> {
        let run = &report.report;
        info!(
            "Report {}: '{}' {} ({}/{} passed, {} bugs, {} improvements)",
            run.run_id,
            run.goal,
            run.overall_status,
            run.passed_steps,
            run.total_steps,
            run.bugs.len(),
            report.improvements.len()
        );
        for bug in &run.bugs {
            info!(
                "  bug at step {}: {}",
                bug.step_id,
                bug.bug_description.as_deref().unwrap_or(&bug.reason)
            );
        }
        Ok(())
    }

    async fn accept_summary(&self, summary: &RunSummary) -> Result<()> {
        info!(
            "Summary: {} runs, pass rate {:.0}%, {} bugs",
            summary.total_runs,
            summary.pass_rate * 100.0,
            summary.total_bugs
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::UiSnapshot;

    fn outcome(step_id: u32, status: VerificationStatus) -> VerificationOutcome {
        VerificationOutcome {
            step_id,
            status,
            reason: status.to_string(),
            confidence: 0.8,
            needs_replanning: false,
            bug_description: None,
            resulting_state: UiSnapshot::default(),
        }
    }

    #[test]
    fn test_report_counts() {
        let report = RunReport::from_outcomes(
            "run-1",
            "Test turning WiFi on and off",
            vec![
                outcome(1, VerificationStatus::Passed),
                outcome(2, VerificationStatus::BugDetected),
                outcome(3, VerificationStatus::Failed),
                outcome(4, VerificationStatus::Unknown),
            ],
        );
        assert_eq!(report.overall_status, OverallStatus::BugDetected);
        assert_eq!(report.total_steps, 4);
        assert_eq!(report.passed_steps, 1);
        assert_eq!(report.failed_steps, 1);
        assert_eq!(report.bugs.len(), 1);
        assert_eq!(report.bugs[0].step_id, 2);
    }

    #[test]
    fn test_improvement_parsing() {
        let parsed: Vec<Improvement> = serde_json::from_str(
            r#"[{"type": "robustness", "suggestion": "Add waits", "priority": "high"},
                {"kind": "ux", "suggestion": "Larger toggles", "priority": "low"}]"#,
        )
        .unwrap();
        assert_eq!(parsed[0].kind, ImprovementKind::Robustness);
        assert_eq!(parsed[1].kind, ImprovementKind::Other);
    }
}
