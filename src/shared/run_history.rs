use tokio::sync::RwLock;

use crate::{
    agent::verification::OverallStatus,
    error::Result,
    shared::report::{ReportSink, RunReport, RunSummary},
};

/// Append-only record of every finished run, shared across concurrent runs.
#[derive(Debug, Default)]
pub struct RunHistory {
    reports: RwLock<Vec<RunReport>>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, report: RunReport) {
        self.reports.write().await.push(report);
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }

    pub async fn reports(&self) -> Vec<RunReport> {
        self.reports.read().await.clone()
    }

    pub async fn summary(&self) -> RunSummary {
        let reports = self.reports.read().await;
        let total_runs = reports.len();
        let passed = reports
            .iter()
            .filter(|r| r.overall_status == OverallStatus::Passed)
            .count();
        RunSummary {
            total_runs,
            pass_rate: if total_runs == 0 {
                0.0
            } else {
                passed as f64 / total_runs as f64
            },
            total_bugs: reports.iter().map(|r| r.bugs.len()).sum(),
            run_history: reports.clone(),
        }
    }

    /// Hand the current summary to a sink.
    pub async fn publish(&self, sink: &dyn ReportSink) -> Result<RunSummary> {
        let summary = self.summary().await;
        sink.accept_summary(&summary).await?;
        Ok(summary)
    }
}
