pub mod context;
pub mod report;
pub mod run_history;

pub use context::{QaConfig, RunContext};
pub use report::{
    Improvement, ImprovementKind, Priority, ReportSink, RunReport, RunSummary, TestReport,
    TracingReportSink,
};
pub use run_history::RunHistory;
