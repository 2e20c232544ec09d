//! Orchestration core for exploratory mobile UI testing: plan a goal into
//! steps, ground each step on the current screen, execute it through a
//! device driver, verify the outcome and replan on failure.

pub mod agent;
pub mod agents;
pub mod driver;
pub mod error;
pub mod judgment;
pub mod multi_agent;
pub mod prompt;
pub mod shared;
pub mod ui;
pub mod utils;

pub use error::{Error, Result};
pub use multi_agent::{Orchestrator, RunOutcome};
