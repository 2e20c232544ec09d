pub mod orchestrator;

pub use orchestrator::{Orchestrator, RunOutcome, Transition, run_all};
