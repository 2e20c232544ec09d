pub mod communication;
pub mod manager;

pub use communication::{Message, MessagePayload};
pub use manager::{Orchestrator, RunOutcome, Transition, run_all};
