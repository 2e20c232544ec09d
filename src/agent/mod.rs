pub mod core;
pub mod execution;
pub mod grounding;
pub mod planning;
pub mod types;
pub mod verification;

pub use core::{AgentBehavior, BaseAgent};
pub use execution::Executor;
pub use grounding::GroundingResolver;
pub use planning::{ErrorContext, Planner, Step};
pub use verification::Verifier;
