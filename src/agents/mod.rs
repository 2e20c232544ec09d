pub mod executor_agent;
pub mod planner_agent;
pub mod supervisor_agent;
pub mod verifier_agent;

pub use executor_agent::ExecutorAgent;
pub use planner_agent::PlannerAgent;
pub use supervisor_agent::SupervisorAgent;
pub use verifier_agent::VerifierAgent;
