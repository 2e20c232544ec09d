pub mod planner;
pub mod step;
pub mod templates;

pub use planner::{ErrorContext, Planner};
pub use step::{DEFAULT_STEP_TIMEOUT, Step};
