pub mod executor;

pub use executor::{ExecutionSummary, Executor};
