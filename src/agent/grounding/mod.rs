pub mod criteria;
pub mod resolver;

pub use resolver::{Grounding, GroundingResolver, Resolution};
