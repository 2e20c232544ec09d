pub mod heuristic;
pub mod status;
pub mod verifier;

pub use heuristic::{HeuristicVerdict, HeuristicVerifier};
pub use status::{OverallStatus, VerificationOutcome, VerificationStatus};
pub use verifier::{Judgment, Verifier};
