//! Classified email records and the snapshot they arrive in.

mod model;
mod wire;

pub use model::{Breakdown, EmailVerdict, RedFlag, Recommendation, Snapshot, ThreatLevel};
pub use wire::ApiResponse;
