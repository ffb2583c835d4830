//! Core data models for match aggregation.

mod ids;
mod match_record;
mod stats;

pub use ids::*;
pub use match_record::*;
pub use stats::*;
