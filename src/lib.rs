//! # Battle Rank
//!
//! Aggregates match results into player, race and region statistics plus a
//! global win-rate leaderboard.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (match records, stat lines, entities)
//! - **normalize**: Payload validation into match records
//! - **calculate**: Accumulation, win-rate finalization, leaderboard
//! - **storage**: Output documents and sinks
//! - **source**: Record retrieval (GitHub issues, local files)
//! - **pipeline**: One full rebuild from source to sink
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod storage;

pub use models::*;
