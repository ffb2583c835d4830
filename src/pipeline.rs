//! Rebuild pipeline.
//!
//! Runs one full recomputation: fetch every payload, normalize, fold into
//! tables, finalize win rates, rank players, and hand the result to a sink.
//! Retrieval completes before any aggregation starts, and nothing reaches
//! the sink unless retrieval succeeded.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::calculate::{accumulate, build_leaderboard, finalize};
use crate::models::{Leaderboard, RawPayload, StatTables};
use crate::normalize::{normalize_all, NormalizeReport};
use crate::source::{RecordSource, SourceError};
use crate::storage::{materialize, EntitySink, StorageError};

/// Errors that abort a rebuild.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Record source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to persist output: {0}")]
    Storage(#[from] StorageError),
}

/// Finalized statistics for one run, before persistence.
#[derive(Debug)]
pub struct Computed {
    pub report: NormalizeReport,
    pub tables: StatTables,
    pub leaderboard: Leaderboard,
}

/// Aggregate a batch of payloads in memory.
pub fn compute(payloads: &[RawPayload], updated_at: DateTime<Utc>) -> Computed {
    let report = normalize_all(payloads);
    let mut tables = accumulate(&report.records);
    finalize(&mut tables);
    let leaderboard = build_leaderboard(&tables.players, updated_at);

    Computed {
        report,
        tables,
        leaderboard,
    }
}

/// Counts reported after a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub payloads: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub players: usize,
    pub races: usize,
    pub regions: usize,
    pub documents: usize,
}

/// Run the whole pipeline from `source` into `sink`.
pub async fn rebuild(
    source: &dyn RecordSource,
    sink: &mut dyn EntitySink,
    updated_at: DateTime<Utc>,
) -> Result<RebuildSummary, PipelineError> {
    info!("Fetching records from {}", source.name());
    let payloads = source.fetch_all().await.map_err(|e| {
        error!("Record source {} failed: {}", source.name(), e);
        e
    })?;

    let computed = compute(&payloads, updated_at);
    if computed.tables.is_empty() {
        warn!(
            "No valid match records among {} payloads; output will be empty",
            payloads.len()
        );
    }
    let written = materialize(&computed.tables, &computed.leaderboard, sink)?;

    let summary = RebuildSummary {
        payloads: payloads.len(),
        accepted: computed.report.accepted(),
        skipped: computed.report.skipped_count(),
        players: written.players,
        races: written.races,
        regions: written.regions,
        documents: written.documents(),
    };
    info!(
        "Rebuild complete: {} of {} payloads accepted, {} documents written",
        summary.accepted, summary.payloads, summary.documents
    );
    Ok(summary)
}
