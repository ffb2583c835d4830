//! Output materialization.
//!
//! Decides which documents a run produces and what they look like; the
//! `EntitySink` decides where they go.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use super::StorageError;
use crate::models::{
    short_hash, FactionEntity, Leaderboard, PlayerEntity, PlayerStanding, RaceId, RegionEntity,
    StatLine, StatTables,
};

pub const PLAYERS_DIR: &str = "players";
pub const RACES_DIR: &str = "races";
pub const REGIONS_DIR: &str = "regions";
pub const LEADERBOARD_FILE: &str = "leaderboard.json";

/// Kinds of output documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Player,
    Race,
    Region,
    Leaderboard,
}

/// Region file shape: players are listed as flattened rows.
#[derive(Debug, Serialize)]
pub struct RegionDocument<'a> {
    pub region: &'a str,
    pub summary: StatLine,
    /// Ordered by ascending player name
    pub players: Vec<PlayerStanding>,
    pub races: &'a BTreeMap<RaceId, StatLine>,
}

impl<'a> From<&'a RegionEntity> for RegionDocument<'a> {
    fn from(region: &'a RegionEntity) -> Self {
        Self {
            region: &region.region,
            summary: region.summary,
            players: region
                .players
                .iter()
                .map(|(name, stats)| PlayerStanding::new(name.clone(), *stats))
                .collect(),
            races: &region.races,
        }
    }
}

/// One persisted document, borrowing from the finalized tables.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OutputDocument<'a> {
    Player(&'a PlayerEntity),
    Race(&'a FactionEntity),
    Region(RegionDocument<'a>),
    Leaderboard(&'a Leaderboard),
}

impl OutputDocument<'_> {
    pub fn kind(&self) -> DocumentKind {
        match self {
            OutputDocument::Player(_) => DocumentKind::Player,
            OutputDocument::Race(_) => DocumentKind::Race,
            OutputDocument::Region(_) => DocumentKind::Region,
            OutputDocument::Leaderboard(_) => DocumentKind::Leaderboard,
        }
    }

    /// Path relative to the output directory.
    pub fn relative_path(&self) -> PathBuf {
        let (dir, id) = match self {
            OutputDocument::Player(p) => (PLAYERS_DIR, p.player.as_str()),
            OutputDocument::Race(f) => (RACES_DIR, f.race.as_str()),
            OutputDocument::Region(r) => (REGIONS_DIR, r.region),
            OutputDocument::Leaderboard(_) => return PathBuf::from(LEADERBOARD_FILE),
        };
        PathBuf::from(dir).join(format!("{}.json", file_stem(id)))
    }
}

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("file stem pattern is valid"));

/// Derive a file stem from an entity identifier.
///
/// Safe identifiers are used unchanged. Anything else has unsafe characters
/// replaced with `_` and a hash of the original appended, so two different
/// identifiers never share a file.
pub fn file_stem(identifier: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(identifier, "_");
    if cleaned == identifier && !identifier.is_empty() && !identifier.starts_with('.') {
        return identifier.to_string();
    }
    format!(
        "{}-{}",
        cleaned.trim_start_matches('.'),
        short_hash(&[identifier], 8)
    )
}

/// Capability to persist output documents.
///
/// Nothing a sink persists may become visible before `commit` succeeds.
pub trait EntitySink {
    /// Stage one document.
    fn persist(&mut self, document: &OutputDocument<'_>) -> Result<(), StorageError>;

    /// Publish everything staged so far.
    fn commit(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Counts of documents handed to a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub players: usize,
    pub races: usize,
    pub regions: usize,
}

impl MaterializeSummary {
    /// Total documents including the leaderboard.
    pub fn documents(&self) -> usize {
        self.players + self.races + self.regions + 1
    }
}

/// Hand every entity and the leaderboard to the sink, then commit.
pub fn materialize(
    tables: &StatTables,
    leaderboard: &Leaderboard,
    sink: &mut dyn EntitySink,
) -> Result<MaterializeSummary, StorageError> {
    let mut summary = MaterializeSummary::default();

    for player in tables.players.values() {
        sink.persist(&OutputDocument::Player(player))?;
        summary.players += 1;
    }
    for faction in tables.factions.values() {
        sink.persist(&OutputDocument::Race(faction))?;
        summary.races += 1;
    }
    for region in tables.regions.values() {
        sink.persist(&OutputDocument::Region(RegionDocument::from(region)))?;
        summary.regions += 1;
    }
    sink.persist(&OutputDocument::Leaderboard(leaderboard))?;
    sink.commit()?;

    info!(
        "Materialized {} players, {} races, {} regions and the leaderboard",
        summary.players, summary.races, summary.regions
    );
    Ok(summary)
}
