//! Leaderboard construction.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{Leaderboard, PlayerEntity, PlayerId, PlayerStanding};

/// Leaderboard order: descending win rate, then ascending player name.
pub fn compare_standings(a: &PlayerStanding, b: &PlayerStanding) -> Ordering {
    b.stats
        .win_rate
        .total_cmp(&a.stats.win_rate)
        .then_with(|| a.player.cmp(&b.player))
}

/// Rank every player in a finalized player table.
pub fn build_leaderboard(
    players: &BTreeMap<PlayerId, PlayerEntity>,
    updated_at: DateTime<Utc>,
) -> Leaderboard {
    let mut rows: Vec<PlayerStanding> = players
        .values()
        .map(|p| PlayerStanding::new(p.player.clone(), p.summary))
        .collect();
    rows.sort_by(compare_standings);

    Leaderboard {
        updated_at,
        players: rows,
    }
}
