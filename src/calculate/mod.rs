//! Statistics calculation engine.
//!
//! Computes the derived tables from normalized match records:
//! - Per-player, per-race and per-region win/loss tables
//! - Rounded win rates on every stat line
//! - The global leaderboard

mod accumulate;
mod finalize;
mod leaderboard;

pub use accumulate::*;
pub use finalize::*;
pub use leaderboard::*;

/// Win rate in thousandths, rounded half away from zero.
///
/// Integer arithmetic keeps the result exact: `round(1000 * wins / total)`
/// equals `floor((2000 * wins + total) / (2 * total))` for non-negative
/// inputs.
pub fn win_rate_thousandths(wins: u32, total: u32) -> u64 {
    if total == 0 {
        return 0;
    }
    let wins = u64::from(wins);
    let total = u64::from(total);
    (2000 * wins + total) / (2 * total)
}

/// Calculate win rate from wins and total games, rounded to 3 decimals.
pub fn calculate_win_rate(wins: u32, total: u32) -> f64 {
    win_rate_thousandths(wins, total) as f64 / 1000.0
}
