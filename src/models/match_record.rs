//! Match record model — one completed game between two players.

use serde::{Deserialize, Serialize};

use super::{MatchId, PlayerId, RaceId, RegionId};

/// A raw payload as handed over by a record source, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPayload {
    /// Identifier assigned by the source (issue number or position)
    pub id: MatchId,

    /// Unvalidated payload text, expected to hold a JSON object
    pub body: String,
}

impl RawPayload {
    pub fn new(id: MatchId, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }
}

/// Outcome of a match from one side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Win => write!(f, "win"),
            MatchResult::Loss => write!(f, "loss"),
        }
    }
}

/// A validated match record.
///
/// Only the normalizer builds these, so every field that is required is
/// non-empty and `winner` always names one of the two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub race_a: RaceId,
    pub race_b: RaceId,
    pub winner: PlayerId,
    pub region: RegionId,
    pub timestamp: Option<String>,
    pub season: Option<String>,
}

/// One side's view of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participation<'a> {
    pub player: &'a str,
    pub opponent: &'a str,
    pub race: &'a str,
    pub opponent_race: &'a str,
    pub result: MatchResult,
}

impl MatchRecord {
    /// Result for the given side.
    fn result_for(&self, player: &str) -> MatchResult {
        if player == self.winner {
            MatchResult::Win
        } else {
            MatchResult::Loss
        }
    }

    /// Expand the record into its two participations, side A first.
    pub fn participations(&self) -> [Participation<'_>; 2] {
        [
            Participation {
                player: &self.player_a,
                opponent: &self.player_b,
                race: &self.race_a,
                opponent_race: &self.race_b,
                result: self.result_for(&self.player_a),
            },
            Participation {
                player: &self.player_b,
                opponent: &self.player_a,
                race: &self.race_b,
                opponent_race: &self.race_a,
                result: self.result_for(&self.player_b),
            },
        ]
    }
}
