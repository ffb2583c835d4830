//! Aggregate statistics models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, MatchResult, PlayerId, RaceId, RegionId};

/// Win/loss counters plus the derived win rate.
///
/// `total == wins + losses` holds after every `record` call. `win_rate` is
/// only meaningful once the finalizer has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLine {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

impl StatLine {
    /// Count one game with the given result.
    pub fn record(&mut self, result: MatchResult) {
        self.total += 1;
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
        }
    }
}

/// One entry in a player's match history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchHistoryEntry {
    pub id: MatchId,
    pub opponent: PlayerId,
    pub player_race: RaceId,
    pub opponent_race: RaceId,
    pub region: RegionId,
    pub result: MatchResult,
    pub timestamp: Option<String>,
    pub season: Option<String>,
}

/// Per-player statistics. Serializes directly as the player output file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntity {
    pub player: PlayerId,
    pub summary: StatLine,
    pub by_race: BTreeMap<RaceId, StatLine>,
    pub by_region: BTreeMap<RegionId, StatLine>,
    /// History in input processing order
    pub matches: Vec<MatchHistoryEntry>,
}

impl PlayerEntity {
    pub fn new(player: impl Into<PlayerId>) -> Self {
        Self {
            player: player.into(),
            ..Default::default()
        }
    }
}

/// Per-race (faction) statistics. Serializes directly as the race output file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactionEntity {
    pub race: RaceId,
    pub summary: StatLine,
    pub by_region: BTreeMap<RegionId, StatLine>,
}

impl FactionEntity {
    pub fn new(race: impl Into<RaceId>) -> Self {
        Self {
            race: race.into(),
            ..Default::default()
        }
    }
}

/// Per-region statistics.
///
/// `summary.total` counts participations, so it is twice the number of
/// matches played in the region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionEntity {
    pub region: RegionId,
    pub summary: StatLine,
    pub players: BTreeMap<PlayerId, StatLine>,
    pub races: BTreeMap<RaceId, StatLine>,
}

impl RegionEntity {
    pub fn new(region: impl Into<RegionId>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }
}

/// The three cross-tabulated tables produced by one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatTables {
    pub players: BTreeMap<PlayerId, PlayerEntity>,
    pub factions: BTreeMap<RaceId, FactionEntity>,
    pub regions: BTreeMap<RegionId, RegionEntity>,
}

impl StatTables {
    pub fn player(&self, name: &str) -> Option<&PlayerEntity> {
        self.players.get(name)
    }

    pub fn faction(&self, race: &str) -> Option<&FactionEntity> {
        self.factions.get(race)
    }

    pub fn region(&self, region: &str) -> Option<&RegionEntity> {
        self.regions.get(region)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.factions.is_empty() && self.regions.is_empty()
    }
}

/// A player's name next to a flattened stat line.
///
/// Used for leaderboard rows and for the player list of a region file:
/// `{ player, total, wins, losses, winRate }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player: PlayerId,
    #[serde(flatten)]
    pub stats: StatLine,
}

impl PlayerStanding {
    pub fn new(player: impl Into<PlayerId>, stats: StatLine) -> Self {
        Self {
            player: player.into(),
            stats,
        }
    }
}

/// Global ranking of players by win rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub updated_at: DateTime<Utc>,
    pub players: Vec<PlayerStanding>,
}

impl Leaderboard {
    /// First `n` rows.
    pub fn top(&self, n: usize) -> &[PlayerStanding] {
        &self.players[..n.min(self.players.len())]
    }

    /// 1-based rank of a player, if present.
    pub fn rank_of(&self, player: &str) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.player == player)
            .map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stat_line_record() {
        let mut line = StatLine::default();
        line.record(MatchResult::Win);
        line.record(MatchResult::Loss);
        line.record(MatchResult::Win);

        assert_eq!(line.total, 3);
        assert_eq!(line.wins, 2);
        assert_eq!(line.losses, 1);
        assert_eq!(line.total, line.wins + line.losses);
    }

    #[test]
    fn test_stat_line_serialization() {
        let line = StatLine {
            total: 4,
            wins: 3,
            losses: 1,
            win_rate: 0.75,
        };
        let json = serde_json::to_value(line).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "total": 4, "wins": 3, "losses": 1, "winRate": 0.75 })
        );
    }

    #[test]
    fn test_player_standing_flattens_stats() {
        let standing = PlayerStanding::new(
            "Alice",
            StatLine {
                total: 2,
                wins: 1,
                losses: 1,
                win_rate: 0.5,
            },
        );
        let json = serde_json::to_value(&standing).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "player": "Alice", "total": 2, "wins": 1, "losses": 1, "winRate": 0.5
            })
        );

        let back: PlayerStanding = serde_json::from_value(json).unwrap();
        assert_eq!(back, standing);
    }

    #[test]
    fn test_player_entity_field_names() {
        let json = serde_json::to_value(PlayerEntity::new("Alice")).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["player", "summary", "byRace", "byRegion", "matches"] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_leaderboard_top_and_rank() {
        let board = Leaderboard {
            updated_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            players: vec![
                PlayerStanding::new("Bob", StatLine::default()),
                PlayerStanding::new("Carol", StatLine::default()),
            ],
        };

        assert_eq!(board.top(1).len(), 1);
        assert_eq!(board.top(10).len(), 2);
        assert_eq!(board.rank_of("Carol"), Some(2));
        assert_eq!(board.rank_of("Dave"), None);
    }

    #[test]
    fn test_leaderboard_updated_at_is_rfc3339() {
        let board = Leaderboard {
            updated_at: Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 0).unwrap(),
            players: vec![],
        };
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["updatedAt"], "2025-06-15T12:30:00Z");
        assert!(json["players"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_stat_tables_lookup() {
        let mut tables = StatTables::default();
        assert!(tables.is_empty());

        tables
            .players
            .insert("Alice".to_string(), PlayerEntity::new("Alice"));
        tables
            .factions
            .insert("Orc".to_string(), FactionEntity::new("Orc"));
        tables
            .regions
            .insert("EU".to_string(), RegionEntity::new("EU"));

        assert!(!tables.is_empty());
        assert!(tables.player("Alice").is_some());
        assert!(tables.faction("Orc").is_some());
        assert!(tables.region("EU").is_some());
        assert!(tables.player("alice").is_none());
    }
}
