//! Win-rate finalization.

use crate::models::{StatLine, StatTables};

use super::calculate_win_rate;

impl StatLine {
    /// Set `win_rate` from the counters. Safe to call repeatedly.
    pub fn finalize(&mut self) {
        self.win_rate = calculate_win_rate(self.wins, self.total);
    }
}

/// Set the win rate on every stat line reachable from the tables.
pub fn finalize(tables: &mut StatTables) {
    for player in tables.players.values_mut() {
        player.summary.finalize();
        player.by_race.values_mut().for_each(StatLine::finalize);
        player.by_region.values_mut().for_each(StatLine::finalize);
    }

    for faction in tables.factions.values_mut() {
        faction.summary.finalize();
        faction.by_region.values_mut().for_each(StatLine::finalize);
    }

    for region in tables.regions.values_mut() {
        region.summary.finalize();
        region.players.values_mut().for_each(StatLine::finalize);
        region.races.values_mut().for_each(StatLine::finalize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::accumulate;
    use crate::models::MatchRecord;

    fn record(id: u64, a: &str, b: &str, winner: &str, region: &str) -> MatchRecord {
        MatchRecord {
            id,
            player_a: a.to_string(),
            player_b: b.to_string(),
            race_a: "Human".to_string(),
            race_b: "Orc".to_string(),
            winner: winner.to_string(),
            region: region.to_string(),
            timestamp: None,
            season: None,
        }
    }

    fn all_lines(tables: &StatTables) -> Vec<StatLine> {
        let mut lines = Vec::new();
        for p in tables.players.values() {
            lines.push(p.summary);
            lines.extend(p.by_race.values().copied());
            lines.extend(p.by_region.values().copied());
        }
        for f in tables.factions.values() {
            lines.push(f.summary);
            lines.extend(f.by_region.values().copied());
        }
        for r in tables.regions.values() {
            lines.push(r.summary);
            lines.extend(r.players.values().copied());
            lines.extend(r.races.values().copied());
        }
        lines
    }

    #[test]
    fn test_stat_line_finalize() {
        let mut line = StatLine {
            total: 3,
            wins: 2,
            losses: 1,
            win_rate: 0.0,
        };
        line.finalize();
        assert_eq!(line.win_rate, 0.667);
    }

    #[test]
    fn test_stat_line_finalize_zero_total() {
        let mut line = StatLine {
            win_rate: 0.9,
            ..Default::default()
        };
        line.finalize();
        assert_eq!(line.win_rate, 0.0);
    }

    #[test]
    fn test_finalize_reaches_every_line() {
        let records = vec![
            record(1, "Alice", "Bob", "Alice", "NA"),
            record(2, "Alice", "Bob", "Alice", "EU"),
            record(3, "Carol", "Alice", "Carol", "EU"),
        ];
        let mut tables = accumulate(&records);
        finalize(&mut tables);

        for line in all_lines(&tables) {
            assert_eq!(line.win_rate, calculate_win_rate(line.wins, line.total));
            assert!((0.0..=1.0).contains(&line.win_rate));
        }

        let alice = tables.player("Alice").unwrap();
        assert_eq!(alice.summary.win_rate, 0.667);
        assert_eq!(alice.by_region["EU"].win_rate, 0.5);
        assert_eq!(tables.region("EU").unwrap().players["Bob"].win_rate, 0.0);
        // Side A always plays Human and side A won every match
        assert_eq!(tables.faction("Human").unwrap().summary.win_rate, 1.0);
        assert_eq!(tables.faction("Orc").unwrap().summary.win_rate, 0.0);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let records = vec![
            record(1, "Alice", "Bob", "Alice", "NA"),
            record(2, "Bob", "Carol", "Carol", "NA"),
            record(3, "Carol", "Alice", "Alice", "EU"),
        ];
        let mut tables = accumulate(&records);
        finalize(&mut tables);
        let once = tables.clone();
        finalize(&mut tables);

        assert_eq!(once, tables);
    }
}
