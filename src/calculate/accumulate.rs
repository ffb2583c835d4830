//! Fold match records into the player, race and region tables.

use tracing::debug;

use crate::models::{
    FactionEntity, MatchHistoryEntry, MatchRecord, Participation, PlayerEntity, RegionEntity,
    StatTables,
};

/// Build fresh tables from a sequence of records.
///
/// Every record contributes two participations, one per side, so each
/// match is counted once as a win and once as a loss. Counter values do
/// not depend on input order; only player history follows it. Win rates
/// are left at zero until `finalize` runs.
pub fn accumulate<'a, I>(records: I) -> StatTables
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut tables = StatTables::default();
    let mut matches = 0usize;

    for record in records {
        for side in record.participations() {
            tables.record_participation(record, &side);
        }
        matches += 1;
    }

    debug!(
        "Accumulated {} matches into {} players, {} races, {} regions",
        matches,
        tables.players.len(),
        tables.factions.len(),
        tables.regions.len()
    );
    tables
}

impl StatTables {
    /// Apply one side of a match to all three tables.
    fn record_participation(&mut self, record: &MatchRecord, side: &Participation<'_>) {
        let region = record.region.as_str();

        let player = self
            .players
            .entry(side.player.to_string())
            .or_insert_with(|| PlayerEntity::new(side.player));
        player.summary.record(side.result);
        player
            .by_race
            .entry(side.race.to_string())
            .or_default()
            .record(side.result);
        player
            .by_region
            .entry(region.to_string())
            .or_default()
            .record(side.result);
        player.matches.push(MatchHistoryEntry {
            id: record.id,
            opponent: side.opponent.to_string(),
            player_race: side.race.to_string(),
            opponent_race: side.opponent_race.to_string(),
            region: region.to_string(),
            result: side.result,
            timestamp: record.timestamp.clone(),
            season: record.season.clone(),
        });

        let faction = self
            .factions
            .entry(side.race.to_string())
            .or_insert_with(|| FactionEntity::new(side.race));
        faction.summary.record(side.result);
        faction
            .by_region
            .entry(region.to_string())
            .or_default()
            .record(side.result);

        let region_entity = self
            .regions
            .entry(region.to_string())
            .or_insert_with(|| RegionEntity::new(region));
        region_entity.summary.record(side.result);
        region_entity
            .players
            .entry(side.player.to_string())
            .or_default()
            .record(side.result);
        region_entity
            .races
            .entry(side.race.to_string())
            .or_default()
            .record(side.result);
    }
}
