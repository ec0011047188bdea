use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{PlayerAggregate, StatsDocument};

pub const LEADERBOARD_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub pmc_kills: Vec<LeaderboardEntry>,
    pub boss_kills: Vec<LeaderboardEntry>,
    pub scav_kills: Vec<LeaderboardEntry>,
    pub kill_death_ratio: Vec<LeaderboardEntry>,
    pub survival_rate: Vec<LeaderboardEntry>,
    pub survival_streak: Vec<LeaderboardEntry>,
    pub longest_survival_streak: Vec<LeaderboardEntry>,
    pub deaths: Vec<LeaderboardEntry>,
    pub most_encountered_boss: Option<(String, u64)>,
    pub most_played_map: Option<(String, u64)>,
    pub total_raids: u64,
}

/// Kills per death; a player who never died scores their kill count.
pub fn kill_death_ratio(aggregate: &PlayerAggregate) -> f64 {
    let kills = aggregate.total_kills() as f64;
    if aggregate.deaths == 0 {
        return kills;
    }

    kills / aggregate.deaths as f64
}

/// Percentage of played raids survived, 0 when nothing was played.
pub fn survival_rate(aggregate: &PlayerAggregate) -> f64 {
    if aggregate.raids_played == 0 {
        return 0.0;
    }

    aggregate.raids_survived as f64 / aggregate.raids_played as f64 * 100.0
}

pub fn build_leaderboard(document: &StatsDocument) -> Leaderboard {
    Leaderboard {
        pmc_kills: top_players(document, |player| player.pmc_kills as f64),
        boss_kills: top_players(document, |player| player.boss_kills() as f64),
        scav_kills: top_players(document, |player| player.scav_kills as f64),
        kill_death_ratio: top_players(document, kill_death_ratio),
        survival_rate: top_players(document, survival_rate),
        survival_streak: top_players(document, |player| player.current_survival_streak as f64),
        longest_survival_streak: top_players(document, |player| {
            player.longest_survival_streak as f64
        }),
        deaths: top_players(document, |player| player.deaths as f64),
        most_encountered_boss: highest_count(&document.global.boss_spawns),
        most_played_map: highest_count(&document.global.map_plays),
        total_raids: document.global.total_raids,
    }
}

/// Stable descending sort, so equal scores keep the document's player order.
fn top_players(
    document: &StatsDocument,
    metric: impl Fn(&PlayerAggregate) -> f64,
) -> Vec<LeaderboardEntry> {
    let mut entries = document
        .players
        .iter()
        .map(|(player, aggregate)| LeaderboardEntry {
            player: player.clone(),
            value: metric(aggregate),
        })
        .collect::<Vec<LeaderboardEntry>>();

    entries.sort_by(|left, right| {
        right
            .value
            .partial_cmp(&left.value)
            .unwrap_or(Ordering::Equal)
    });
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

fn highest_count(counts: &BTreeMap<String, u64>) -> Option<(String, u64)> {
    let mut best: Option<(&String, u64)> = None;
    for (name, count) in counts {
        if best.map(|(_, best_count)| *count > best_count).unwrap_or(true) {
            best = Some((name, *count));
        }
    }

    best.map(|(name, count)| (name.clone(), count))
}
