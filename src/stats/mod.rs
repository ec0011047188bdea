pub mod leaderboard;
pub mod profiles;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::documents::{load_json_document_or_default, persist_json_document};

pub const STATS_DOCUMENT_FILE: &str = "player_stats.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerAggregate {
    pub deaths: u64,
    pub pmc_kills: u64,
    pub scav_kills: u64,
    pub raids_survived: u64,
    pub raids_played: u64,
    pub current_survival_streak: u64,
    /// Synced from server profiles; never derived from `current_survival_streak`.
    pub longest_survival_streak: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub kills_by_boss: BTreeMap<String, u64>,
}

impl PlayerAggregate {
    pub fn boss_kills(&self) -> u64 {
        self.kills_by_boss.values().sum()
    }

    pub fn total_kills(&self) -> u64 {
        self.pmc_kills + self.scav_kills + self.boss_kills()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalAggregate {
    pub boss_spawns: BTreeMap<String, u64>,
    pub total_raids: u64,
    pub map_plays: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsDocument {
    pub global: GlobalAggregate,
    pub players: BTreeMap<String, PlayerAggregate>,
}

impl StatsDocument {
    /// Returns the player's record, creating a zeroed one on first reference.
    pub fn player_mut(&mut self, player: &str) -> &mut PlayerAggregate {
        self.players.entry(player.to_string()).or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillKind<'a> {
    Pmc,
    Scav,
    Boss(&'a str),
}

/// Durable player and global aggregates backed by one JSON document.
///
/// Every mutation is a full load, apply, write cycle with no locking. Two writers that load
/// before either writes will lose one update; the tracker avoids this by mutating from a single
/// task, but the store itself does not prevent it.
#[derive(Debug, Clone)]
pub struct StatsStore {
    document_path: PathBuf,
}

impl StatsStore {
    pub fn new(document_path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: document_path.into(),
        }
    }

    pub fn in_directory(data_directory: &Path) -> Self {
        Self::new(data_directory.join(STATS_DOCUMENT_FILE))
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn load(&self) -> StatsDocument {
        load_json_document_or_default(&self.document_path)
    }

    pub fn save(&self, document: &StatsDocument) {
        persist_json_document(&self.document_path, document);
    }

    pub fn update<R>(&self, apply: impl FnOnce(&mut StatsDocument) -> R) -> R {
        let mut document = self.load();
        let result = apply(&mut document);
        self.save(&document);
        result
    }

    pub fn record_raid_started(&self, map: &str) {
        self.update(|document| {
            document.global.total_raids += 1;
            *document.global.map_plays.entry(map.to_string()).or_insert(0) += 1;
        });
    }

    pub fn record_boss_spawn(&self, boss: &str) {
        self.update(|document| {
            *document.global.boss_spawns.entry(boss.to_string()).or_insert(0) += 1;
        });
    }

    /// Returns the player's running kill count against that boss for boss kills.
    pub fn record_kill(&self, player: &str, kind: KillKind<'_>) -> Option<u64> {
        self.update(|document| {
            let aggregate = document.player_mut(player);
            match kind {
                KillKind::Pmc => {
                    aggregate.pmc_kills += 1;
                    None
                }
                KillKind::Scav => {
                    aggregate.scav_kills += 1;
                    None
                }
                KillKind::Boss(boss) => {
                    let count = aggregate.kills_by_boss.entry(boss.to_string()).or_insert(0);
                    *count += 1;
                    Some(*count)
                }
            }
        })
    }

    pub fn record_death(&self, player: &str) {
        self.update(|document| {
            let aggregate = document.player_mut(player);
            aggregate.deaths += 1;
            aggregate.current_survival_streak = 0;
        });
    }

    pub fn record_survivals<'a>(&self, players: impl IntoIterator<Item = &'a String>) {
        self.update(|document| {
            for player in players {
                document.player_mut(player).current_survival_streak += 1;
            }
        });
    }
}
