use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::raid_log::events::RaidStartInfo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RaidState {
    #[default]
    Waiting,
    Starting,
    InProgress,
}

impl RaidState {
    pub fn label(self) -> &'static str {
        match self {
            RaidState::Waiting => "Waiting for Raid",
            RaidState::Starting => "Raid Starting",
            RaidState::InProgress => "In Progress",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKillCounters {
    pub pmc_kills: u64,
    pub scav_kills: u64,
    pub boss_kills: u64,
}

/// The live raid. Every field returns to its default when the raid ends.
#[derive(Debug, Clone, Default)]
pub struct RaidSession {
    pub state: RaidState,
    pub map: Option<String>,
    pub time_of_day: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Join order, no duplicates.
    pub participants: Vec<String>,
    pub active_bosses: Vec<String>,
    /// Always a subset of `participants`.
    pub dead_this_session: BTreeSet<String>,
    pub session_counters: BTreeMap<String, SessionKillCounters>,
}

/// What the dispatcher needs to render a live raid message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidSnapshot {
    pub map: String,
    pub time_of_day: String,
    pub participants: Vec<String>,
    pub active_bosses: Vec<String>,
}

impl RaidSession {
    pub fn starting(info: &RaidStartInfo, now: DateTime<Utc>) -> Self {
        let mut session = Self {
            state: RaidState::Starting,
            map: Some(info.map.clone()),
            time_of_day: Some(info.time_of_day.clone()),
            started_at: Some(now),
            ..Self::default()
        };

        for player in &info.players {
            session.add_participant(player);
        }

        session
    }

    pub fn is_waiting(&self) -> bool {
        self.state == RaidState::Waiting
    }

    pub fn is_participant(&self, player: &str) -> bool {
        self.participants.iter().any(|participant| participant == player)
    }

    /// Returns `false` when the player was already in the raid.
    pub fn add_participant(&mut self, player: &str) -> bool {
        if self.is_participant(player) {
            return false;
        }

        self.participants.push(player.to_string());
        true
    }

    pub fn add_boss(&mut self, boss: &str) -> bool {
        if self.active_bosses.iter().any(|active| active == boss) {
            return false;
        }

        self.active_bosses.push(boss.to_string());
        true
    }

    /// Marks a participant dead once per raid; later calls and non-participants return `false`.
    pub fn mark_dead(&mut self, player: &str) -> bool {
        if !self.is_participant(player) {
            return false;
        }

        self.dead_this_session.insert(player.to_string())
    }

    pub fn counters_mut(&mut self, player: &str) -> &mut SessionKillCounters {
        self.session_counters.entry(player.to_string()).or_default()
    }

    pub fn survivors(&self) -> Vec<String> {
        self.participants
            .iter()
            .filter(|participant| !self.dead_this_session.contains(*participant))
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> RaidSnapshot {
        RaidSnapshot {
            map: self.map.clone().unwrap_or_else(|| "N/A".to_string()),
            time_of_day: self.time_of_day.clone().unwrap_or_else(|| "N/A".to_string()),
            participants: self.participants.clone(),
            active_bosses: self.active_bosses.clone(),
        }
    }
}
