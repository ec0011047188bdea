pub mod session;
pub mod summary;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::raid_log::entity::{
    classify_entity, resolve_boss_name, strip_parenthetical_tag, ClassifiedEntity, EntityCategory,
};
use crate::raid_log::events::{classify_line, RaidLogEvent, RaidStartInfo};
use crate::raid_log::LogHistory;
use crate::stats::profiles::sync_profiles;
use crate::stats::{KillKind, StatsStore};

use self::session::{RaidSession, RaidSnapshot, RaidState};
use self::summary::RaidSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BossKill {
    pub killer: String,
    pub boss: String,
    /// The killer's all-time kills of this boss, including this one.
    pub kill_count: u64,
    pub map: String,
}

/// State changes the dispatcher turns into outbound messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaidSignal {
    RaidStarting(RaidSnapshot),
    /// Debounced by the dispatcher.
    RosterChanged(RaidSnapshot),
    BossSpawned { boss: String, snapshot: RaidSnapshot },
    BossKilled(BossKill),
    RaidEnded(RaidSummary),
}

/// Drives the raid lifecycle `Waiting -> Starting -> InProgress -> Waiting` from log events.
///
/// Lines must be fed in log order from a single task. Durable counters are written to the
/// stats store at the moment each transition happens.
pub struct RaidTracker {
    session: RaidSession,
    store: StatsStore,
    profiles_directory: Option<PathBuf>,
    last_summary: Option<RaidSummary>,
    history: LogHistory,
}

impl RaidTracker {
    pub fn new(store: StatsStore) -> Self {
        Self {
            session: RaidSession::default(),
            store,
            profiles_directory: None,
            last_summary: None,
            history: LogHistory::default(),
        }
    }

    pub fn with_profiles_directory(mut self, profiles_directory: Option<PathBuf>) -> Self {
        self.profiles_directory = profiles_directory;
        self
    }

    pub fn session(&self) -> &RaidSession {
        &self.session
    }

    pub fn state(&self) -> RaidState {
        self.session.state
    }

    pub fn last_summary(&self) -> Option<&RaidSummary> {
        self.last_summary.as_ref()
    }

    pub fn history(&self) -> &LogHistory {
        &self.history
    }

    pub fn store(&self) -> &StatsStore {
        &self.store
    }

    pub fn process_line(&mut self, line: &str, now: DateTime<Utc>) -> Vec<RaidSignal> {
        self.history.push(line);
        match classify_line(line) {
            Some(event) => self.handle_event(event, now),
            None => Vec::new(),
        }
    }

    pub fn handle_event(&mut self, event: RaidLogEvent, now: DateTime<Utc>) -> Vec<RaidSignal> {
        let event_kind = event.kind();
        let previous_state = self.session.state;

        let signals = match event {
            RaidLogEvent::RaidStart(info) => self.handle_raid_start(&info, now),
            RaidLogEvent::PlayerJoined { name, .. } => self.handle_player_joined(&name),
            RaidLogEvent::BossSpawned { raw_name } => self.handle_boss_spawned(&raw_name),
            RaidLogEvent::EntityDeath { victim, killer } => self.handle_death(&victim, &killer),
            RaidLogEvent::RaidEnd => self.handle_raid_end(now),
        };

        if previous_state != self.session.state {
            tracing::info!(
                event_kind,
                from = previous_state.label(),
                to = self.session.state.label(),
                "Raid state changed"
            );
        } else if signals.is_empty() {
            tracing::debug!(event_kind, state = previous_state.label(), "Event left raid unchanged");
        }

        signals
    }

    fn handle_raid_start(&mut self, info: &RaidStartInfo, now: DateTime<Utc>) -> Vec<RaidSignal> {
        if !self.session.is_waiting() {
            return Vec::new();
        }

        self.session = RaidSession::starting(info, now);
        self.store.record_raid_started(&info.map);

        tracing::info!(map = %info.map, time_of_day = %info.time_of_day, "Raid starting");
        vec![RaidSignal::RaidStarting(self.session.snapshot())]
    }

    fn handle_player_joined(&mut self, player: &str) -> Vec<RaidSignal> {
        if self.session.is_waiting() {
            return Vec::new();
        }

        let added = self.session.add_participant(player);
        let first_join = self.session.state == RaidState::Starting;
        if first_join {
            self.session.state = RaidState::InProgress;
        }

        if !added && !first_join {
            return Vec::new();
        }

        tracing::info!(player, player_count = self.session.participants.len(), "Player joined raid");
        vec![RaidSignal::RosterChanged(self.session.snapshot())]
    }

    fn handle_boss_spawned(&mut self, raw_name: &str) -> Vec<RaidSignal> {
        if self.session.is_waiting() {
            return Vec::new();
        }

        let boss = resolve_boss_name(raw_name)
            .map(str::to_string)
            .unwrap_or_else(|| raw_name.trim().to_string());
        if !self.session.add_boss(&boss) {
            return Vec::new();
        }

        self.store.record_boss_spawn(&boss);

        tracing::info!(boss = %boss, "Boss spawned");
        vec![RaidSignal::BossSpawned {
            boss,
            snapshot: self.session.snapshot(),
        }]
    }

    fn handle_death(&mut self, raw_victim: &str, raw_killer: &str) -> Vec<RaidSignal> {
        if self.session.is_waiting() {
            return Vec::new();
        }

        let victim = self.resolve_entity(raw_victim);
        let killer = self.resolve_entity(raw_killer);
        let mut signals = Vec::new();

        let victim_is_participant = self.session.is_participant(&victim.name);
        let victim_category = victim.category;

        let self_kill = victim.name == killer.name;
        if !self_kill && self.session.is_participant(&killer.name) {
            if let Some(signal) = self.credit_kill(&killer.name, &victim.name, victim_category) {
                signals.push(signal);
            }
        }

        if victim_is_participant && self.session.mark_dead(&victim.name) {
            self.store.record_death(&victim.name);
            tracing::info!(player = %victim.name, killer = %killer.name, "Player died");
        }

        signals
    }

    /// Roster names win over boss and script rules, so a player called "Knightwolf" stays a player.
    fn resolve_entity(&self, raw_token: &str) -> ClassifiedEntity {
        let bare_name = strip_parenthetical_tag(raw_token);
        if self.session.is_participant(bare_name) {
            return ClassifiedEntity {
                name: bare_name.to_string(),
                category: EntityCategory::Player,
            };
        }

        classify_entity(raw_token)
    }

    fn credit_kill(
        &mut self,
        killer: &str,
        victim: &str,
        victim_category: EntityCategory,
    ) -> Option<RaidSignal> {
        let counters = self.session.counters_mut(killer);
        match victim_category {
            EntityCategory::Player => {
                counters.pmc_kills += 1;
                self.store.record_kill(killer, KillKind::Pmc);
                None
            }
            EntityCategory::NonPlayerHostile => {
                counters.scav_kills += 1;
                self.store.record_kill(killer, KillKind::Scav);
                None
            }
            EntityCategory::Boss => {
                counters.boss_kills += 1;
                let kill_count = self
                    .store
                    .record_kill(killer, KillKind::Boss(victim))
                    .unwrap_or(1);

                tracing::info!(killer, boss = victim, kill_count, "Boss killed");
                Some(RaidSignal::BossKilled(BossKill {
                    killer: killer.to_string(),
                    boss: victim.to_string(),
                    kill_count,
                    map: self.session.snapshot().map,
                }))
            }
        }
    }

    fn handle_raid_end(&mut self, now: DateTime<Utc>) -> Vec<RaidSignal> {
        if self.session.is_waiting() {
            return Vec::new();
        }

        let summary = RaidSummary::from_session(&self.session, now);
        if !summary.survivors.is_empty() {
            self.store.record_survivals(&summary.survivors);
        }

        if let Some(profiles_directory) = self.profiles_directory.as_deref() {
            sync_profiles(&self.store, profiles_directory);
        }

        tracing::info!(
            map = %summary.map,
            duration = %summary.duration_label(),
            participants = summary.participants.len(),
            survivors = summary.survivors.len(),
            "Raid ended"
        );

        self.session = RaidSession::default();
        self.last_summary = Some(summary.clone());
        vec![RaidSignal::RaidEnded(summary)]
    }
}
