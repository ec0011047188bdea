use chrono::{DateTime, Utc};
use serde::Serialize;

use super::session::{RaidSession, SessionKillCounters};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KillTotals {
    pub pmcs: u64,
    pub scavs: u64,
    pub bosses: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRaidBreakdown {
    pub player: String,
    pub survived: bool,
    pub kills: SessionKillCounters,
}

/// End-of-raid report. Only the most recent one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidSummary {
    pub map: String,
    pub time_of_day: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub participants: Vec<String>,
    pub survivors: Vec<String>,
    pub bosses: Vec<String>,
    pub kills: KillTotals,
    pub players: Vec<PlayerRaidBreakdown>,
}

impl RaidSummary {
    pub fn from_session(session: &RaidSession, ended_at: DateTime<Utc>) -> Self {
        let duration_seconds = session
            .started_at
            .map(|started_at| (ended_at - started_at).num_seconds().max(0))
            .unwrap_or(0);

        let players = session
            .participants
            .iter()
            .map(|player| PlayerRaidBreakdown {
                player: player.clone(),
                survived: !session.dead_this_session.contains(player),
                kills: session
                    .session_counters
                    .get(player)
                    .copied()
                    .unwrap_or_default(),
            })
            .collect::<Vec<PlayerRaidBreakdown>>();

        let kills = players.iter().fold(KillTotals::default(), |totals, breakdown| {
            KillTotals {
                pmcs: totals.pmcs + breakdown.kills.pmc_kills,
                scavs: totals.scavs + breakdown.kills.scav_kills,
                bosses: totals.bosses + breakdown.kills.boss_kills,
            }
        });

        let snapshot = session.snapshot();
        Self {
            map: snapshot.map,
            time_of_day: snapshot.time_of_day,
            started_at: session.started_at,
            ended_at,
            duration_seconds,
            participants: snapshot.participants,
            survivors: session.survivors(),
            bosses: snapshot.active_bosses,
            kills,
            players,
        }
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

pub fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}
