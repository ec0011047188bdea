use regex::Regex;
use serde::Deserialize;

use crate::maps::{display_map_name, time_of_day_label};

use super::entity::strip_parenthetical_tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidStartInfo {
    pub map: String,
    pub time_of_day: String,
    pub players: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSource {
    Explicit,
    CoopHandler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaidLogEvent {
    RaidStart(RaidStartInfo),
    PlayerJoined { name: String, source: JoinSource },
    BossSpawned { raw_name: String },
    /// Raw tokens, resolved later through the entity classifier.
    EntityDeath { victim: String, killer: String },
    RaidEnd,
}

impl RaidLogEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RaidLogEvent::RaidStart(_) => "RAID_START",
            RaidLogEvent::PlayerJoined { .. } => "PLAYER_JOINED",
            RaidLogEvent::BossSpawned { .. } => "BOSS_SPAWNED",
            RaidLogEvent::EntityDeath { .. } => "ENTITY_DEATH",
            RaidLogEvent::RaidEnd => "RAID_END",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RaidStartPayload {
    location: String,
    #[serde(default)]
    time_variant: Option<String>,
    #[serde(default)]
    players: Vec<String>,
}

/// `None` means the line is not this shape; `Some(Err)` means it is, but the payload is broken.
type ShapeParser = fn(&str) -> Option<Result<RaidLogEvent, String>>;

lazy_static::lazy_static! {
    static ref RAID_START_PATTERN: Regex =
        Regex::new(r"(?i)\[Info\s*:[^\]]+\]\s*Starting on location\s*(.*)$").expect("valid raid start pattern");
    static ref PLAYER_JOINED_PATTERN: Regex =
        Regex::new(r"New player:\s*(.*)$").expect("valid player joined pattern");
    static ref COOP_CLIENT_PATTERN: Regex =
        Regex::new(r"AddClientToBotEnemies:\s*(.*)$").expect("valid coop handler pattern");
    static ref BOSS_SPAWNED_PATTERN: Regex =
        Regex::new(r"(?i)Boss spawned:\s*(.*)$").expect("valid boss spawned pattern");
    static ref ENTITY_DEATH_PATTERN: Regex =
        Regex::new(r"Death:\s*(.+?)\s+was killed by\s+(.+)$").expect("valid death pattern");
    static ref RAID_END_PATTERN: Regex =
        Regex::new(r"Destroyed FikaServer|Stopping server for raid").expect("valid raid end pattern");
}

const LINE_SHAPES: &[(&str, ShapeParser)] = &[
    ("RAID_START", parse_raid_start),
    ("PLAYER_JOINED_EXPLICIT", parse_player_joined_explicit),
    ("PLAYER_JOINED_COOP", parse_player_joined_coop),
    ("BOSS_SPAWNED", parse_boss_spawned),
    ("ENTITY_DEATH", parse_entity_death),
    ("RAID_END", parse_raid_end),
];

/// Matches a log line against the known shapes in priority order.
///
/// The first shape that recognizes the line decides the outcome, even when its payload turns
/// out to be malformed; later shapes are never consulted for that line.
pub fn classify_line(line: &str) -> Option<RaidLogEvent> {
    let trimmed_line = line.trim();
    if trimmed_line.is_empty() {
        return None;
    }

    for (shape_name, parser) in LINE_SHAPES {
        match parser(trimmed_line) {
            None => continue,
            Some(Ok(event)) => return Some(event),
            Some(Err(error)) => {
                tracing::warn!(
                    shape = shape_name,
                    parse_error = %error,
                    line = trimmed_line,
                    "Dropping malformed log event"
                );
                return None;
            }
        }
    }

    tracing::trace!(line = trimmed_line, "Log line matched no event shape");
    None
}

fn parse_raid_start(line: &str) -> Option<Result<RaidLogEvent, String>> {
    let captures = RAID_START_PATTERN.captures(line)?;
    let payload = captures.get(1).map(|value| value.as_str().trim()).unwrap_or_default();
    Some(parse_raid_start_payload(payload).map(RaidLogEvent::RaidStart))
}

fn parse_raid_start_payload(payload: &str) -> Result<RaidStartInfo, String> {
    if !payload.starts_with('{') {
        if payload.is_empty() {
            return Err("raid start line has no location".to_string());
        }

        return Ok(RaidStartInfo {
            map: display_map_name(payload),
            time_of_day: time_of_day_label(None),
            players: Vec::new(),
        });
    }

    let parsed = serde_json::from_str::<RaidStartPayload>(payload)
        .map_err(|error| format!("invalid raid start payload: {error}"))?;

    if parsed.location.trim().is_empty() {
        return Err("raid start payload has an empty location".to_string());
    }

    let mut players: Vec<String> = Vec::new();
    for raw_player in &parsed.players {
        let name = strip_parenthetical_tag(raw_player);
        if !name.is_empty() && !players.iter().any(|existing| existing == name) {
            players.push(name.to_string());
        }
    }

    Ok(RaidStartInfo {
        map: display_map_name(&parsed.location),
        time_of_day: time_of_day_label(parsed.time_variant.as_deref()),
        players,
    })
}

fn parse_player_joined_explicit(line: &str) -> Option<Result<RaidLogEvent, String>> {
    parse_player_joined(&PLAYER_JOINED_PATTERN, line, JoinSource::Explicit)
}

fn parse_player_joined_coop(line: &str) -> Option<Result<RaidLogEvent, String>> {
    parse_player_joined(&COOP_CLIENT_PATTERN, line, JoinSource::CoopHandler)
}

fn parse_player_joined(
    pattern: &Regex,
    line: &str,
    source: JoinSource,
) -> Option<Result<RaidLogEvent, String>> {
    let captures = pattern.captures(line)?;
    let raw_name = captures.get(1).map(|value| value.as_str()).unwrap_or_default();
    let name = strip_parenthetical_tag(raw_name);
    if name.is_empty() {
        return Some(Err("player join line has no player name".to_string()));
    }

    Some(Ok(RaidLogEvent::PlayerJoined {
        name: name.to_string(),
        source,
    }))
}

fn parse_boss_spawned(line: &str) -> Option<Result<RaidLogEvent, String>> {
    let captures = BOSS_SPAWNED_PATTERN.captures(line)?;
    let raw_name = captures
        .get(1)
        .map(|value| value.as_str().trim())
        .unwrap_or_default();
    if raw_name.is_empty() {
        return Some(Err("boss spawn line has no boss name".to_string()));
    }

    Some(Ok(RaidLogEvent::BossSpawned {
        raw_name: raw_name.to_string(),
    }))
}

fn parse_entity_death(line: &str) -> Option<Result<RaidLogEvent, String>> {
    let captures = ENTITY_DEATH_PATTERN.captures(line)?;
    let victim = captures.get(1)?.as_str().trim();
    let killer = captures.get(2)?.as_str().trim();

    Some(Ok(RaidLogEvent::EntityDeath {
        victim: victim.to_string(),
        killer: killer.to_string(),
    }))
}

fn parse_raid_end(line: &str) -> Option<Result<RaidLogEvent, String>> {
    RAID_END_PATTERN
        .is_match(line)
        .then_some(Ok(RaidLogEvent::RaidEnd))
}
