use serde_json::Value;
use std::path::Path;

use super::StatsStore;

const NICKNAME_POINTER: &str = "/characters/pmc/Info/Nickname";
const COUNTERS_POINTER: &str = "/characters/pmc/Stats/Eft/OverallCounters/Items";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCounters {
    pub nickname: String,
    pub raids_played: u64,
    pub raids_survived: u64,
    pub longest_survival_streak: u64,
}

/// Pulls the raid counters the server keeps in a player profile.
pub fn parse_profile_counters(profile: &Value) -> Option<ProfileCounters> {
    let nickname = profile
        .pointer(NICKNAME_POINTER)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())?
        .to_string();

    let mut counters = ProfileCounters {
        nickname,
        ..ProfileCounters::default()
    };

    let Some(items) = profile.pointer(COUNTERS_POINTER).and_then(Value::as_array) else {
        return Some(counters);
    };

    for item in items {
        let Some(key) = item.get("Key").and_then(Value::as_array) else {
            continue;
        };
        let key_parts = key.iter().filter_map(Value::as_str).collect::<Vec<&str>>();
        let value = item.get("Value").and_then(Value::as_u64).unwrap_or(0);

        match key_parts.as_slice() {
            ["Sessions", "Pmc"] => counters.raids_played = value,
            ["Survived", "Pmc"] => counters.raids_survived = value,
            ["LongestWinStreak", "Pmc"] => counters.longest_survival_streak = value,
            _ => {}
        }
    }

    Some(counters)
}

pub fn read_profiles_directory(profiles_directory: &Path) -> Result<Vec<ProfileCounters>, String> {
    let entries = std::fs::read_dir(profiles_directory).map_err(|error| {
        format!(
            "Failed to read profiles directory '{}': {error}",
            profiles_directory.display()
        )
    })?;

    let mut profiles = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|error| error.to_string())?;
        let path = entry.path();
        if path.extension().map_or(true, |extension| extension != "json") {
            continue;
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(|error| error.to_string())
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|error| error.to_string()));

        match parsed {
            Ok(profile) => {
                if let Some(counters) = parse_profile_counters(&profile) {
                    profiles.push(counters);
                }
            }
            Err(error) => {
                tracing::warn!(
                    profile_path = %path.display(),
                    profile_error = %error,
                    "Skipping unreadable player profile"
                );
            }
        }
    }

    Ok(profiles)
}

/// Copies profile counters into the stats document in one read-modify-write.
///
/// `longest_survival_streak` comes only from here, so it can lag behind the tracker's own
/// running streak until the next sync.
pub fn sync_profiles(store: &StatsStore, profiles_directory: &Path) -> usize {
    let profiles = match read_profiles_directory(profiles_directory) {
        Ok(profiles) => profiles,
        Err(error) => {
            tracing::warn!("Profile sync skipped: {error}");
            return 0;
        }
    };

    if profiles.is_empty() {
        return 0;
    }

    store.update(|document| {
        for counters in &profiles {
            let aggregate = document.player_mut(&counters.nickname);
            aggregate.raids_played = counters.raids_played;
            aggregate.raids_survived = counters.raids_survived;
            aggregate.longest_survival_streak = counters.longest_survival_streak;
        }
    });

    tracing::debug!(profile_count = profiles.len(), "Synced player profiles");
    profiles.len()
}
