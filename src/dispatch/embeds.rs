use serde::Serialize;

use crate::kill_feed::KillFeedEntry;
use crate::maps::map_image_url;
use crate::raid::session::RaidSnapshot;
use crate::raid::summary::RaidSummary;
use crate::stats::leaderboard::{Leaderboard, LeaderboardEntry};

pub const COLOR_STARTING: u32 = 11_403_055;
pub const COLOR_IN_PROGRESS: u32 = 16_711_680;
pub const COLOR_ENDED: u32 = 3_066_993;
pub const COLOR_IDLE: u32 = 9_807_270;
pub const COLOR_LEADERBOARD: u32 = 3_447_003;
pub const COLOR_BOSS_KILL: u32 = 15_844_367;

const IDLE_IMAGE_URL: &str = "https://media.tenor.com/W5pHtj5JE2MAAAAM/escape-from-tarkov-tarkov.gif";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

impl Embed {
    fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
            image: None,
            thumbnail: None,
            footer: None,
        }
    }

    fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    fn image(mut self, url: Option<&str>) -> Self {
        self.image = url.map(|url| EmbedMedia {
            url: url.to_string(),
        });
        self
    }

    fn thumbnail(mut self, url: Option<&str>) -> Self {
        self.thumbnail = url.map(|url| EmbedMedia {
            url: url.to_string(),
        });
        self
    }

    fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }
}

pub fn raid_starting(snapshot: &RaidSnapshot, phrase: Option<&str>) -> Embed {
    let mut description = "A new raid is being created and is ready to join!".to_string();
    if let Some(phrase) = phrase {
        description.push(' ');
        description.push_str(phrase);
    }

    Embed::new(
        ":hourglass_flowing_sand: Raid Starting Soon! :hourglass_flowing_sand:",
        COLOR_STARTING,
    )
    .description(description)
    .image(map_image_url(&snapshot.map))
    .field("Map", format!("**{}**", snapshot.map), true)
    .field("Time of Day", format!("**{}**", snapshot.time_of_day), true)
}

pub fn raid_in_progress(snapshot: &RaidSnapshot) -> Embed {
    let mut embed = Embed::new(":x: Raid in Progress! :x:", COLOR_IN_PROGRESS)
        .description("The raid is active. Please wait until the next raid is ready for players.")
        .image(map_image_url(&snapshot.map))
        .field("Map", format!("**{}**", snapshot.map), true)
        .field("Time of Day", format!("**{}**", snapshot.time_of_day), true)
        .field(
            "Players in Raid",
            format!(
                "({})\n{}",
                snapshot.participants.len(),
                bullet_list(&snapshot.participants, "No players detected yet.")
            ),
            false,
        );

    if !snapshot.active_bosses.is_empty() {
        embed = embed.field(
            ":skull: Bosses Spotted",
            bullet_list(&snapshot.active_bosses, ""),
            false,
        );
    }

    embed
}

pub fn raid_idle() -> Embed {
    Embed::new(":zzz: No Raid in Progress :zzz:", COLOR_IDLE)
        .description("The server is quiet. Waiting for a new raid to start.")
        .image(Some(IDLE_IMAGE_URL))
}

pub fn raid_ended(summary: &RaidSummary) -> Embed {
    let breakdown = summary
        .players
        .iter()
        .map(|player| {
            let status = if player.survived { ":white_check_mark:" } else { ":skull:" };
            format!(
                "{status} **{}**: {} PMC / {} Scav / {} Boss",
                player.player,
                player.kills.pmc_kills,
                player.kills.scav_kills,
                player.kills.boss_kills
            )
        })
        .collect::<Vec<String>>();

    let mut embed = Embed::new(":checkered_flag: Raid Ended :checkered_flag:", COLOR_ENDED)
        .description("The server is quiet. Waiting for a new raid to start.")
        .thumbnail(map_image_url(&summary.map))
        .field("Map", format!("**{}**", summary.map), true)
        .field("Duration", format!("**{}**", summary.duration_label()), true)
        .field(
            "Survived",
            format!("{}/{}", summary.survivors.len(), summary.participants.len()),
            true,
        )
        .field(
            "Kills",
            format!(
                "PMC: {} | Scav: {} | Boss: {}",
                summary.kills.pmcs, summary.kills.scavs, summary.kills.bosses
            ),
            false,
        );

    if !summary.bosses.is_empty() {
        embed = embed.field("Bosses Encountered", summary.bosses.join(", "), false);
    }

    if !breakdown.is_empty() {
        embed = embed.field("Players", breakdown.join("\n"), false);
    }

    embed.footer(format!(
        "Ended {}",
        summary.ended_at.format("%Y-%m-%d %H:%M UTC")
    ))
}

pub fn leaderboard(board: &Leaderboard) -> Embed {
    let mut embed = Embed::new(":trophy: Server Leaderboard :trophy:", COLOR_LEADERBOARD)
        .description(format!("Total raids tracked: **{}**", board.total_raids))
        .field("PMC Kills", ranking(&board.pmc_kills, 0), true)
        .field("Boss Kills", ranking(&board.boss_kills, 0), true)
        .field("Scav Kills", ranking(&board.scav_kills, 0), true)
        .field("K/D Ratio", ranking(&board.kill_death_ratio, 2), true)
        .field("Survival Rate", percent_ranking(&board.survival_rate), true)
        .field("Survival Streak", ranking(&board.survival_streak, 0), true)
        .field("Longest Streak", ranking(&board.longest_survival_streak, 0), true)
        .field("Deaths", ranking(&board.deaths, 0), true);

    if let Some((boss, count)) = &board.most_encountered_boss {
        embed = embed.field("Most Encountered Boss", format!("{boss} ({count})"), true);
    }
    if let Some((map, count)) = &board.most_played_map {
        embed = embed.field("Most Played Map", format!("{map} ({count})"), true);
    }

    embed
}

pub fn kill_feed_entry(entry: &KillFeedEntry, position: usize) -> Embed {
    let title = if position == 1 {
        ":crossed_swords: Boss Down! (Latest)".to_string()
    } else {
        format!(":crossed_swords: Boss Down! (#{position})")
    };

    Embed::new(title, COLOR_BOSS_KILL)
        .description(format!(
            "**{}** killed **{}** on {}.",
            entry.killer_name, entry.boss_name, entry.map_name
        ))
        .field("Times Killed", entry.kill_count.to_string(), true)
}

fn bullet_list(items: &[String], empty_text: &str) -> String {
    if items.is_empty() {
        return empty_text.to_string();
    }

    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<String>>()
        .join("\n")
}

fn ranking(entries: &[LeaderboardEntry], precision: usize) -> String {
    format_ranking(entries, |value| format!("{value:.precision$}"))
}

fn percent_ranking(entries: &[LeaderboardEntry]) -> String {
    format_ranking(entries, |value| format!("{value:.1}%"))
}

fn format_ranking(entries: &[LeaderboardEntry], format_value: impl Fn(f64) -> String) -> String {
    if entries.is_empty() {
        return "No data yet.".to_string();
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            format!("{}. {} ({})", index + 1, entry.player, format_value(entry.value))
        })
        .collect::<Vec<String>>()
        .join("\n")
}
