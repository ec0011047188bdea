use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityCategory {
    Boss,
    /// A PMC. Bot PMCs are included until the caller matches the name against the raid roster.
    Player,
    NonPlayerHostile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEntity {
    pub name: String,
    pub category: EntityCategory,
}

struct BossIdentity {
    canonical: &'static str,
    localized: &'static str,
}

const KNOWN_BOSSES: &[BossIdentity] = &[
    BossIdentity { canonical: "Reshala", localized: "Решала" },
    BossIdentity { canonical: "Killa", localized: "Килла" },
    BossIdentity { canonical: "Glukhar", localized: "Глухарь" },
    BossIdentity { canonical: "Shturman", localized: "Штурман" },
    BossIdentity { canonical: "Sanitar", localized: "Санитар" },
    BossIdentity { canonical: "Tagilla", localized: "Тагилла" },
    BossIdentity { canonical: "Knight", localized: "Рыцарь" },
    BossIdentity { canonical: "Big Pipe", localized: "Биг Пайп" },
    BossIdentity { canonical: "Birdeye", localized: "Птичий Глаз" },
    BossIdentity { canonical: "Zryachiy", localized: "Зрячий" },
    BossIdentity { canonical: "Kaban", localized: "Кабан" },
    BossIdentity { canonical: "Kollontay", localized: "Коллонтай" },
    BossIdentity { canonical: "Partisan", localized: "Партизан" },
    BossIdentity { canonical: "Cultist Priest", localized: "Жрец" },
];

lazy_static::lazy_static! {
    /// `(canonical, localized, display)` with both spellings lowercased once.
    static ref LOWERCASE_BOSS_NAMES: Vec<(String, String, &'static str)> = KNOWN_BOSSES
        .iter()
        .map(|boss| (boss.canonical.to_lowercase(), boss.localized.to_lowercase(), boss.canonical))
        .collect();
}

/// Classifies a raw log token such as `"Alice (PMC)"` or `"Килла"`.
///
/// Precedence matters: boss names are checked before the tag and script rules because
/// localized boss names are written in Cyrillic and would otherwise read as scavs.
pub fn classify_entity(raw_token: &str) -> ClassifiedEntity {
    let (bare_name, tag) = split_parenthetical_tag(raw_token);

    if let Some(canonical) = resolve_boss_name(bare_name) {
        return ClassifiedEntity {
            name: canonical.to_string(),
            category: EntityCategory::Boss,
        };
    }

    let category = tag
        .and_then(category_from_tag)
        .unwrap_or_else(|| {
            if contains_cyrillic(bare_name) {
                EntityCategory::NonPlayerHostile
            } else {
                EntityCategory::Player
            }
        });

    ClassifiedEntity {
        name: bare_name.to_string(),
        category,
    }
}

/// Maps a canonical or localized boss name to its canonical spelling.
pub fn resolve_boss_name(name: &str) -> Option<&'static str> {
    let lowered = name.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    LOWERCASE_BOSS_NAMES
        .iter()
        .find(|(canonical, localized, _)| {
            lowered == *canonical
                || lowered == *localized
                || lowered.contains(canonical.as_str())
                || lowered.contains(localized.as_str())
        })
        .map(|(_, _, canonical)| *canonical)
}

/// Strips a trailing `(...)` annotation, returning the bare name and the tag text.
pub fn split_parenthetical_tag(raw_token: &str) -> (&str, Option<&str>) {
    let trimmed = raw_token.trim();
    let Some(without_close) = trimmed.strip_suffix(')') else {
        return (trimmed, None);
    };
    let Some((name, tag)) = without_close.rsplit_once('(') else {
        return (trimmed, None);
    };

    let name = name.trim();
    if name.is_empty() {
        return (trimmed, None);
    }

    (name, Some(tag.trim()))
}

pub fn strip_parenthetical_tag(raw_token: &str) -> &str {
    split_parenthetical_tag(raw_token).0
}

fn category_from_tag(tag: &str) -> Option<EntityCategory> {
    match tag.to_ascii_lowercase().as_str() {
        "pmc" | "usec" | "bear" | "player" => Some(EntityCategory::Player),
        "scav" | "savage" | "assault" | "marksman" | "raider" | "rogue" | "cultist" | "ai" => {
            Some(EntityCategory::NonPlayerHostile)
        }
        "boss" => Some(EntityCategory::Boss),
        _ => None,
    }
}

fn contains_cyrillic(name: &str) -> bool {
    name.chars()
        .any(|character| matches!(character, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}'))
}
