/// Display names for the location identifiers the server logs.
pub fn display_map_name(location: &str) -> String {
    let trimmed = location.trim();
    let display = match trimmed.to_ascii_lowercase().as_str() {
        "bigmap" | "customs" => "Customs",
        "factory4_day" | "factory4_night" | "factory" => "Factory",
        "interchange" => "Interchange",
        "laboratory" | "lab" | "the lab" => "The Lab",
        "lighthouse" => "Lighthouse",
        "rezervbase" | "reserve" => "Reserve",
        "sandbox" | "sandbox_high" | "ground zero" => "Ground Zero",
        "shoreline" => "Shoreline",
        "tarkovstreets" | "streets of tarkov" | "streets" => "Streets of Tarkov",
        "woods" => "Woods",
        _ => return trimmed.to_string(),
    };

    display.to_string()
}

pub fn map_image_url(display_name: &str) -> Option<&'static str> {
    let url = match display_name {
        "Customs" => "https://cdn.mapgenie.io/images/games/tarkov/maps/customs.jpg",
        "Factory" => "https://cdn.mapgenie.io/images/games/tarkov/maps/factory.jpg",
        "Interchange" => "https://cdn.mapgenie.io/images/games/tarkov/maps/interchange.jpg",
        "The Lab" => "https://cdn.mapgenie.io/images/games/tarkov/maps/lab.jpg",
        "Lighthouse" => "https://cdn.mapgenie.io/images/games/tarkov/maps/lighthouse.jpg",
        "Reserve" => "https://cdn.mapgenie.io/images/games/tarkov/maps/reserve.jpg",
        "Ground Zero" => "https://cdn.mapgenie.io/images/games/tarkov/maps/ground-zero.jpg",
        "Shoreline" => "https://cdn.mapgenie.io/images/games/tarkov/maps/shoreline.jpg",
        "Streets of Tarkov" => "https://cdn.mapgenie.io/images/games/tarkov/maps/streets.jpg",
        "Woods" => "https://cdn.mapgenie.io/images/games/tarkov/maps/woods.jpg",
        _ => return None,
    };

    Some(url)
}

pub fn time_of_day_label(time_variant: Option<&str>) -> String {
    match time_variant.map(str::trim) {
        None | Some("") => "N/A".to_string(),
        Some(value) if value.eq_ignore_ascii_case("CURR") => "Current".to_string(),
        Some(value) if value.eq_ignore_ascii_case("PAST") => "Past (+12h)".to_string(),
        Some(value) => value.to_string(),
    }
}
