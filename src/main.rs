use raidwatch_lib::settings::{resolve_config_path, TrackerSettings};

#[tokio::main]
async fn main() {
    let config_path = resolve_config_path(std::env::args().nth(1), |key| std::env::var(key).ok());

    let mut settings = match TrackerSettings::load(&config_path) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("raidwatch: {error}");
            std::process::exit(1);
        }
    };
    settings.apply_env_overrides(|key| std::env::var(key).ok());

    raidwatch_lib::init_tracing(&settings.log_level);
    tracing::info!(config_path = %config_path.display(), "Starting raidwatch");

    if let Err(error) = raidwatch_lib::run(settings).await {
        tracing::error!("{error}");
        std::process::exit(1);
    }
}
