pub mod dispatch;
pub mod documents;
pub mod kill_feed;
pub mod maps;
pub mod raid;
pub mod raid_log;
pub mod settings;
pub mod stats;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use dispatch::notifier::{DispatcherConfig, RaidDispatcher};
use dispatch::webhook::WebhookSink;
use dispatch::{LoggingSink, NotificationSink};
use raid::RaidTracker;
use settings::TrackerSettings;
use stats::StatsStore;

/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}

fn build_sink(settings: &TrackerSettings) -> Result<Arc<dyn NotificationSink>, String> {
    if !settings.webhook_is_valid() {
        tracing::warn!(
            "No valid https webhook URL configured, messages will only be logged"
        );
        return Ok(Arc::new(LoggingSink::default()));
    }

    let sink = WebhookSink::new(
        settings.webhook_url.trim(),
        settings.bot_username.clone(),
        settings.bot_avatar_url.clone(),
    )?;
    Ok(Arc::new(sink))
}

pub async fn run(settings: TrackerSettings) -> Result<(), String> {
    let data_directory = PathBuf::from(&settings.data_directory);
    let log_path = PathBuf::from(&settings.log_file_path);
    let stats_store = StatsStore::in_directory(&data_directory);

    let sink = build_sink(&settings)?;
    let (signal_sender, signal_receiver) = mpsc::unbounded_channel();
    let dispatcher = RaidDispatcher::new(
        sink,
        DispatcherConfig::from_settings(&settings),
        stats_store.clone(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run(signal_receiver));

    let initial_offset = match raid_log::initial_log_offset(&log_path) {
        Ok(offset) => offset,
        Err(error) => {
            tracing::warn!("{error}; waiting for it to be created");
            0
        }
    };

    let (line_sender, mut line_receiver) = mpsc::unbounded_channel::<String>();
    let watcher_task = tokio::spawn(raid_log::watch_raid_log(
        log_path,
        initial_offset,
        line_sender,
    ));

    let mut tracker =
        RaidTracker::new(stats_store).with_profiles_directory(settings.profiles_path());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    'tracking: loop {
        tokio::select! {
            line = line_receiver.recv() => {
                let Some(line) = line else {
                    tracing::warn!("Raid log watcher stopped");
                    break;
                };

                for signal in tracker.process_line(&line, chrono::Utc::now()) {
                    if signal_sender.send(signal).is_err() {
                        tracing::error!("Raid dispatcher stopped unexpectedly");
                        break 'tracking;
                    }
                }
            }
            result = &mut shutdown => {
                if let Err(error) = result {
                    tracing::warn!("Failed to listen for shutdown signal: {error}");
                }
                tracing::info!("Shutting down raid tracker");
                break;
            }
        }
    }

    watcher_task.abort();
    let watcher_result = watcher_task.await;
    drop(signal_sender);

    if let Err(error) = dispatcher_task.await {
        tracing::warn!("Raid dispatcher task failed: {error}");
    }

    match watcher_result {
        Ok(Err(error)) => Err(format!("Raid log watcher failed: {error}")),
        _ => Ok(()),
    }
}
