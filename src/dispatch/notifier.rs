use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::kill_feed::KillFeedManager;
use crate::raid::session::RaidSnapshot;
use crate::raid::RaidSignal;
use crate::settings::TrackerSettings;
use crate::stats::leaderboard::build_leaderboard;
use crate::stats::StatsStore;

use super::debounce::DebounceTimer;
use super::embeds;
use super::message_ids::MessageIdStore;
use super::{NotificationSink, OutboundMessage, SinkError};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub data_directory: PathBuf,
    pub mention_everyone_on_start: bool,
    pub raid_start_phrases: Vec<String>,
    pub join_debounce: Duration,
}

impl DispatcherConfig {
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self {
            data_directory: PathBuf::from(&settings.data_directory),
            mention_everyone_on_start: settings.mention_everyone_on_start,
            raid_start_phrases: settings.raid_start_phrases.clone(),
            join_debounce: settings.join_debounce(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Idle,
    Starting,
    InProgress,
    Ended,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    message_id: String,
    kind: StatusKind,
}

/// Turns raid signals into remote messages.
///
/// Owns the single status message, the leaderboard message and the kill feed. Roster updates
/// are debounced; boss spawns and raid ends cancel the pending roster update so they are
/// never delayed behind it.
pub struct RaidDispatcher {
    sink: Arc<dyn NotificationSink>,
    config: DispatcherConfig,
    stats: StatsStore,
    kill_feed: KillFeedManager,
    message_ids: MessageIdStore,
    status: Option<StatusMessage>,
    raid_active: bool,
    roster_debounce: DebounceTimer,
    roster_flush_sender: mpsc::UnboundedSender<RaidSnapshot>,
    roster_flush_receiver: Option<mpsc::UnboundedReceiver<RaidSnapshot>>,
}

impl RaidDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, config: DispatcherConfig, stats: StatsStore) -> Self {
        let (roster_flush_sender, roster_flush_receiver) = mpsc::unbounded_channel();
        let kill_feed = KillFeedManager::load(&config.data_directory);
        let message_ids = MessageIdStore::load(&config.data_directory);
        let roster_debounce = DebounceTimer::new(config.join_debounce);

        Self {
            sink,
            config,
            stats,
            kill_feed,
            message_ids,
            status: None,
            raid_active: false,
            roster_debounce,
            roster_flush_sender,
            roster_flush_receiver: Some(roster_flush_receiver),
        }
    }

    pub async fn run(mut self, mut signals: mpsc::UnboundedReceiver<RaidSignal>) {
        let Some(mut roster_flushes) = self.roster_flush_receiver.take() else {
            tracing::error!("Raid dispatcher started twice");
            return;
        };

        self.announce_idle().await;

        loop {
            // Flushes first so a fired roster update never lands after a later boss spawn.
            tokio::select! {
                biased;

                Some(snapshot) = roster_flushes.recv() => {
                    self.flush_roster(snapshot).await;
                }
                signal = signals.recv() => {
                    let Some(signal) = signal else {
                        break;
                    };
                    self.handle_signal(signal).await;
                }
            }
        }

        self.roster_debounce.cancel();
        tracing::debug!("Raid dispatcher stopped");
    }

    pub async fn announce_idle(&mut self) {
        self.replace_status(StatusKind::Idle, OutboundMessage::embed(embeds::raid_idle()))
            .await;
        self.refresh_leaderboard().await;
    }

    pub async fn handle_signal(&mut self, signal: RaidSignal) {
        match signal {
            RaidSignal::RaidStarting(snapshot) => {
                self.roster_debounce.cancel();
                self.raid_active = true;

                let phrase = self
                    .config
                    .raid_start_phrases
                    .choose(&mut rand::thread_rng())
                    .cloned();
                let mut message =
                    OutboundMessage::embed(embeds::raid_starting(&snapshot, phrase.as_deref()));
                if self.config.mention_everyone_on_start {
                    message = message.with_content("@here");
                }
                self.replace_status(StatusKind::Starting, message).await;
            }
            RaidSignal::RosterChanged(snapshot) => {
                let flush_sender = self.roster_flush_sender.clone();
                self.roster_debounce.schedule(async move {
                    if flush_sender.send(snapshot).is_err() {
                        tracing::debug!("Roster flush dropped, dispatcher stopped");
                    }
                });
            }
            RaidSignal::BossSpawned { boss, snapshot } => {
                if self.roster_debounce.cancel() {
                    tracing::debug!(boss = %boss, "Boss spawn superseded pending roster update");
                }
                self.publish_in_progress(&snapshot).await;
            }
            RaidSignal::BossKilled(kill) => {
                self.kill_feed.record_kill(self.sink.as_ref(), &kill).await;
            }
            RaidSignal::RaidEnded(summary) => {
                self.roster_debounce.cancel();
                self.raid_active = false;

                self.replace_status(
                    StatusKind::Ended,
                    OutboundMessage::embed(embeds::raid_ended(&summary)),
                )
                .await;
                self.refresh_leaderboard().await;
            }
        }
    }

    async fn flush_roster(&mut self, snapshot: RaidSnapshot) {
        if !self.raid_active {
            tracing::debug!("Ignoring roster update that arrived after the raid ended");
            return;
        }

        self.publish_in_progress(&snapshot).await;
    }

    async fn publish_in_progress(&mut self, snapshot: &RaidSnapshot) {
        let message = OutboundMessage::embed(embeds::raid_in_progress(snapshot));

        let current_in_progress = self
            .status
            .as_ref()
            .filter(|status| status.kind == StatusKind::InProgress)
            .map(|status| status.message_id.clone());

        if let Some(message_id) = current_in_progress {
            match self.sink.update(&message_id, &message).await {
                Ok(()) => return,
                Err(SinkError::NotFound) => {
                    tracing::info!(message_id = %message_id, "Status message vanished, reposting");
                    self.status = None;
                }
                Err(error) => {
                    tracing::warn!(sink_error = %error, "Failed to update player list");
                    return;
                }
            }
        }

        self.replace_status(StatusKind::InProgress, message).await;
    }

    async fn replace_status(&mut self, kind: StatusKind, message: OutboundMessage) {
        if let Some(previous) = self.status.take() {
            match self.sink.delete(&previous.message_id).await {
                Ok(()) | Err(SinkError::NotFound) => {}
                Err(error) => {
                    tracing::warn!(
                        message_id = %previous.message_id,
                        sink_error = %error,
                        "Could not delete previous status message"
                    );
                }
            }
        }

        match self.sink.create(&message).await {
            Ok(message_id) => {
                self.status = Some(StatusMessage { message_id, kind });
            }
            Err(error) => {
                tracing::warn!(status = ?kind, sink_error = %error, "Failed to post new status");
            }
        }
    }

    async fn refresh_leaderboard(&mut self) {
        let board = build_leaderboard(&self.stats.load());
        let message = OutboundMessage::embed(embeds::leaderboard(&board));

        if let Some(message_id) = self.message_ids.stats_message_id().map(str::to_string) {
            match self.sink.update(&message_id, &message).await {
                Ok(()) => return,
                Err(SinkError::NotFound) => {
                    tracing::info!(message_id = %message_id, "Leaderboard message missing, recreating");
                }
                Err(error) => {
                    tracing::warn!(sink_error = %error, "Failed to update leaderboard");
                    return;
                }
            }
        }

        match self.sink.create(&message).await {
            Ok(message_id) => self.message_ids.set_stats_message_id(Some(message_id)),
            Err(error) => tracing::warn!(sink_error = %error, "Failed to post leaderboard"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatcherConfig, RaidDispatcher};
    use crate::dispatch::test_support::{RecordingSink, SinkCall};
    use crate::dispatch::SinkError;
    use crate::documents::unique_temp_directory;
    use crate::raid::session::RaidSnapshot;
    use crate::raid::{BossKill, RaidSignal};
    use crate::stats::StatsStore;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn config(data_directory: &Path) -> DispatcherConfig {
        DispatcherConfig {
            data_directory: data_directory.to_path_buf(),
            mention_everyone_on_start: true,
            raid_start_phrases: vec!["Got Keys?".to_string()],
            join_debounce: Duration::from_millis(1500),
        }
    }

    fn snapshot(participants: &[&str], bosses: &[&str]) -> RaidSnapshot {
        RaidSnapshot {
            map: "Woods".to_string(),
            time_of_day: "N/A".to_string(),
            participants: participants.iter().map(|name| name.to_string()).collect(),
            active_bosses: bosses.iter().map(|name| name.to_string()).collect(),
        }
    }

    fn titles(calls: &[SinkCall]) -> Vec<String> {
        calls
            .iter()
            .map(|call| match call {
                SinkCall::Create { title, .. } => format!("create:{title}"),
                SinkCall::Update { title, .. } => format!("update:{title}"),
                SinkCall::Delete { message_id } => format!("delete:{message_id}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn leaderboard_is_recreated_when_remote_message_is_gone() {
        let temp_directory = unique_temp_directory("dispatcher_leaderboard");
        let sink = Arc::new(RecordingSink::default());
        let stats = StatsStore::in_directory(&temp_directory);

        let mut dispatcher = RaidDispatcher::new(sink.clone(), config(&temp_directory), stats.clone());
        dispatcher.announce_idle().await;
        let first_id = dispatcher
            .message_ids
            .stats_message_id()
            .map(str::to_string)
            .expect("Expected leaderboard id after first post");

        sink.fail_next_update(SinkError::NotFound);
        let mut restarted = RaidDispatcher::new(sink.clone(), config(&temp_directory), stats);
        restarted.refresh_leaderboard().await;

        let second_id = restarted
            .message_ids
            .stats_message_id()
            .map(str::to_string)
            .expect("Expected recreated leaderboard id");
        assert_ne!(first_id, second_id);

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }

    #[tokio::test(start_paused = true)]
    async fn join_burst_produces_one_roster_update() {
        let temp_directory = unique_temp_directory("dispatcher_debounce");
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = RaidDispatcher::new(
            sink.clone(),
            config(&temp_directory),
            StatsStore::in_directory(&temp_directory),
        );
        let (signal_sender, signal_receiver) = mpsc::unbounded_channel();
        let dispatcher_task = tokio::spawn(dispatcher.run(signal_receiver));

        signal_sender
            .send(RaidSignal::RaidStarting(snapshot(&[], &[])))
            .expect("dispatcher alive");
        for players in [&["Alice"][..], &["Alice", "Bob"][..], &["Alice", "Bob", "Carol"][..]] {
            signal_sender
                .send(RaidSignal::RosterChanged(snapshot(players, &[])))
                .expect("dispatcher alive");
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tokio::time::sleep(Duration::from_secs(3)).await;

        drop(signal_sender);
        dispatcher_task.await.expect("dispatcher task panicked");

        let in_progress_posts = sink
            .calls()
            .iter()
            .filter(|call| matches!(call, SinkCall::Create { title, .. } if title.contains("Raid in Progress")))
            .count();
        assert_eq!(in_progress_posts, 1);

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }

    #[tokio::test(start_paused = true)]
    async fn boss_spawn_cancels_pending_roster_update_and_posts_now() {
        let temp_directory = unique_temp_directory("dispatcher_boss");
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = RaidDispatcher::new(
            sink.clone(),
            config(&temp_directory),
            StatsStore::in_directory(&temp_directory),
        );
        dispatcher
            .handle_signal(RaidSignal::RaidStarting(snapshot(&[], &[])))
            .await;
        sink.clear();

        dispatcher
            .handle_signal(RaidSignal::RosterChanged(snapshot(&["Alice"], &[])))
            .await;
        assert!(dispatcher.roster_debounce.is_pending());

        dispatcher
            .handle_signal(RaidSignal::BossSpawned {
                boss: "Killa".to_string(),
                snapshot: snapshot(&["Alice"], &["Killa"]),
            })
            .await;
        assert!(!dispatcher.roster_debounce.is_pending());

        let calls = titles(&sink.calls());
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("delete:"));
        assert!(calls[1].starts_with("create:") && calls[1].contains("Raid in Progress"));

        sink.clear();
        dispatcher
            .handle_signal(RaidSignal::RosterChanged(snapshot(&["Alice", "Bob"], &["Killa"])))
            .await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let mut roster_flushes = dispatcher
            .roster_flush_receiver
            .take()
            .expect("receiver not yet taken");
        let pending = roster_flushes.recv().await.expect("debounced roster flush");
        dispatcher.flush_roster(pending).await;

        let calls = titles(&sink.calls());
        assert_eq!(calls, vec!["update::x: Raid in Progress! :x:".to_string()]);

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }

    #[tokio::test(start_paused = true)]
    async fn queued_roster_flush_is_handled_before_later_boss_spawn() {
        let temp_directory = unique_temp_directory("dispatcher_ordering");
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = RaidDispatcher::new(
            sink.clone(),
            config(&temp_directory),
            StatsStore::in_directory(&temp_directory),
        );
        dispatcher
            .handle_signal(RaidSignal::RaidStarting(snapshot(&[], &[])))
            .await;
        dispatcher
            .handle_signal(RaidSignal::RosterChanged(snapshot(&["Alice"], &[])))
            .await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let (signal_sender, signal_receiver) = mpsc::unbounded_channel();
        signal_sender
            .send(RaidSignal::BossSpawned {
                boss: "Killa".to_string(),
                snapshot: snapshot(&["Alice"], &["Killa"]),
            })
            .expect("receiver alive");
        drop(signal_sender);
        dispatcher.run(signal_receiver).await;

        let last_in_progress = sink
            .sent_messages()
            .into_iter()
            .rev()
            .find(|message| message.title().contains("Raid in Progress"))
            .expect("Expected an in-progress message");
        assert!(last_in_progress.embeds[0]
            .fields
            .iter()
            .any(|field| field.name.contains("Bosses Spotted")));

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }

    #[tokio::test]
    async fn raid_end_replaces_status_and_ignores_late_roster_flush() {
        let temp_directory = unique_temp_directory("dispatcher_end");
        let sink = Arc::new(RecordingSink::default());
        let mut dispatcher = RaidDispatcher::new(
            sink.clone(),
            config(&temp_directory),
            StatsStore::in_directory(&temp_directory),
        );
        dispatcher.announce_idle().await;
        dispatcher
            .handle_signal(RaidSignal::RaidStarting(snapshot(&[], &[])))
            .await;
        dispatcher
            .handle_signal(RaidSignal::BossKilled(BossKill {
                killer: "Alice".to_string(),
                boss: "Killa".to_string(),
                kill_count: 1,
                map: "Woods".to_string(),
            }))
            .await;
        assert_eq!(dispatcher.kill_feed.entries().len(), 1);

        let mut tracker = crate::raid::RaidTracker::new(StatsStore::in_directory(&temp_directory));
        let now = chrono::Utc::now();
        tracker.process_line("[Info   :Fika.Core] Starting on location Woods", now);
        let signals = tracker.process_line("[Info   :Fika.Server] Destroyed FikaServer", now);
        sink.clear();
        for signal in signals {
            dispatcher.handle_signal(signal).await;
        }

        let calls = titles(&sink.calls());
        assert!(calls[0].starts_with("delete:"));
        assert!(calls[1].contains("Raid Ended"));
        assert!(calls[2].contains("Leaderboard"));

        sink.clear();
        dispatcher.flush_roster(snapshot(&["Alice"], &[])).await;
        assert!(sink.calls().is_empty());

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }
}
