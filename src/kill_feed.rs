use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dispatch::embeds::kill_feed_entry;
use crate::dispatch::{NotificationSink, OutboundMessage, SinkError};
use crate::documents::{load_json_document_or_default, persist_json_document};
use crate::raid::BossKill;

pub const KILL_FEED_CAPACITY: usize = 3;
pub const KILL_FEED_DOCUMENT_FILE: &str = "kill_feed.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillFeedEntry {
    pub remote_message_id: String,
    pub killer_name: String,
    pub boss_name: String,
    pub kill_count: u64,
    pub map_name: String,
}

/// The visible boss-kill feed: at most three remote messages, newest first.
///
/// Display position is the index plus one, so position 1 is always the latest kill and every
/// insert shifts the older entries down one rank.
#[derive(Debug)]
pub struct KillFeedManager {
    document_path: PathBuf,
    entries: Vec<KillFeedEntry>,
}

impl KillFeedManager {
    pub fn load(data_directory: &Path) -> Self {
        let document_path = data_directory.join(KILL_FEED_DOCUMENT_FILE);
        let mut entries: Vec<KillFeedEntry> = load_json_document_or_default(&document_path);
        entries.truncate(KILL_FEED_CAPACITY);

        Self {
            document_path,
            entries,
        }
    }

    pub fn entries(&self) -> &[KillFeedEntry] {
        &self.entries
    }

    pub async fn record_kill(&mut self, sink: &dyn NotificationSink, kill: &BossKill) {
        if self.entries.len() >= KILL_FEED_CAPACITY {
            self.evict_oldest(sink).await;
        }

        let mut entry = KillFeedEntry {
            remote_message_id: String::new(),
            killer_name: kill.killer.clone(),
            boss_name: kill.boss.clone(),
            kill_count: kill.kill_count,
            map_name: kill.map.clone(),
        };

        match sink
            .create(&OutboundMessage::embed(kill_feed_entry(&entry, 1)))
            .await
        {
            Ok(message_id) => {
                entry.remote_message_id = message_id;
                self.entries.insert(0, entry);
            }
            Err(error) => {
                tracing::warn!(
                    killer = %kill.killer,
                    boss = %kill.boss,
                    sink_error = %error,
                    "Failed to post boss kill to feed"
                );
            }
        }

        self.rerender_older_entries(sink).await;
        self.persist();
    }

    async fn evict_oldest(&mut self, sink: &dyn NotificationSink) {
        let Some(oldest) = self.entries.pop() else {
            return;
        };

        match sink.delete(&oldest.remote_message_id).await {
            Ok(()) | Err(SinkError::NotFound) => {}
            Err(error) => {
                tracing::warn!(
                    message_id = %oldest.remote_message_id,
                    sink_error = %error,
                    "Failed to delete evicted kill feed message"
                );
            }
        }
    }

    async fn rerender_older_entries(&mut self, sink: &dyn NotificationSink) {
        let mut kept = Vec::with_capacity(self.entries.len());
        let mut entries = std::mem::take(&mut self.entries).into_iter();

        if let Some(latest) = entries.next() {
            kept.push(latest);
        }

        for entry in entries {
            let position = kept.len() + 1;
            let message = OutboundMessage::embed(kill_feed_entry(&entry, position));
            match sink.update(&entry.remote_message_id, &message).await {
                Ok(()) => kept.push(entry),
                Err(error) => {
                    tracing::info!(
                        message_id = %entry.remote_message_id,
                        sink_error = %error,
                        "Dropping kill feed entry that could not be re-rendered"
                    );
                }
            }
        }

        self.entries = kept;
    }

    fn persist(&self) {
        persist_json_document(&self.document_path, &self.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::{KillFeedManager, KILL_FEED_CAPACITY};
    use crate::dispatch::test_support::{RecordingSink, SinkCall};
    use crate::dispatch::SinkError;
    use crate::documents::unique_temp_directory;
    use crate::raid::BossKill;

    fn boss_kill(killer: &str, boss: &str, kill_count: u64) -> BossKill {
        BossKill {
            killer: killer.to_string(),
            boss: boss.to_string(),
            kill_count,
            map: "Woods".to_string(),
        }
    }

    fn message_ids(manager: &KillFeedManager) -> Vec<&str> {
        manager
            .entries()
            .iter()
            .map(|entry| entry.remote_message_id.as_str())
            .collect()
    }

    #[tokio::test]
    async fn fourth_kill_evicts_oldest_and_renumbers() {
        let temp_directory = unique_temp_directory("kill_feed_evict");
        let sink = RecordingSink::default();
        let mut manager = KillFeedManager::load(&temp_directory);

        for (index, boss) in ["Killa", "Reshala", "Tagilla"].iter().enumerate() {
            manager
                .record_kill(&sink, &boss_kill("Alice", boss, index as u64 + 1))
                .await;
        }
        assert_eq!(message_ids(&manager), vec!["msg-3", "msg-2", "msg-1"]);

        sink.clear();
        manager.record_kill(&sink, &boss_kill("Bob", "Glukhar", 1)).await;

        assert_eq!(manager.entries().len(), KILL_FEED_CAPACITY);
        assert_eq!(message_ids(&manager), vec!["msg-4", "msg-3", "msg-2"]);
        assert_eq!(manager.entries()[0].boss_name, "Glukhar");

        let calls = sink.calls();
        assert_eq!(
            calls[0],
            SinkCall::Delete {
                message_id: "msg-1".to_string()
            }
        );
        assert!(matches!(&calls[1], SinkCall::Create { title, .. } if title.contains("Latest")));
        assert!(matches!(&calls[2], SinkCall::Update { message_id, title } if message_id == "msg-3" && title.contains("#2")));
        assert!(matches!(&calls[3], SinkCall::Update { message_id, title } if message_id == "msg-2" && title.contains("#3")));

        let reloaded = KillFeedManager::load(&temp_directory);
        assert_eq!(message_ids(&reloaded), vec!["msg-4", "msg-3", "msg-2"]);

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }

    #[tokio::test]
    async fn failed_delete_does_not_block_insert() {
        let temp_directory = unique_temp_directory("kill_feed_delete_failure");
        let sink = RecordingSink::default();
        let mut manager = KillFeedManager::load(&temp_directory);
        for index in 0..KILL_FEED_CAPACITY {
            manager
                .record_kill(&sink, &boss_kill("Alice", "Killa", index as u64 + 1))
                .await;
        }

        sink.fail_next_delete(SinkError::Status(500));
        manager.record_kill(&sink, &boss_kill("Alice", "Killa", 4)).await;

        assert_eq!(manager.entries().len(), KILL_FEED_CAPACITY);
        assert_eq!(manager.entries()[0].kill_count, 4);

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }

    #[tokio::test]
    async fn failed_create_after_eviction_keeps_remaining_entries() {
        let temp_directory = unique_temp_directory("kill_feed_create_failure");
        let sink = RecordingSink::default();
        let mut manager = KillFeedManager::load(&temp_directory);
        for boss in ["Killa", "Reshala", "Tagilla"] {
            manager.record_kill(&sink, &boss_kill("Alice", boss, 1)).await;
        }

        sink.clear();
        sink.fail_next_create(SinkError::Status(500));
        manager.record_kill(&sink, &boss_kill("Bob", "Glukhar", 1)).await;

        assert_eq!(message_ids(&manager), vec!["msg-3", "msg-2"]);
        assert_eq!(manager.entries()[0].boss_name, "Tagilla");
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Delete {
                    message_id: "msg-1".to_string()
                },
                SinkCall::Update {
                    message_id: "msg-2".to_string(),
                    title: ":crossed_swords: Boss Down! (#2)".to_string()
                },
            ]
        );

        let reloaded = KillFeedManager::load(&temp_directory);
        assert_eq!(reloaded.entries(), manager.entries());

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }

    #[tokio::test]
    async fn entry_that_fails_to_rerender_is_dropped() {
        let temp_directory = unique_temp_directory("kill_feed_rerender_failure");
        let sink = RecordingSink::default();
        let mut manager = KillFeedManager::load(&temp_directory);
        manager.record_kill(&sink, &boss_kill("Alice", "Killa", 1)).await;
        manager.record_kill(&sink, &boss_kill("Alice", "Reshala", 1)).await;

        sink.fail_next_update(SinkError::NotFound);
        manager.record_kill(&sink, &boss_kill("Bob", "Sanitar", 1)).await;

        assert_eq!(message_ids(&manager), vec!["msg-3", "msg-1"]);

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }
}
