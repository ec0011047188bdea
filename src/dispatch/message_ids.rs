use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::documents::{load_json_document_or_default, persist_json_document};

pub const MESSAGE_IDS_DOCUMENT_FILE: &str = "message_ids.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageIds {
    pub stats_message_id: Option<String>,
}

/// Remembers the leaderboard message so it can be edited in place across restarts.
#[derive(Debug)]
pub struct MessageIdStore {
    document_path: PathBuf,
    ids: MessageIds,
}

impl MessageIdStore {
    pub fn load(data_directory: &Path) -> Self {
        let document_path = data_directory.join(MESSAGE_IDS_DOCUMENT_FILE);
        let ids = load_json_document_or_default(&document_path);
        Self { document_path, ids }
    }

    pub fn stats_message_id(&self) -> Option<&str> {
        self.ids.stats_message_id.as_deref()
    }

    pub fn set_stats_message_id(&mut self, message_id: Option<String>) {
        self.ids.stats_message_id = message_id;
        persist_json_document(&self.document_path, &self.ids);
    }
}

#[cfg(test)]
mod tests {
    use super::MessageIdStore;
    use crate::documents::unique_temp_directory;

    #[test]
    fn persists_stats_message_id() {
        let temp_directory = unique_temp_directory("message_ids");
        let mut store = MessageIdStore::load(&temp_directory);
        assert_eq!(store.stats_message_id(), None);

        store.set_stats_message_id(Some("123".to_string()));
        let reloaded = MessageIdStore::load(&temp_directory);
        assert_eq!(reloaded.stats_message_id(), Some("123"));

        std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
    }
}
