pub mod entity;
pub mod events;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

pub const MAX_LOG_HISTORY: usize = 15;

/// The most recent raw log lines, oldest first.
#[derive(Debug, Default)]
pub struct LogHistory {
    lines: VecDeque<String>,
}

impl LogHistory {
    pub fn push(&mut self, line: &str) {
        if self.lines.len() >= MAX_LOG_HISTORY {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Starts tailing at the current end of the file so old raids are not replayed.
pub fn initial_log_offset(log_path: &Path) -> Result<u64, String> {
    let metadata = std::fs::metadata(log_path).map_err(|error| {
        format!(
            "Raid log file not found at '{}': {error}",
            log_path.display()
        )
    })?;

    Ok(metadata.len())
}

/// Follows `log_path` and forwards each newly appended line, in order, to `line_sender`.
pub async fn watch_raid_log(
    log_path: PathBuf,
    initial_offset: u64,
    line_sender: mpsc::UnboundedSender<String>,
) -> Result<(), String> {
    let (notify_sender, mut notify_receiver) =
        mpsc::unbounded_channel::<Result<Event, notify::Error>>();

    let mut watcher = notify::recommended_watcher(move |result| {
        if notify_sender.send(result).is_err() {
            tracing::debug!("Raid log watcher notification receiver dropped");
        }
    })
    .map_err(|error| error.to_string())?;

    let watch_directory = log_path
        .parent()
        .filter(|directory| !directory.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    watcher
        .watch(watch_directory, RecursiveMode::NonRecursive)
        .map_err(|error| error.to_string())?;

    tracing::info!(log_path = %log_path.display(), initial_offset, "Watching raid log");

    let mut file_offset = initial_offset;
    while let Some(notification_result) = notify_receiver.recv().await {
        match notification_result {
            Ok(event) => {
                if !is_relevant_notification(&event, &log_path) {
                    continue;
                }

                match read_new_lines(&log_path, &mut file_offset) {
                    Ok(lines) => {
                        for line in lines {
                            if line_sender.send(line).is_err() {
                                tracing::debug!("Raid log line receiver dropped, stopping watch");
                                return Ok(());
                            }
                        }
                    }
                    Err(error) => tracing::warn!("Failed to read raid log update: {error}"),
                }
            }
            Err(error) => {
                tracing::warn!("Raid log watcher error: {error}");
            }
        }
    }

    Ok(())
}

fn is_relevant_notification(event: &Event, log_path: &Path) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    if !relevant_kind {
        return false;
    }

    let Some(log_file_name) = log_path.file_name() else {
        return false;
    };

    event.paths.iter().any(|path| {
        path == log_path
            || path
                .file_name()
                .map(|file_name| file_name == log_file_name)
                .unwrap_or(false)
    })
}

/// Reads complete lines appended after `file_offset`, advancing it past them.
///
/// A file shorter than the offset was truncated or rotated; reading restarts at 0 and earlier
/// lines may be delivered again. A trailing partial line is left for the next read.
pub fn read_new_lines(log_path: &Path, file_offset: &mut u64) -> Result<Vec<String>, String> {
    let mut file = File::open(log_path).map_err(|error| error.to_string())?;
    let file_length = file.metadata().map_err(|error| error.to_string())?.len();

    if file_length < *file_offset {
        tracing::info!(
            log_path = %log_path.display(),
            previous_offset = *file_offset,
            file_length,
            "Raid log truncated, rereading from start"
        );
        *file_offset = 0;
    }

    file.seek(SeekFrom::Start(*file_offset))
        .map_err(|error| error.to_string())?;

    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let mut lines = Vec::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .map_err(|error| error.to_string())?;
        if bytes_read == 0 || !line.ends_with('\n') {
            break;
        }

        *file_offset = file_offset.saturating_add(bytes_read as u64);
        let content = line.trim_end_matches(['\r', '\n']);
        if !content.trim().is_empty() {
            lines.push(content.to_string());
        }
    }

    Ok(lines)
}
