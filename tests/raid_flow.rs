use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use raidwatch_lib::dispatch::notifier::{DispatcherConfig, RaidDispatcher};
use raidwatch_lib::dispatch::LoggingSink;
use raidwatch_lib::kill_feed::KillFeedManager;
use raidwatch_lib::raid::session::RaidState;
use raidwatch_lib::raid::{RaidSignal, RaidTracker};
use raidwatch_lib::raid_log::read_new_lines;
use raidwatch_lib::stats::leaderboard::build_leaderboard;
use raidwatch_lib::stats::StatsStore;
use tokio::sync::mpsc;

const WOODS_RAID: &[&str] = &[
    "[Info   :Fika.Core] Starting on location {\"location\":\"Woods\",\"timeVariant\":\"CURR\"}",
    "[Info   :Fika.Core] New player: Alice (PMC)",
    "[Info   :Fika.Core] Boss spawned: Killa",
    "[Info   :Fika.Core] Death: Killa was killed by Alice (PMC)",
    "[Info   :Fika.Server] Destroyed FikaServer",
];

fn unique_temp_directory(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "raidwatch_flow_{label}_{}_{}",
        std::process::id(),
        nanos
    ))
}

#[tokio::test(start_paused = true)]
async fn woods_raid_updates_stats_and_kill_feed() {
    let temp_directory = unique_temp_directory("woods");
    let store = StatsStore::in_directory(&temp_directory);
    let mut tracker = RaidTracker::new(store.clone());

    let (signal_sender, signal_receiver) = mpsc::unbounded_channel::<RaidSignal>();
    let dispatcher = RaidDispatcher::new(
        Arc::new(LoggingSink::default()),
        DispatcherConfig {
            data_directory: temp_directory.clone(),
            mention_everyone_on_start: false,
            raid_start_phrases: Vec::new(),
            join_debounce: Duration::from_millis(1500),
        },
        store.clone(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run(signal_receiver));

    let mut summary = None;
    for line in WOODS_RAID {
        for signal in tracker.process_line(line, chrono::Utc::now()) {
            if let RaidSignal::RaidEnded(raid_summary) = &signal {
                summary = Some(raid_summary.clone());
            }
            signal_sender.send(signal).expect("dispatcher should be running");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    drop(signal_sender);
    dispatcher_task.await.expect("dispatcher task panicked");

    let summary = summary.expect("raid end should produce a summary");
    assert_eq!(summary.map, "Woods");
    assert_eq!(summary.time_of_day, "Current");
    assert_eq!(summary.kills.bosses, 1);
    assert_eq!(summary.survivors, vec!["Alice".to_string()]);
    assert_eq!(tracker.state(), RaidState::Waiting);
    assert!(tracker.session().participants.is_empty());

    let document = store.load();
    assert_eq!(document.global.total_raids, 1);
    assert_eq!(document.global.boss_spawns.get("Killa").copied(), Some(1));
    let alice = &document.players["Alice"];
    assert_eq!(alice.kills_by_boss.get("Killa").copied(), Some(1));
    assert_eq!(alice.current_survival_streak, 1);

    let board = build_leaderboard(&document);
    assert_eq!(board.boss_kills[0].player, "Alice");
    assert_eq!(board.most_played_map, Some(("Woods".to_string(), 1)));

    let kill_feed = KillFeedManager::load(&temp_directory);
    assert_eq!(kill_feed.entries().len(), 1);
    assert_eq!(kill_feed.entries()[0].boss_name, "Killa");
    assert_eq!(kill_feed.entries()[0].kill_count, 1);

    std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
}

#[test]
fn tailed_lines_drive_the_tracker_in_order() {
    let temp_directory = unique_temp_directory("tail");
    std::fs::create_dir_all(&temp_directory).expect("Failed to create temp directory");
    let log_path = temp_directory.join("LogOutput.log");

    let mut log_file = std::fs::File::create(&log_path).expect("Failed to create log file");
    writeln!(log_file, "[Info   :BepInEx] Chainloader ready").expect("Failed to write log");
    let mut offset = std::fs::metadata(&log_path)
        .expect("Failed to stat log file")
        .len();

    for line in WOODS_RAID {
        writeln!(log_file, "{line}").expect("Failed to write log");
    }
    log_file.flush().expect("Failed to flush log");

    let lines = read_new_lines(&log_path, &mut offset).expect("Failed to read appended lines");
    assert_eq!(lines.len(), WOODS_RAID.len());

    let mut tracker = RaidTracker::new(StatsStore::in_directory(&temp_directory));
    let signals: Vec<RaidSignal> = lines
        .iter()
        .flat_map(|line| tracker.process_line(line, chrono::Utc::now()))
        .collect();

    assert!(matches!(signals.first(), Some(RaidSignal::RaidStarting(_))));
    assert!(matches!(signals.last(), Some(RaidSignal::RaidEnded(_))));
    assert_eq!(tracker.history().len(), WOODS_RAID.len());

    std::fs::remove_dir_all(&temp_directory).expect("Failed to remove temp directory");
}
