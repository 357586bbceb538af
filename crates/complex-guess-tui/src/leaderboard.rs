//! Score storage backends
//!
//! Selected from the environment:
//! - Local: JSON files under the data directory
//! - Test: in-memory store, nothing touches disk

use complex_guess_core::session::{insert_ranked, MAX_HISTORY};
use complex_guess_core::{
    Achievement, GameMode, HistoryRecord, MemoryStore, ScoreEntry, ScoreStore, StoreError,
    StoreResult,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Leaderboard size kept on disk
pub const MAX_LEADERBOARD: usize = 10;

const LEADERBOARD_FILE: &str = "leaderboard.json";
const HISTORY_FILE: &str = "history.json";
const ACHIEVEMENTS_FILE: &str = "achievements.json";

/// Environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// File-based storage
    Local,
    /// In-memory storage
    Test,
}

impl Environment {
    /// Detect environment from COMPLEX_GUESS_ENV variable
    pub fn detect() -> Self {
        Self::from_value(std::env::var("COMPLEX_GUESS_ENV").ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("test") | Some("testing") => Environment::Test,
            _ => Environment::Local,
        }
    }
}

/// `<local data dir>/complex-guess`, or `./complex-guess` without one
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("complex-guess")
}

/// Current local date, `YYYY-MM-DD`
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Read a JSON file; missing or corrupt files load as the default
pub fn read_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    match fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "Corrupt file, starting empty");
            T::default()
        }),
        Err(_) => T::default(),
    }
}

/// Write JSON to `<path>.tmp`, then rename over `path`
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| StoreError::Format(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "Saved");
    Ok(())
}

/// An achievement with the date it was first earned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub achievement: Achievement,
    pub date: String,
}

/// File-backed store, one JSON file per concern
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn history(&self) -> Vec<HistoryRecord> {
        read_json(&self.path(HISTORY_FILE))
    }

    pub fn achievements(&self) -> Vec<UnlockedAchievement> {
        read_json(&self.path(ACHIEVEMENTS_FILE))
    }
}

impl ScoreStore for FileStore {
    fn record_result(
        &mut self,
        name: &str,
        points: u32,
        attempts: u32,
        elapsed_secs: u64,
        mode: GameMode,
    ) -> StoreResult<()> {
        let path = self.path(LEADERBOARD_FILE);
        let mut entries: Vec<ScoreEntry> = read_json(&path);
        let entry = ScoreEntry {
            name: name.to_string(),
            points,
            attempts,
            time: elapsed_secs,
            mode,
            date: today(),
        };
        insert_ranked(&mut entries, entry, MAX_LEADERBOARD);
        write_json_atomic(&path, &entries)
    }

    fn top_scores(&self, limit: usize) -> StoreResult<Vec<ScoreEntry>> {
        let path = self.path(LEADERBOARD_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut entries: Vec<ScoreEntry> =
            serde_json::from_str(&json).map_err(|e| StoreError::Format(e.to_string()))?;
        entries.truncate(limit);
        Ok(entries)
    }

    fn record_history(&mut self, mut record: HistoryRecord) -> StoreResult<()> {
        let path = self.path(HISTORY_FILE);
        let mut history: Vec<HistoryRecord> = read_json(&path);
        record.date = timestamp();
        history.insert(0, record);
        history.truncate(MAX_HISTORY);
        write_json_atomic(&path, &history)
    }

    fn unlock_achievements(&mut self, earned: &[Achievement]) -> StoreResult<Vec<Achievement>> {
        let path = self.path(ACHIEVEMENTS_FILE);
        let mut unlocked: Vec<UnlockedAchievement> = read_json(&path);
        let fresh: Vec<Achievement> = earned
            .iter()
            .copied()
            .filter(|a| !unlocked.iter().any(|u| u.achievement == *a))
            .collect();
        if fresh.is_empty() {
            return Ok(fresh);
        }
        let date = today();
        unlocked.extend(fresh.iter().map(|&achievement| UnlockedAchievement {
            achievement,
            date: date.clone(),
        }));
        write_json_atomic(&path, &unlocked)?;
        Ok(fresh)
    }

    fn clear_leaderboard(&mut self) -> StoreResult<()> {
        write_json_atomic(&self.path(LEADERBOARD_FILE), &Vec::<ScoreEntry>::new())
    }
}

/// The store the app runs against
pub enum Store {
    File(FileStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn for_environment(env: Environment, dir: &Path) -> Self {
        match env {
            Environment::Local => Store::File(FileStore::new(dir)),
            Environment::Test => Store::Memory(MemoryStore::new()),
        }
    }

    /// Backend name for display
    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::File(_) => "Local",
            Store::Memory(_) => "Memory",
        }
    }

    /// Recent rounds, newest first
    pub fn history(&self) -> Vec<HistoryRecord> {
        match self {
            Store::File(store) => store.history(),
            Store::Memory(store) => store.history.clone(),
        }
    }

    pub fn achievements(&self) -> Vec<UnlockedAchievement> {
        match self {
            Store::File(store) => store.achievements(),
            Store::Memory(store) => store
                .unlocked
                .iter()
                .map(|&achievement| UnlockedAchievement {
                    achievement,
                    date: String::new(),
                })
                .collect(),
        }
    }

    fn inner(&mut self) -> &mut dyn ScoreStore {
        match self {
            Store::File(store) => store,
            Store::Memory(store) => store,
        }
    }
}

impl ScoreStore for Store {
    fn record_result(
        &mut self,
        name: &str,
        points: u32,
        attempts: u32,
        elapsed_secs: u64,
        mode: GameMode,
    ) -> StoreResult<()> {
        self.inner()
            .record_result(name, points, attempts, elapsed_secs, mode)
    }

    fn top_scores(&self, limit: usize) -> StoreResult<Vec<ScoreEntry>> {
        match self {
            Store::File(store) => store.top_scores(limit),
            Store::Memory(store) => store.top_scores(limit),
        }
    }

    fn record_history(&mut self, record: HistoryRecord) -> StoreResult<()> {
        self.inner().record_history(record)
    }

    fn unlock_achievements(&mut self, earned: &[Achievement]) -> StoreResult<Vec<Achievement>> {
        self.inner().unlock_achievements(earned)
    }

    fn clear_leaderboard(&mut self) -> StoreResult<()> {
        self.inner().clear_leaderboard()
    }
}

/// `N. name - P pts (A attempts, Ts)`
pub fn format_entry(rank: usize, entry: &ScoreEntry) -> String {
    format!(
        "{}. {} - {} pts ({} attempts, {}s)",
        rank, entry.name, entry.points, entry.attempts, entry.time
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn history(result: &str) -> HistoryRecord {
        HistoryRecord {
            result: result.to_string(),
            target: "1 + 1i".to_string(),
            attempts: 3,
            time: 12,
            points: 0,
            mode: GameMode::Standard,
            date: String::new(),
        }
    }

    #[test]
    fn test_environment_detection() {
        assert_eq!(Environment::from_value(None), Environment::Local);
        assert_eq!(Environment::from_value(Some("test")), Environment::Test);
        assert_eq!(Environment::from_value(Some("prod")), Environment::Local);
    }

    #[test]
    fn test_leaderboard_sorted_and_capped() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        for i in 0..12u32 {
            store
                .record_result(&format!("p{}", i), 100 + i * 10, 2, 5, GameMode::Standard)
                .unwrap();
        }

        let top = store.top_scores(20).unwrap();
        assert_eq!(top.len(), MAX_LEADERBOARD);
        assert_eq!(top[0].points, 210);
        assert!(top.windows(2).all(|w| w[0].points >= w[1].points));
        assert_eq!(store.top_scores(3).unwrap().len(), 3);
        assert!(!dir.path().join("leaderboard.json.tmp").exists());
    }

    #[test]
    fn test_missing_leaderboard_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert!(store.top_scores(10).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_leaderboard() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(LEADERBOARD_FILE), "{not json").unwrap();
        let mut store = FileStore::new(dir.path());

        assert!(matches!(store.top_scores(10), Err(StoreError::Format(_))));

        // Writing starts over from an empty board
        store
            .record_result("Ada", 500, 3, 20, GameMode::Daily)
            .unwrap();
        let top = store.top_scores(10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].mode, GameMode::Daily);
    }

    #[test]
    fn test_history_newest_first_and_capped() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        for _ in 0..MAX_HISTORY {
            store.record_history(history("timeout")).unwrap();
        }
        store.record_history(history("win")).unwrap();

        let records = store.history();
        assert_eq!(records.len(), MAX_HISTORY);
        assert_eq!(records[0].result, "win");
        assert!(!records[0].date.is_empty());
    }

    #[test]
    fn test_achievements_unlock_once() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        let fresh = store
            .unlock_achievements(&[Achievement::OneShot, Achievement::NoHints])
            .unwrap();
        assert_eq!(fresh.len(), 2);

        let fresh = store
            .unlock_achievements(&[Achievement::NoHints, Achievement::QuickWin])
            .unwrap();
        assert_eq!(fresh, vec![Achievement::QuickWin]);
        assert_eq!(store.achievements().len(), 3);
    }

    #[test]
    fn test_clear_leaderboard() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store
            .record_result("Ada", 500, 3, 20, GameMode::Standard)
            .unwrap();
        store.clear_leaderboard().unwrap();
        assert!(store.top_scores(10).unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_for_test_environment() {
        let dir = tempdir().unwrap();
        let mut store = Store::for_environment(Environment::Test, dir.path());
        assert_eq!(store.backend_name(), "Memory");

        store
            .record_result("Ada", 700, 2, 9, GameMode::Standard)
            .unwrap();
        store.record_history(history("win")).unwrap();

        assert_eq!(store.top_scores(10).unwrap().len(), 1);
        assert_eq!(store.history().len(), 1);
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_format_entry() {
        let entry = ScoreEntry {
            name: "Ada".to_string(),
            points: 906,
            attempts: 2,
            time: 7,
            mode: GameMode::Standard,
            date: "2026-10-19".to_string(),
        };
        assert_eq!(format_entry(1, &entry), "1. Ada - 906 pts (2 attempts, 7s)");
    }
}
