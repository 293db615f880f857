use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{info, warn};

use crate::error::Result;

/// Key the personal best is stored under.
pub const PERSONAL_BEST_KEY: &str = "typing-personal-best";

/// Minimal string key-value storage, owned by the host application.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A flat JSON object on disk, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A file that is not a JSON object reads as empty; the next `set`
    /// overwrites it with a valid one.
    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&self.path)?;
        match serde_json::from_slice(&bytes) {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt store file");
                Ok(BTreeMap::new())
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&values)?)?;
        Ok(())
    }
}

/// What happened to the personal best when a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestOutcome {
    /// No previous best existed.
    Baseline { wpm: u32 },
    NewBest { wpm: u32, previous: u32 },
    NotBeaten { wpm: u32, best: u32 },
}

impl BestOutcome {
    pub fn wpm(&self) -> u32 {
        match *self {
            BestOutcome::Baseline { wpm }
            | BestOutcome::NewBest { wpm, .. }
            | BestOutcome::NotBeaten { wpm, .. } => wpm,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, BestOutcome::NotBeaten { .. })
    }
}

/// Tracks the highest WPM ever reached on top of a [`KeyValueStore`].
pub struct PersonalBest {
    store: Box<dyn KeyValueStore>,
    subscribers: Vec<Sender<u32>>,
}

impl std::fmt::Debug for PersonalBest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalBest")
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl PersonalBest {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            subscribers: Vec::new(),
        }
    }

    /// Stored best, if any. A value that does not parse counts as absent.
    pub fn current(&self) -> Result<Option<u32>> {
        let Some(raw) = self.store.get(PERSONAL_BEST_KEY)? else {
            return Ok(None);
        };

        match raw.trim().parse::<u32>() {
            Ok(best) => Ok(Some(best)),
            Err(e) => {
                warn!(value = %raw, error = %e, "ignoring unreadable personal best");
                Ok(None)
            }
        }
    }

    /// Receives the new best every time one is written.
    pub fn subscribe(&mut self) -> Receiver<u32> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Compare a finished run against the stored best and persist it if higher.
    pub fn record(&mut self, wpm: u32) -> Result<BestOutcome> {
        let outcome = match self.current()? {
            None => BestOutcome::Baseline { wpm },
            Some(best) if wpm > best => BestOutcome::NewBest {
                wpm,
                previous: best,
            },
            Some(best) => BestOutcome::NotBeaten { wpm, best },
        };

        if outcome.is_write() {
            self.store.set(PERSONAL_BEST_KEY, &wpm.to_string())?;
            info!(wpm, ?outcome, "personal best updated");
            self.notify(wpm);
        }

        Ok(outcome)
    }

    fn notify(&mut self, wpm: u32) {
        // drop subscribers whose receiver has gone away
        self.subscribers.retain(|tx| tx.send(wpm).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn memory_best() -> PersonalBest {
        PersonalBest::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_first_run_sets_baseline() {
        let mut best = memory_best();
        let rx = best.subscribe();

        let outcome = best.record(40).unwrap();

        assert_matches!(outcome, BestOutcome::Baseline { wpm: 40 });
        assert_eq!(best.current().unwrap(), Some(40));
        assert_eq!(rx.try_recv().unwrap(), 40);
    }

    #[test]
    fn test_slower_run_does_not_write() {
        let mut store = MemoryStore::new();
        store.set(PERSONAL_BEST_KEY, "50").unwrap();
        let mut best = PersonalBest::new(Box::new(store));
        let rx = best.subscribe();

        let outcome = best.record(30).unwrap();

        assert_matches!(outcome, BestOutcome::NotBeaten { wpm: 30, best: 50 });
        assert_eq!(best.current().unwrap(), Some(50));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_equal_run_does_not_write() {
        let mut best = memory_best();
        best.record(50).unwrap();
        let rx = best.subscribe();

        assert_matches!(best.record(50).unwrap(), BestOutcome::NotBeaten { .. });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_faster_run_overwrites() {
        let mut best = memory_best();
        best.record(50).unwrap();
        let rx = best.subscribe();

        let outcome = best.record(62).unwrap();

        assert_matches!(
            outcome,
            BestOutcome::NewBest {
                wpm: 62,
                previous: 50
            }
        );
        assert_eq!(best.current().unwrap(), Some(62));
        assert_eq!(rx.try_recv().unwrap(), 62);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut best = memory_best();
        let rx = best.subscribe();
        drop(rx);
        let live = best.subscribe();

        best.record(10).unwrap();

        assert_eq!(best.subscribers.len(), 1);
        assert_eq!(live.try_recv().unwrap(), 10);
    }

    #[test]
    fn test_garbage_value_treated_as_absent() {
        let mut store = MemoryStore::new();
        store.set(PERSONAL_BEST_KEY, "fast").unwrap();
        let mut best = PersonalBest::new(Box::new(store));

        assert_eq!(best.current().unwrap(), None);
        assert_matches!(best.record(12).unwrap(), BestOutcome::Baseline { wpm: 12 });
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("best.json");
        let mut store = FileStore::with_path(&path);

        assert_eq!(store.get(PERSONAL_BEST_KEY).unwrap(), None);
        store.set(PERSONAL_BEST_KEY, "71").unwrap();
        store.set("other", "x").unwrap();

        let reopened = FileStore::with_path(&path);
        assert_eq!(
            reopened.get(PERSONAL_BEST_KEY).unwrap().as_deref(),
            Some("71")
        );
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = FileStore::with_path(&path);

        assert_eq!(store.get(PERSONAL_BEST_KEY).unwrap(), None);
    }

    #[test]
    fn test_truncated_file_is_rewritten_by_next_best() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best.json");
        std::fs::write(&path, br#"{"typing-personal-best": "4"#).unwrap();

        let mut best = PersonalBest::new(Box::new(FileStore::with_path(&path)));
        assert_eq!(best.current().unwrap(), None);
        assert_matches!(best.record(38).unwrap(), BestOutcome::Baseline { wpm: 38 });

        let reopened = FileStore::with_path(&path);
        assert_eq!(
            reopened.get(PERSONAL_BEST_KEY).unwrap().as_deref(),
            Some("38")
        );
    }

    #[test]
    fn test_personal_best_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best.json");

        let mut first = PersonalBest::new(Box::new(FileStore::with_path(&path)));
        first.record(45).unwrap();

        let mut second = PersonalBest::new(Box::new(FileStore::with_path(&path)));
        assert_eq!(second.current().unwrap(), Some(45));
        assert_matches!(
            second.record(44).unwrap(),
            BestOutcome::NotBeaten { wpm: 44, best: 45 }
        );
    }
}
