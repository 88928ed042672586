//! Memoized freshness resolution.
//!
//! Resolution is the expensive step and its input only changes when the source
//! file does, so results are kept per (dataset fingerprint, run date). A new
//! day is a miss since distances are measured from the run date.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::DatasetId;
use crate::resolve::{resolve, Resolution};
use crate::storage::{load_path, Dataset, LoadError};

/// Single-entry memo of the last resolution.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entry: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

#[derive(Debug)]
struct CacheEntry {
    dataset: DatasetId,
    run_date: NaiveDate,
    resolution: Arc<Resolution>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached resolution for this dataset and date, computing it on a miss.
    pub fn get_or_resolve(&mut self, dataset: &Dataset, run_date: NaiveDate) -> Arc<Resolution> {
        if let Some(entry) = &self.entry {
            if entry.dataset == dataset.id && entry.run_date == run_date {
                self.hits += 1;
                debug!("Resolution cache hit for dataset {}", dataset.id);
                return Arc::clone(&entry.resolution);
            }
        }

        self.misses += 1;
        let resolution = Arc::new(resolve(&dataset.records, run_date));
        self.entry = Some(CacheEntry {
            dataset: dataset.id.clone(),
            run_date,
            resolution: Arc::clone(&resolution),
        });
        resolution
    }

    /// Drop the memoized result.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            info!("Resolution cache invalidated");
        }
    }

    pub fn is_cached(&self, dataset: &DatasetId, run_date: NaiveDate) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| &e.dataset == dataset && e.run_date == run_date)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// File metadata used to notice edits without rehashing on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Everything a view needs: the raw dataset and its resolution.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub dataset: Arc<Dataset>,
    pub resolution: Arc<Resolution>,
}

/// Outcome of an explicit reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadOutcome {
    pub dataset_id: DatasetId,
    pub records: usize,
    pub players: usize,
    /// Whether the fingerprint differs from the previous load
    pub changed: bool,
}

/// The loaded source file plus its resolution cache.
#[derive(Debug)]
pub struct DatasetStore {
    path: Option<PathBuf>,
    stamp: Option<FileStamp>,
    dataset: Arc<Dataset>,
    cache: ResolutionCache,
}

impl DatasetStore {
    /// Load the file at `path`. Fails if it cannot be loaded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let path = path.into();
        let dataset = load_path(&path)?;
        Ok(Self {
            stamp: FileStamp::read(&path),
            path: Some(path),
            dataset: Arc::new(dataset),
            cache: ResolutionCache::new(),
        })
    }

    /// Serve a fixed in-memory dataset; it never reloads.
    pub fn in_memory(dataset: Dataset) -> Self {
        Self {
            path: None,
            stamp: None,
            dataset: Arc::new(dataset),
            cache: ResolutionCache::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset)
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Current dataset and resolution for `run_date`.
    ///
    /// If the file on disk changed since it was loaded it is reloaded first.
    /// A failed reload keeps serving the previous dataset, and the broken file
    /// is not retried until it changes again.
    pub fn snapshot(&mut self, run_date: NaiveDate) -> Snapshot {
        if self.is_stale() {
            let seen = self.path.as_deref().and_then(FileStamp::read);
            if let Err(e) = self.reload(run_date) {
                warn!("Source changed but reload failed, keeping previous data: {}", e);
                self.stamp = seen;
            }
        }

        Snapshot {
            dataset: Arc::clone(&self.dataset),
            resolution: self.cache.get_or_resolve(&self.dataset, run_date),
        }
    }

    fn is_stale(&self) -> bool {
        match &self.path {
            Some(path) => FileStamp::read(path) != self.stamp,
            None => false,
        }
    }

    /// Re-read the source unconditionally. The cache is invalidated when the
    /// fingerprint changed.
    pub fn reload(&mut self, run_date: NaiveDate) -> Result<ReloadOutcome, LoadError> {
        let Some(path) = self.path.clone() else {
            return Ok(self.outcome(run_date, false));
        };

        let stamp = FileStamp::read(&path);
        let dataset = load_path(&path)?;
        let changed = dataset.id != self.dataset.id;
        if changed {
            info!(
                "Dataset changed: {} -> {}",
                self.dataset.id, dataset.id
            );
            self.cache.invalidate();
        }

        self.stamp = stamp;
        self.dataset = Arc::new(dataset);

        Ok(self.outcome(run_date, changed))
    }

    fn outcome(&mut self, run_date: NaiveDate, changed: bool) -> ReloadOutcome {
        let resolution = self.cache.get_or_resolve(&self.dataset, run_date);
        ReloadOutcome {
            dataset_id: self.dataset.id.clone(),
            records: self.dataset.len(),
            players: resolution.len(),
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LastUpdated, PlayerRecord, RatingKind};

    const HEADER: &str =
        "name,country,title,rank,classicalrating,rapidrating,blitzrating,lastupdated\n";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            PlayerRecord::new("A", LastUpdated::raw("01/10/2024")),
            PlayerRecord::new("A", LastUpdated::raw("01/14/2024")),
        ])
    }

    #[test]
    fn test_hit_returns_same_arc() {
        let ds = dataset();
        let mut cache = ResolutionCache::new();

        let first = cache.get_or_resolve(&ds, day(15));
        let second = cache.get_or_resolve(&ds, day(15));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert!(cache.is_cached(&ds.id, day(15)));
    }

    #[test]
    fn test_new_run_date_is_miss() {
        let ds = dataset();
        let mut cache = ResolutionCache::new();

        let first = cache.get_or_resolve(&ds, day(15));
        let next_day = cache.get_or_resolve(&ds, day(16));

        assert!(!Arc::ptr_eq(&first, &next_day));
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let ds = dataset();
        let mut cache = ResolutionCache::new();

        let first = cache.get_or_resolve(&ds, day(15));
        cache.invalidate();
        assert!(!cache.is_cached(&ds.id, day(15)));

        let second = cache.get_or_resolve(&ds, day(15));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.players, second.players);
    }

    #[test]
    fn test_datasets_differing_only_in_rating_are_not_shared() {
        let with_rating = |rating: f64| {
            Dataset::from_records(vec![PlayerRecord::new("A", LastUpdated::raw("01/14/2024"))
                .with_rating(RatingKind::Classical, rating)])
        };
        let a = with_rating(2700.0);
        let b = with_rating(2900.0);
        assert_ne!(a.id, b.id);

        let mut cache = ResolutionCache::new();
        let first = cache.get_or_resolve(&a, day(15));
        let second = cache.get_or_resolve(&b, day(15));

        assert_eq!(first.players[0].rating(RatingKind::Classical), Some(2700.0));
        assert_eq!(second.players[0].rating(RatingKind::Classical), Some(2900.0));
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_store_reload_detects_change() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Ranking.csv");
        fs::write(&path, format!("{}A,USA,GM,1,2700,2700,2700,01/14/2024\n", HEADER)).unwrap();

        let mut store = DatasetStore::open(&path).unwrap();
        let before = store.snapshot(day(15));
        assert_eq!(before.resolution.len(), 1);

        let unchanged = store.reload(day(15)).unwrap();
        assert!(!unchanged.changed);
        assert!(Arc::ptr_eq(&before.resolution, &store.snapshot(day(15)).resolution));

        fs::write(
            &path,
            format!(
                "{}A,USA,GM,1,2700,2700,2700,01/14/2024\nB,NOR,GM,2,2800,2800,2800,01/15/2024\n",
                HEADER
            ),
        )
        .unwrap();

        let outcome = store.reload(day(15)).unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.records, 2);
        assert_eq!(outcome.players, 2);

        let after = store.snapshot(day(15));
        assert_eq!(after.resolution.len(), 2);
        assert!(!Arc::ptr_eq(&before.resolution, &after.resolution));
    }

    #[test]
    fn test_snapshot_picks_up_file_edit() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Ranking.csv");
        fs::write(&path, format!("{}A,USA,GM,1,2700,2700,2700,01/14/2024\n", HEADER)).unwrap();

        let mut store = DatasetStore::open(&path).unwrap();
        assert_eq!(store.snapshot(day(15)).resolution.len(), 1);

        // Different length guarantees a new stamp even on coarse mtime clocks.
        fs::write(
            &path,
            format!(
                "{}A,USA,GM,1,2700,2700,2700,01/14/2024\nLonger Name,NOR,GM,2,2800,2800,2800,01/15/2024\n",
                HEADER
            ),
        )
        .unwrap();

        assert_eq!(store.snapshot(day(15)).resolution.len(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Ranking.csv");
        fs::write(&path, format!("{}A,USA,GM,1,2700,2700,2700,01/14/2024\n", HEADER)).unwrap();

        let mut store = DatasetStore::open(&path).unwrap();
        fs::write(&path, "name,rank\nA,1\n").unwrap();

        assert!(matches!(store.reload(day(15)), Err(LoadError::MissingColumns(_))));
        assert_eq!(store.snapshot(day(15)).resolution.len(), 1);
    }

    #[test]
    fn test_broken_file_not_retried_until_changed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Ranking.csv");
        fs::write(&path, format!("{}A,USA,GM,1,2700,2700,2700,01/14/2024\n", HEADER)).unwrap();

        let mut store = DatasetStore::open(&path).unwrap();
        fs::write(&path, "name,rank\nA,1\n").unwrap();
        assert!(store.is_stale());

        assert_eq!(store.snapshot(day(15)).resolution.len(), 1);
        assert!(!store.is_stale());
        assert_eq!(store.snapshot(day(15)).resolution.len(), 1);

        fs::write(
            &path,
            format!(
                "{}A,USA,GM,1,2700,2700,2700,01/14/2024\nB,NOR,GM,2,2800,2800,2800,01/15/2024\n",
                HEADER
            ),
        )
        .unwrap();
        assert!(store.is_stale());
        assert_eq!(store.snapshot(day(15)).resolution.len(), 2);
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = DatasetStore::in_memory(dataset());
        let snap = store.snapshot(day(15));
        assert_eq!(snap.dataset.len(), 2);
        assert_eq!(snap.resolution.len(), 1);
        assert!(!store.reload(day(15)).unwrap().changed);
    }
}
