//! Ranking dataset loading.
//!
//! The dataset is a single CSV file read wholesale into memory:
//! - one row per (player, snapshot) pair
//! - empty cells are preserved as nulls
//! - the raw bytes are fingerprinted for cache keying

mod loader;

pub use loader::*;

use std::path::PathBuf;
use thiserror::Error;

use crate::models::{DatasetId, PlayerRecord};

/// Errors that make a source unusable.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Data file not found: {0}")]
    NotFound(PathBuf),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Data source is empty (no header row)")]
    Empty,
}

/// A loaded dataset: every snapshot plus the fingerprint of its source.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,
    pub records: Vec<PlayerRecord>,
    pub source: Option<PathBuf>,
}

impl Dataset {
    /// Wrap records built in code. The id covers every field of every record.
    pub fn from_records(records: Vec<PlayerRecord>) -> Self {
        let keys: Vec<String> = records.iter().map(|r| format!("{:?}", r)).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        Self {
            id: DatasetId::from_fields(&refs),
            records,
            source: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LastUpdated, RatingKind};

    #[test]
    fn test_missing_columns_message() {
        let err = LoadError::MissingColumns(vec!["rank".into(), "lastupdated".into()]);
        assert_eq!(err.to_string(), "Missing required columns: rank, lastupdated");
    }

    #[test]
    fn test_from_records_id_tracks_content() {
        let a = Dataset::from_records(vec![PlayerRecord::new("A", LastUpdated::raw("01/01/2024"))]);
        let b = Dataset::from_records(vec![PlayerRecord::new("A", LastUpdated::raw("01/02/2024"))]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.len(), 1);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_from_records_id_covers_every_field() {
        let base = || PlayerRecord::new("A", LastUpdated::raw("01/14/2024"));
        let ids: Vec<DatasetId> = [
            base(),
            base().with_country("USA"),
            base().with_title("GM"),
            base().with_rank(3),
            base().with_rating(RatingKind::Classical, 2700.0),
            base().with_rating(RatingKind::Classical, 2900.0),
            base().with_rating(RatingKind::Blitz, 2700.0),
        ]
        .into_iter()
        .map(|r| Dataset::from_records(vec![r]).id)
        .collect();

        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            Dataset::from_records(vec![base().with_rank(3)]).id,
            Dataset::from_records(vec![base().with_rank(3)]).id
        );
    }
}
