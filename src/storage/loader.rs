//! CSV record loader.

use std::fs;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use super::{Dataset, LoadError};
use crate::models::{DatasetId, LastUpdated, PlayerRecord};

/// Columns every source must carry. Matched case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "name",
    "country",
    "title",
    "rank",
    "classicalrating",
    "rapidrating",
    "blitzrating",
    "lastupdated",
];

/// Cell values treated as null in addition to the empty string.
const NULL_TOKENS: [&str; 5] = ["nan", "na", "n/a", "null", "none"];

struct ColumnIndices {
    name: usize,
    country: usize,
    title: usize,
    rank: usize,
    classical: usize,
    rapid: usize,
    blitz: usize,
    lastupdated: usize,
}

fn find_required_columns(headers: &StringRecord) -> Result<ColumnIndices, LoadError> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |name: &str| normalized.iter().position(|h| h == name);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| find(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    // All present, checked above.
    let idx = |name: &str| find(name).unwrap_or_default();
    Ok(ColumnIndices {
        name: idx("name"),
        country: idx("country"),
        title: idx("title"),
        rank: idx("rank"),
        classical: idx("classicalrating"),
        rapid: idx("rapidrating"),
        blitz: idx("blitzrating"),
        lastupdated: idx("lastupdated"),
    })
}

/// Load a dataset from a CSV file on disk.
pub fn load_path(path: &Path) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let mut dataset = load_bytes(&bytes)?;
    dataset.source = Some(path.to_path_buf());

    info!(
        "Loaded {} records from {:?} (dataset {})",
        dataset.len(),
        path,
        dataset.id
    );
    Ok(dataset)
}

/// Load a dataset from any reader.
pub fn load_reader<R: Read>(mut reader: R) -> Result<Dataset, LoadError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    load_bytes(&bytes)
}

/// Load a dataset from in-memory CSV bytes.
pub fn load_bytes(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let id = DatasetId::from_bytes(bytes);
    let records = parse_records(bytes)?;
    Ok(Dataset {
        id,
        records,
        source: None,
    })
}

fn parse_records(bytes: &[u8]) -> Result<Vec<PlayerRecord>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty);
    }
    let cols = find_required_columns(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let Some(name) = cell(&row, cols.name) else {
            warn!("Skipping line {}: empty player name", line);
            continue;
        };

        records.push(PlayerRecord {
            name: name.to_string(),
            country: cell(&row, cols.country).map(str::to_string),
            title: cell(&row, cols.title).map(str::to_string),
            rank: cell(&row, cols.rank).and_then(|v| parse_rank(v, line)),
            classicalrating: cell(&row, cols.classical)
                .and_then(|v| parse_rating(v, "classicalrating", line)),
            rapidrating: cell(&row, cols.rapid).and_then(|v| parse_rating(v, "rapidrating", line)),
            blitzrating: cell(&row, cols.blitz).and_then(|v| parse_rating(v, "blitzrating", line)),
            lastupdated: LastUpdated::Raw(cell(&row, cols.lastupdated).unwrap_or("").to_string()),
        });
    }

    debug!("Parsed {} CSV rows", records.len());
    Ok(records)
}

/// Non-null cell value. Short rows yield null for the missing cells.
fn cell(row: &StringRecord, idx: usize) -> Option<&str> {
    let value = row.get(idx)?.trim();
    if value.is_empty() || NULL_TOKENS.contains(&value.to_lowercase().as_str()) {
        None
    } else {
        Some(value)
    }
}

fn parse_rank(value: &str, line: u64) -> Option<u32> {
    if let Ok(rank) = value.parse::<u32>() {
        return Some(rank);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        _ => {
            warn!("Line {}: unparseable rank '{}', treating as null", line, value);
            None
        }
    }
}

fn parse_rating(value: &str, column: &str, line: u64) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(f),
        _ => {
            warn!(
                "Line {}: unparseable {} '{}', treating as null",
                line, column, value
            );
            None
        }
    }
}
