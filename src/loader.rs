//! Read the case extract and aggregate it into a [`DailySeries`].
//!
//! Processing order:
//! 1. decode every row (a malformed date fails the whole load),
//! 2. drop imported cases,
//! 3. keep allow-listed regions only,
//! 4. relabel legacy sub-regions when a split is configured,
//! 5. sum per (date, displayed label).

use crate::config::{DashboardConfig, LegacySplit};
use crate::models::{CaseRecord, RawRecord, columns, parse_date};
use crate::series::DailySeries;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Startup failures. Any of these aborts the process.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("row {row}: {source}")]
    Csv {
        row: u64,
        #[source]
        source: csv::Error,
    },
    #[error("missing column {0:?}")]
    MissingColumn(&'static str),
    #[error("row {row}: malformed date {value:?}")]
    BadDate { row: u64, value: String },
    #[error("no domestic cases left for the configured regions")]
    Empty,
}

/// Counters reported after a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    pub imported: usize,
    pub outside_regions: usize,
    pub relabeled: usize,
}

/// Parse and aggregate the file at `path`.
pub fn load_daily_series<P: AsRef<Path>>(
    path: P,
    config: &DashboardConfig,
) -> Result<DailySeries, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let (series, stats) = aggregate(read_records(file)?, config)?;
    log::info!(
        "loaded {}: {} rows, {} imported dropped, {} outside regions, {} relabeled, {} daily rows ({})",
        path.display(),
        stats.rows,
        stats.imported,
        stats.outside_regions,
        stats.relabeled,
        series.len(),
        series.extent()
    );
    Ok(series)
}

/// Decode every row of a CSV stream.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<CaseRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|source| LoadError::Csv { row: 1, source })?
        .clone();
    if let Some(missing) = columns::REQUIRED
        .iter()
        .find(|c| !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == **c))
    {
        return Err(LoadError::MissingColumn(*missing));
    }
    let mut out = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRecord>().enumerate() {
        // header is line 1
        let row = idx as u64 + 2;
        let raw = result.map_err(|source| LoadError::Csv { row, source })?;
        let date = parse_date(&raw.date).ok_or_else(|| LoadError::BadDate {
            row,
            value: raw.date.clone(),
        })?;
        out.push(CaseRecord {
            date,
            region: raw.region,
            sub_region: raw.sub_region,
            imported: raw.imported,
            cases: raw.cases,
        });
    }
    Ok(out)
}

/// Filter, relabel and sum decoded rows.
pub fn aggregate(
    records: Vec<CaseRecord>,
    config: &DashboardConfig,
) -> Result<(DailySeries, LoadStats), LoadError> {
    let legacy = config.active_legacy();
    let mut stats = LoadStats {
        rows: records.len(),
        ..LoadStats::default()
    };
    let mut rows: Vec<(NaiveDate, String, u64)> = Vec::with_capacity(records.len());
    let mut per_label: BTreeMap<String, u64> = BTreeMap::new();

    for rec in records {
        if rec.imported {
            stats.imported += 1;
            continue;
        }
        if !config.allows_region(&rec.region) {
            stats.outside_regions += 1;
            continue;
        }
        for label in display_labels(&rec, legacy) {
            if legacy.is_some_and(|l| l.label == label) {
                stats.relabeled += 1;
            }
            *per_label.entry(label.clone()).or_default() += rec.cases;
            rows.push((rec.date, label, rec.cases));
        }
    }

    for (label, total) in &per_label {
        log::debug!("{label}: {total} cases");
    }

    let series = DailySeries::from_rows(rows).ok_or(LoadError::Empty)?;
    Ok((series, stats))
}

/// Labels a record is counted under.
///
/// Without a split this is the raw region. With a split, legacy rows carry the
/// legacy label and, when the parent keeps its full total, the raw region too.
fn display_labels(rec: &CaseRecord, legacy: Option<&LegacySplit>) -> Vec<String> {
    match legacy {
        Some(split) if split.matches(&rec.region, &rec.sub_region) => {
            if split.parent_includes_legacy {
                vec![rec.region.clone(), split.label.clone()]
            } else {
                vec![split.label.clone()]
            }
        }
        _ => vec![rec.region.clone()],
    }
}
