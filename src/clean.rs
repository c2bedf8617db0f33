//! Clean stage: normalizes the combined table, derives per-ride attributes,
//! and filters out invalid or duplicate rows.

use crate::table::{Table, read_table, write_table};
use anyhow::Result;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Candidate names for the start-timestamp column, in lookup order.
const START_CANDIDATES: &[&str] = &["started_at", "start_time", "starttime", "start_date"];
/// Candidate names for the end-timestamp column, in lookup order.
const END_CANDIDATES: &[&str] = &["ended_at", "end_time", "stoptime", "end_date"];
/// Candidate names for the rider-category column, in lookup order.
const RIDER_CANDIDATES: &[&str] = &["member_casual", "usertype", "user_type", "rider_type"];
/// Candidate names for the ride-identifier column, in lookup order.
const ID_CANDIDATES: &[&str] = &["ride_id", "trip_id", "id"];
/// Candidate names for the vehicle-type column, in lookup order.
const BIKE_CANDIDATES: &[&str] = &["rideable_type", "bike_type"];

/// Timestamp formats tried in order when parsing start/end columns.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Longest ride kept, in minutes (24 hours).
const MAX_RIDE_MINUTES: f64 = 1440.0;

/// Canonical output format for `started_at`/`ended_at`.
const CANONICAL_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Per-filter counters reported by the clean stage.
#[derive(Debug, Default, Serialize)]
pub struct CleanStats {
    pub rows_in: usize,
    pub missing_duration: usize,
    pub negative_duration: usize,
    pub over_one_day: usize,
    pub duplicate_id: usize,
    pub rows_out: usize,
}

/// Runs the clean stage on `input`, writing the filtered, enriched table to
/// `output`.
pub fn clean_file(input: &Path, output: &Path) -> Result<CleanStats> {
    let table = read_table(input)?;
    let (cleaned, stats) = clean_table(table);
    write_table(output, &cleaned)?;
    crate::output::log_json("clean", &stats)?;
    Ok(stats)
}

/// Applies all cleaning rules to an in-memory table.
///
/// Header names are normalized, start/end timestamps parsed into canonical
/// `started_at`/`ended_at` columns, duration and calendar features derived,
/// and rows filtered: missing duration, negative duration, duration over
/// 24 hours, then duplicate ride identifiers (first occurrence kept).
///
/// Missing optional columns never fail the stage: with no rider-category
/// candidate the `rider_type` column is emitted all-missing, and with a
/// missing timestamp column the duration filter drops every row.
pub fn clean_table(mut table: Table) -> (Table, CleanStats) {
    let mut stats = CleanStats {
        rows_in: table.rows.len(),
        ..Default::default()
    };

    for header in &mut table.headers {
        *header = normalize_header(header);
    }

    let start_idx = find_column(&table, START_CANDIDATES);
    let end_idx = find_column(&table, END_CANDIDATES);

    let started = parse_timestamp_column(&table, start_idx);
    let ended = parse_timestamp_column(&table, end_idx);

    let durations: Vec<Option<f64>> = started
        .iter()
        .zip(&ended)
        .map(|(s, e)| match (s, e) {
            (Some(s), Some(e)) => Some((*e - *s).num_seconds() as f64 / 60.0),
            _ => None,
        })
        .collect();

    rewrite_timestamp_column(&mut table, start_idx, "started_at", &started);
    rewrite_timestamp_column(&mut table, end_idx, "ended_at", &ended);

    match find_column(&table, RIDER_CANDIDATES) {
        Some(idx) => {
            table.headers[idx] = "rider_type".to_string();
            for row in &mut table.rows {
                row[idx] = row[idx].trim().to_lowercase();
            }
        }
        None => {
            warn!(
                candidates = ?RIDER_CANDIDATES,
                "No rider-category column found, rider_type will be all-missing"
            );
            let empties = vec![String::new(); table.rows.len()];
            table.set_column("rider_type", empties);
        }
    }

    if let Some(idx) = find_column(&table, BIKE_CANDIDATES) {
        table.headers[idx] = "rideable_type".to_string();
    }

    if start_idx.is_some() && end_idx.is_some() {
        let formatted = durations
            .iter()
            .map(|d| d.map(|v| format!("{v:.2}")).unwrap_or_default())
            .collect();
        table.set_column("ride_length_min", formatted);
    }
    if start_idx.is_some() {
        table.set_column("day_of_week", map_started(&started, |s| s.format("%A").to_string()));
        table.set_column("month", map_started(&started, |s| s.format("%Y-%m").to_string()));
        table.set_column("hour", map_started(&started, |s| s.hour().to_string()));
    }

    let id_idx = find_column(&table, ID_CANDIDATES);
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(table.rows.len());
    for (i, duration) in durations.iter().enumerate() {
        let retained = match duration {
            None => {
                stats.missing_duration += 1;
                false
            }
            Some(d) if *d < 0.0 => {
                stats.negative_duration += 1;
                false
            }
            Some(d) if *d > MAX_RIDE_MINUTES => {
                stats.over_one_day += 1;
                false
            }
            Some(_) => match id_idx {
                Some(idx) if !table.cell(i, idx).is_empty() => {
                    let fresh = seen_ids.insert(table.cell(i, idx).to_string());
                    if !fresh {
                        stats.duplicate_id += 1;
                    }
                    fresh
                }
                _ => true,
            },
        };
        keep.push(retained);
    }

    table.retain_rows(&keep);
    stats.rows_out = table.rows.len();

    info!(
        rows_in = stats.rows_in,
        rows_out = stats.rows_out,
        dropped = stats.rows_in - stats.rows_out,
        "Clean complete"
    );
    (table, stats)
}

/// Lower-cases a header, trims it, and replaces spaces with underscores.
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// First present candidate wins; candidate order matters.
fn find_column(table: &Table, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|name| table.column(name))
}

/// Parses one timestamp value, trying each format in order. Unparseable or
/// empty values yield `None`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn parse_timestamp_column(table: &Table, idx: Option<usize>) -> Vec<Option<NaiveDateTime>> {
    match idx {
        Some(idx) => (0..table.rows.len())
            .map(|row| parse_timestamp(table.cell(row, idx)))
            .collect(),
        None => vec![None; table.rows.len()],
    }
}

/// Renames the located timestamp column to its canonical name and rewrites
/// the values in canonical format (unparseable values become empty).
fn rewrite_timestamp_column(
    table: &mut Table,
    idx: Option<usize>,
    canonical: &str,
    parsed: &[Option<NaiveDateTime>],
) {
    if let Some(idx) = idx {
        table.headers[idx] = canonical.to_string();
        for (row, value) in table.rows.iter_mut().zip(parsed) {
            row[idx] = value
                .map(|ts| ts.format(CANONICAL_TIMESTAMP).to_string())
                .unwrap_or_default();
        }
    }
}

fn map_started(
    started: &[Option<NaiveDateTime>],
    f: impl Fn(&NaiveDateTime) -> String,
) -> Vec<String> {
    started
        .iter()
        .map(|s| s.as_ref().map(&f).unwrap_or_default())
        .collect()
}
