//! Ingest stage: combines a directory of monthly CSV extracts into a single
//! table, tagging every row with the file it came from.

use crate::table::{Table, read_table, write_table};
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Provenance column appended to every ingested row.
pub const SOURCE_FILE_COLUMN: &str = "_source_file";

/// Counters reported by the ingest stage.
#[derive(Debug, Default, Serialize)]
pub struct IngestStats {
    pub files: usize,
    pub rows: usize,
    pub columns: usize,
}

/// Reads every `*.csv` file in `input_dir` (sorted filename order),
/// concatenates them into one table with a [`SOURCE_FILE_COLUMN`] provenance
/// tag, and writes the result to `output`.
///
/// Column sets need not match across files; the combined header is the
/// union, with empty cells where a file lacks a column.
///
/// # Errors
///
/// Fails if the directory contains no CSV files, or on any unreadable file.
pub fn combine_directory(input_dir: &Path, output: &Path) -> Result<IngestStats> {
    let files = list_csv_files(input_dir)?;
    if files.is_empty() {
        bail!("no CSV files found in {}", input_dir.display());
    }

    let mut combined = Table::default();
    for path in &files {
        let table = read_table(path)?;
        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        info!(file = %source_name, rows = table.rows.len(), "Ingested file");
        merge_into(&mut combined, &table, &source_name);
    }

    write_table(output, &combined)?;

    let stats = IngestStats {
        files: files.len(),
        rows: combined.rows.len(),
        columns: combined.headers.len(),
    };
    info!(
        files = stats.files,
        rows = stats.rows,
        columns = stats.columns,
        output = %output.display(),
        "Ingest complete"
    );
    crate::output::log_json("ingest", &stats)?;
    Ok(stats)
}

fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }

    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// Appends `file`'s rows to `combined`, extending the combined header with
/// any columns not seen before and stamping the provenance column.
fn merge_into(combined: &mut Table, file: &Table, source_name: &str) {
    let mut column_map = Vec::with_capacity(file.headers.len());
    for header in &file.headers {
        column_map.push(ensure_column(combined, header));
    }
    let source_idx = ensure_column(combined, SOURCE_FILE_COLUMN);

    for row in &file.rows {
        let mut out = vec![String::new(); combined.headers.len()];
        for (value, &idx) in row.iter().zip(&column_map) {
            out[idx] = value.clone();
        }
        out[source_idx] = source_name.to_string();
        combined.rows.push(out);
    }
}

fn ensure_column(table: &mut Table, name: &str) -> usize {
    match table.column(name) {
        Some(idx) => idx,
        None => {
            table.headers.push(name.to_string());
            for row in &mut table.rows {
                row.push(String::new());
            }
            table.headers.len() - 1
        }
    }
}
