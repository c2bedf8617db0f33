//! In-memory CSV tables with a dynamic column set.
//!
//! The ingest and clean stages operate on whatever columns the monthly
//! extracts happen to carry, so rows are kept as plain strings keyed by a
//! shared header. Missing cells are empty strings.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// A CSV file held fully in memory: one header row plus string cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of a column by exact header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value at (row, column). Rows are padded on read, so this is
    /// total for any index pair inside the table's dimensions.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    /// Sets a column's values, replacing it if the header already exists or
    /// appending it otherwise. `values` must have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        assert_eq!(values.len(), self.rows.len());
        match self.column(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Keeps only the rows whose index passes `keep`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        assert_eq!(keep.len(), self.rows.len());
        let mut it = keep.iter().copied();
        self.rows.retain(|_| it.next().unwrap_or(false));
    }
}

/// Reads a CSV file into a [`Table`].
///
/// The file is decoded as strict UTF-8 first; if any byte sequence is
/// invalid, the whole file is re-decoded as Latin-1 instead of failing.
/// Short rows are padded with empty cells and long rows truncated to the
/// header width.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), "Not valid UTF-8, falling back to Latin-1");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("parse record #{} of {}", i + 1, path.display()))?;
        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), columns = headers.len(), "Table loaded");
    Ok(Table { headers, rows })
}

/// Writes a [`Table`] to a CSV file, creating parent directories as needed.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = table.rows.len(), "Table written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_round_trip() {
        let path = temp_path("bikeshare_reporter_table_round_trip.csv");
        let table = Table {
            headers: vec!["a".into(), "b".into()],
            rows: vec![
                vec!["1".into(), "x".into()],
                vec!["2".into(), String::new()],
            ],
        };

        write_table(&path, &table).unwrap();
        let back = read_table(&path).unwrap();

        assert_eq!(back.headers, table.headers);
        assert_eq!(back.rows, table.rows);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_latin1_fallback() {
        let path = temp_path("bikeshare_reporter_table_latin1.csv");
        // "café" with a raw Latin-1 0xE9, invalid as UTF-8
        fs::write(&path, b"name\ncaf\xe9\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0][0], "café");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_short_rows_are_padded() {
        let path = temp_path("bikeshare_reporter_table_padded.csv");
        fs::write(&path, "a,b,c\n1,2\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_set_column_replaces_existing() {
        let mut table = Table {
            headers: vec!["a".into()],
            rows: vec![vec!["1".into()], vec!["2".into()]],
        };

        table.set_column("a", vec!["x".into(), "y".into()]);
        assert_eq!(table.headers, vec!["a"]);
        assert_eq!(table.rows, vec![vec!["x"], vec!["y"]]);

        table.set_column("b", vec!["3".into(), "4".into()]);
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows[0], vec!["x", "3"]);
    }

    #[test]
    fn test_retain_rows() {
        let mut table = Table {
            headers: vec!["a".into()],
            rows: vec![vec!["1".into()], vec!["2".into()], vec!["3".into()]],
        };

        table.retain_rows(&[true, false, true]);
        assert_eq!(table.rows, vec![vec!["1"], vec!["3"]]);
    }
}
