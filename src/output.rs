//! Output helpers shared by the pipeline stages.
//!
//! Supports typed CSV summary writing and JSON stats logging.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Writes serde-serializable rows to a CSV file with a header row, creating
/// parent directories as needed.
pub fn write_summary<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }

    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "Summary written");
    Ok(())
}

/// Logs a stage's stats record as single-line JSON.
pub fn log_json(stage: &str, value: &impl Serialize) -> Result<()> {
    info!(stage, stats = %serde_json::to_string(value)?, "Stage stats");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[derive(Serialize)]
    struct Row {
        name: String,
        rides: u64,
    }

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_write_summary_creates_file_with_header() {
        let path = temp_path("bikeshare_reporter_test_summary.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        let rows = vec![
            Row {
                name: "member".into(),
                rides: 3,
            },
            Row {
                name: "casual".into(),
                rides: 1,
            },
        ];
        write_summary(Path::new(&path), &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name,rides");
        assert_eq!(lines[1], "member,3");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_summary_creates_parent_directories() {
        let dir = temp_path("bikeshare_reporter_test_summary_dir");
        let _ = fs::remove_dir_all(&dir);

        let path = format!("{dir}/nested/out.csv");
        write_summary(
            Path::new(&path),
            &[Row {
                name: "m".into(),
                rides: 1,
            }],
        )
        .unwrap();
        assert!(Path::new(&path).exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_log_json_does_not_panic() {
        log_json(
            "test",
            &Row {
                name: "member".into(),
                rides: 2,
            },
        )
        .unwrap();
    }
}
