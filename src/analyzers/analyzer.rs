//! Analyze stage: reads the cleaned table and writes one summary CSV per
//! aggregate dimension.

use crate::analyzers::aggregate::summarize;
use crate::output::{log_json, write_summary};
use crate::table::read_table;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub const BY_RIDER_FILE: &str = "by_rider.csv";
pub const BY_DAY_USER_FILE: &str = "by_day_user.csv";
pub const BY_MONTH_USER_FILE: &str = "by_month_user.csv";
pub const BY_HOUR_USER_FILE: &str = "by_hour_user.csv";
pub const BY_BIKE_FILE: &str = "by_bike.csv";

/// Counters reported by the analyze stage.
#[derive(Debug, Default, Serialize)]
pub struct AnalyzeStats {
    pub rows: usize,
    pub summaries_written: Vec<String>,
}

/// Aggregates the cleaned table at `input` and writes the non-empty summary
/// CSVs into `output_dir`. Empty aggregates (for example `by_bike.csv` when
/// the data has no vehicle column) are skipped rather than written as
/// header-only files.
pub fn analyze_file(input: &Path, output_dir: &Path) -> Result<AnalyzeStats> {
    let table = read_table(input)?;
    let summary = summarize(&table);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("create directory {}", output_dir.display()))?;

    let mut stats = AnalyzeStats {
        rows: table.rows.len(),
        ..Default::default()
    };

    write_if_any(output_dir, BY_RIDER_FILE, &summary.by_rider, &mut stats)?;
    write_if_any(
        output_dir,
        BY_DAY_USER_FILE,
        &summary.by_day_user,
        &mut stats,
    )?;
    write_if_any(
        output_dir,
        BY_MONTH_USER_FILE,
        &summary.by_month_user,
        &mut stats,
    )?;
    write_if_any(
        output_dir,
        BY_HOUR_USER_FILE,
        &summary.by_hour_user,
        &mut stats,
    )?;
    write_if_any(output_dir, BY_BIKE_FILE, &summary.by_bike, &mut stats)?;

    if stats.summaries_written.is_empty() {
        warn!(
            input = %input.display(),
            "No summaries produced; cleaned data has no usable grouping columns"
        );
    }

    info!(
        rows = stats.rows,
        summaries = stats.summaries_written.len(),
        output_dir = %output_dir.display(),
        "Analyze complete"
    );
    log_json("analyze", &stats)?;
    Ok(stats)
}

fn write_if_any<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: &[T],
    stats: &mut AnalyzeStats,
) -> Result<()> {
    if rows.is_empty() {
        debug!(file = name, "Aggregate empty; skipping");
        return Ok(());
    }
    write_summary(&dir.join(name), rows)?;
    stats.summaries_written.push(name.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_analyze_writes_expected_summaries() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("cleaned.csv");
        fs::write(
            &input,
            "rider_type,day_of_week,month,hour,rideable_type,ride_length_min\n\
             member,Monday,2024-01,8,classic_bike,10.00\n\
             casual,Saturday,2024-02,14,electric_bike,25.50\n",
        )
        .unwrap();

        let out = dir.path().join("summaries");
        let stats = analyze_file(&input, &out).unwrap();

        assert_eq!(stats.rows, 2);
        assert_eq!(stats.summaries_written.len(), 5);
        for name in [
            BY_RIDER_FILE,
            BY_DAY_USER_FILE,
            BY_MONTH_USER_FILE,
            BY_HOUR_USER_FILE,
            BY_BIKE_FILE,
        ] {
            assert!(out.join(name).exists(), "{name} missing");
        }

        let by_rider = fs::read_to_string(out.join(BY_RIDER_FILE)).unwrap();
        assert!(by_rider.starts_with("rider_type,rides,avg_duration_min,median_duration_min"));
        assert!(by_rider.contains("casual,1,25.5,25.5"));
    }

    #[test]
    fn test_empty_aggregates_are_not_written() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("cleaned.csv");
        fs::write(&input, "rider_type,ride_length_min\nmember,10.00\n").unwrap();

        let out = dir.path().join("summaries");
        let stats = analyze_file(&input, &out).unwrap();

        assert_eq!(stats.summaries_written, vec![BY_RIDER_FILE.to_string()]);
        assert!(out.join(BY_RIDER_FILE).exists());
        assert!(!out.join(BY_BIKE_FILE).exists());
        assert!(!out.join(BY_DAY_USER_FILE).exists());
    }

    #[test]
    fn test_no_grouping_columns_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("cleaned.csv");
        fs::write(&input, "ride_id\nr1\n").unwrap();

        let out = dir.path().join("summaries");
        let stats = analyze_file(&input, &out).unwrap();

        assert!(stats.summaries_written.is_empty());
        assert!(out.exists());
    }
}
