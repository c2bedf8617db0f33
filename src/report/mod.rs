//! Report stage: renders the aggregate tables into a standalone bar chart
//! image and a multi-page PDF report.

mod charts;
mod pdf;

use crate::analyzers::analyzer::{BY_DAY_USER_FILE, BY_MONTH_USER_FILE, BY_RIDER_FILE};
use crate::analyzers::types::{DayRiderSummary, MonthRiderSummary, RiderSummary};
use crate::output::log_json;
use anyhow::{Context, Result, bail};
use plotters::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::info;

/// Counters reported by the report stage.
#[derive(Debug, Default, Serialize)]
pub struct ReportStats {
    pub chart: String,
    pub pages: usize,
}

/// Reads the required summary CSVs from `summary_dir` and writes the bar
/// chart PNG to `chart_path` plus a three-page PDF (bar chart, weekday
/// heatmap, monthly lines) to `report_path`.
///
/// # Errors
///
/// Fails if any required summary file is missing or empty.
pub fn render_report(summary_dir: &Path, chart_path: &Path, report_path: &Path) -> Result<ReportStats> {
    let by_rider: Vec<RiderSummary> = load_summary(&summary_dir.join(BY_RIDER_FILE))?;
    let by_day: Vec<DayRiderSummary> = load_summary(&summary_dir.join(BY_DAY_USER_FILE))?;
    let by_month: Vec<MonthRiderSummary> = load_summary(&summary_dir.join(BY_MONTH_USER_FILE))?;
    if by_rider.is_empty() || by_day.is_empty() || by_month.is_empty() {
        bail!("summary tables in {} are empty", summary_dir.display());
    }

    if let Some(parent) = chart_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
    }
    {
        let area = BitMapBackend::new(chart_path, (pdf::PAGE_WIDTH_PX, pdf::PAGE_HEIGHT_PX))
            .into_drawing_area();
        charts::draw_avg_duration_bar(&area, &by_rider)?;
        area.present()
            .with_context(|| format!("write {}", chart_path.display()))?;
    }
    info!(chart = %chart_path.display(), "Bar chart written");

    let mut pages = Vec::with_capacity(3);

    let mut page = page_buffer();
    {
        let area = BitMapBackend::with_buffer(&mut page, (pdf::PAGE_WIDTH_PX, pdf::PAGE_HEIGHT_PX))
            .into_drawing_area();
        charts::draw_avg_duration_bar(&area, &by_rider)?;
        area.present()?;
    }
    pages.push(page);

    let mut page = page_buffer();
    {
        let area = BitMapBackend::with_buffer(&mut page, (pdf::PAGE_WIDTH_PX, pdf::PAGE_HEIGHT_PX))
            .into_drawing_area();
        charts::draw_rides_heatmap(&area, &by_day)?;
        area.present()?;
    }
    pages.push(page);

    let mut page = page_buffer();
    {
        let area = BitMapBackend::with_buffer(&mut page, (pdf::PAGE_WIDTH_PX, pdf::PAGE_HEIGHT_PX))
            .into_drawing_area();
        charts::draw_monthly_lines(&area, &by_month)?;
        area.present()?;
    }
    pages.push(page);

    pdf::write_pdf(report_path, "Bikeshare ridership report", &pages)?;

    let stats = ReportStats {
        chart: chart_path.display().to_string(),
        pages: pages.len(),
    };
    info!(
        report = %report_path.display(),
        pages = stats.pages,
        "Report complete"
    );
    log_json("report", &stats)?;
    Ok(stats)
}

/// Reads a summary CSV into its typed rows.
pub fn load_summary<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.with_context(|| format!("parse {}", path.display()))?);
    }
    Ok(rows)
}

fn page_buffer() -> Vec<u8> {
    vec![0; (pdf::PAGE_WIDTH_PX * pdf::PAGE_HEIGHT_PX * 3) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_summary_reads_typed_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("by_rider.csv");
        fs::write(
            &path,
            "rider_type,rides,avg_duration_min,median_duration_min\nmember,12,10.5,9.0\n",
        )
        .unwrap();

        let rows: Vec<RiderSummary> = load_summary(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rider_type, "member");
        assert_eq!(rows[0].rides, 12);
        assert_eq!(rows[0].avg_duration_min, 10.5);
    }

    #[test]
    fn test_load_summary_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load_summary::<RiderSummary>(&dir.path().join("absent.csv")).unwrap_err();
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn test_render_report_requires_summaries() {
        let dir = tempdir().unwrap();
        let err = render_report(
            dir.path(),
            &dir.path().join("chart.png"),
            &dir.path().join("report.pdf"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("by_rider.csv"));
    }
}
