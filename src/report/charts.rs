//! Chart drawing for the report stage.
//!
//! Each function draws one figure onto a caller-provided bitmap drawing
//! area, so the same chart can back both the standalone PNG and a PDF page.

use crate::analyzers::types::{DayRiderSummary, MonthRiderSummary, RiderSummary};
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Heatmap row order, top to bottom.
pub(crate) const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Bar chart of average ride duration per rider category.
pub(crate) fn draw_avg_duration_bar(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    rows: &[RiderSummary],
) -> Result<()> {
    area.fill(&WHITE)?;

    let y_max = rows
        .iter()
        .map(|r| r.avg_duration_min)
        .fold(0.0f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.15 } else { 1.0 };
    let labels: Vec<&str> = rows.iter().map(|r| r.rider_type.as_str()).collect();

    let mut chart = ChartBuilder::on(area)
        .caption("Average ride duration by rider type", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0i32..rows.len() as i32, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rows.len())
        .x_label_formatter(&|x| {
            labels
                .get(*x as usize)
                .map(|s| s.to_string())
                .unwrap_or_default()
        })
        .y_desc("Minutes")
        .draw()?;

    for (idx, row) in rows.iter().enumerate() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(idx as i32, 0.0), (idx as i32 + 1, row.avg_duration_min)],
            BLUE.mix(0.6).filled(),
        )))?;
    }
    Ok(())
}

/// Builds the heatmap grid: rider categories (sorted) and a 7-row matrix of
/// ride counts, `matrix[day][category]` with day 0 = Monday. Combinations
/// absent from the input stay zero; day names outside [`WEEKDAYS`] are
/// ignored.
pub(crate) fn heatmap_matrix(rows: &[DayRiderSummary]) -> (Vec<String>, Vec<Vec<u64>>) {
    let mut categories: Vec<String> = rows.iter().map(|r| r.rider_type.clone()).collect();
    categories.sort();
    categories.dedup();

    let mut matrix = vec![vec![0u64; categories.len()]; WEEKDAYS.len()];
    for row in rows {
        let day = WEEKDAYS.iter().position(|d| *d == row.day_of_week);
        let category = categories.iter().position(|c| *c == row.rider_type);
        if let (Some(day), Some(category)) = (day, category) {
            matrix[day][category] += row.rides;
        }
    }
    (categories, matrix)
}

/// Heatmap of ride counts, weekdays (Monday at the top) by rider category.
pub(crate) fn draw_rides_heatmap(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    rows: &[DayRiderSummary],
) -> Result<()> {
    area.fill(&WHITE)?;

    let (categories, matrix) = heatmap_matrix(rows);
    let max = matrix.iter().flatten().copied().max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(area)
        .caption("Rides by weekday and rider type", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(120)
        .build_cartesian_2d(0i32..categories.len() as i32, 0i32..7i32)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| categories.get(*x as usize).cloned().unwrap_or_default())
        .y_labels(WEEKDAYS.len())
        .y_label_formatter(&|y| {
            let day = 6 - *y;
            WEEKDAYS
                .get(day as usize)
                .map(|d| d.to_string())
                .unwrap_or_default()
        })
        .draw()?;

    for (day, counts) in matrix.iter().enumerate() {
        let y = 6 - day as i32;
        for (category, &rides) in counts.iter().enumerate() {
            let shade = (rides as f64 / max as f64 * 255.0).round() as u8;
            let color = RGBColor(255 - shade, 255 - shade, 255);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(category as i32, y), (category as i32 + 1, y + 1)],
                color.filled(),
            )))?;
        }
    }
    Ok(())
}

/// Aligns the monthly counts into one series per rider category, over the
/// sorted union of months. Months a category has no rides in count as zero.
pub(crate) fn monthly_series(
    rows: &[MonthRiderSummary],
) -> (Vec<String>, Vec<(String, Vec<u64>)>) {
    let mut months: Vec<String> = rows.iter().map(|r| r.month.clone()).collect();
    months.sort();
    months.dedup();

    let mut categories: Vec<String> = rows.iter().map(|r| r.rider_type.clone()).collect();
    categories.sort();
    categories.dedup();

    let series = categories
        .into_iter()
        .map(|category| {
            let counts = months
                .iter()
                .map(|month| {
                    rows.iter()
                        .filter(|r| r.month == *month && r.rider_type == category)
                        .map(|r| r.rides)
                        .sum()
                })
                .collect();
            (category, counts)
        })
        .collect();
    (months, series)
}

/// Line chart of monthly ride counts, one series per rider category.
pub(crate) fn draw_monthly_lines(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    rows: &[MonthRiderSummary],
) -> Result<()> {
    area.fill(&WHITE)?;

    let (months, series) = monthly_series(rows);
    let y_max = series
        .iter()
        .flat_map(|(_, counts)| counts)
        .copied()
        .max()
        .unwrap_or(0)
        .max(1);
    let x_max = months.len().saturating_sub(1).max(1) as i32;

    let mut chart = ChartBuilder::on(area)
        .caption("Monthly rides by rider type", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(0i32..x_max, 0u64..y_max + y_max / 10 + 1)?;

    chart
        .configure_mesh()
        .x_labels(months.len().min(12))
        .x_label_formatter(&|x| months.get(*x as usize).cloned().unwrap_or_default())
        .y_desc("Rides")
        .draw()?;

    for (idx, (category, counts)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).mix(1.0);
        let points: Vec<(i32, u64)> = counts
            .iter()
            .enumerate()
            .map(|(i, &rides)| (i as i32, rides))
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(category.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart.configure_series_labels().border_style(&BLACK).draw()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_row(day: &str, rider: &str, rides: u64) -> DayRiderSummary {
        DayRiderSummary {
            day_of_week: day.into(),
            rider_type: rider.into(),
            rides,
        }
    }

    #[test]
    fn test_heatmap_matrix_zero_fills_missing_combinations() {
        let rows = vec![
            day_row("Monday", "member", 10),
            day_row("Saturday", "casual", 5),
        ];
        let (categories, matrix) = heatmap_matrix(&rows);

        assert_eq!(categories, vec!["casual".to_string(), "member".to_string()]);
        assert_eq!(matrix.len(), 7);
        // Monday is row 0, member is column 1
        assert_eq!(matrix[0][1], 10);
        assert_eq!(matrix[0][0], 0);
        // Saturday is row 5
        assert_eq!(matrix[5][0], 5);
        assert_eq!(matrix[6][0], 0);
        assert_eq!(matrix[6][1], 0);
    }

    #[test]
    fn test_heatmap_matrix_ignores_unknown_day_names() {
        let rows = vec![day_row("Funday", "member", 3), day_row("Monday", "member", 1)];
        let (_, matrix) = heatmap_matrix(&rows);

        let total: u64 = matrix.iter().flatten().sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_monthly_series_aligns_categories_over_month_union() {
        let rows = vec![
            MonthRiderSummary {
                month: "2024-02".into(),
                rider_type: "member".into(),
                rides: 7,
            },
            MonthRiderSummary {
                month: "2024-01".into(),
                rider_type: "member".into(),
                rides: 4,
            },
            MonthRiderSummary {
                month: "2024-01".into(),
                rider_type: "casual".into(),
                rides: 2,
            },
        ];
        let (months, series) = monthly_series(&rows);

        assert_eq!(months, vec!["2024-01".to_string(), "2024-02".to_string()]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "casual");
        assert_eq!(series[0].1, vec![2, 0]);
        assert_eq!(series[1].0, "member");
        assert_eq!(series[1].1, vec![4, 7]);
    }
}
