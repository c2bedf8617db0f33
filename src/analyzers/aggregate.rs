//! Builds the ridership summary tables from a cleaned trip table.

use crate::analyzers::types::{
    BikeSummary, DayRiderSummary, HourRiderSummary, MonthRiderSummary, RiderSummary,
};
use crate::analyzers::utility::{mean, median};
use crate::table::Table;
use std::collections::BTreeMap;

/// All aggregate tables produced by a single pass over the cleaned data.
#[derive(Debug, Default)]
pub struct SummaryTables {
    pub by_rider: Vec<RiderSummary>,
    pub by_day_user: Vec<DayRiderSummary>,
    pub by_month_user: Vec<MonthRiderSummary>,
    pub by_hour_user: Vec<HourRiderSummary>,
    pub by_bike: Vec<BikeSummary>,
}

#[derive(Default)]
struct DurationGroup {
    rides: u64,
    durations: Vec<f64>,
}

/// Groups the cleaned table into the five summary tables. Rows with an empty
/// value in a grouping column are excluded from that grouping only; a table
/// whose columns are absent comes back empty.
///
/// Group keys are emitted in sorted order, so output is deterministic for a
/// given input.
pub fn summarize(table: &Table) -> SummaryTables {
    let rider_col = table.column("rider_type");
    let day_col = table.column("day_of_week");
    let month_col = table.column("month");
    let hour_col = table.column("hour");
    let bike_col = table.column("rideable_type");
    let duration_col = table.column("ride_length_min");

    let mut rider_groups: BTreeMap<String, DurationGroup> = BTreeMap::new();
    let mut bike_groups: BTreeMap<String, DurationGroup> = BTreeMap::new();
    let mut day_counts: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut month_counts: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut hour_counts: BTreeMap<(u32, String), u64> = BTreeMap::new();

    for row in 0..table.rows.len() {
        let rider = rider_col.map(|c| table.cell(row, c)).unwrap_or_default();
        let duration = duration_col.and_then(|c| table.cell(row, c).parse::<f64>().ok());

        if !rider.is_empty() {
            let group = rider_groups.entry(rider.to_string()).or_default();
            group.rides += 1;
            if let Some(minutes) = duration {
                group.durations.push(minutes);
            }

            if let Some(day_col) = day_col {
                let day = table.cell(row, day_col);
                if !day.is_empty() {
                    *day_counts
                        .entry((day.to_string(), rider.to_string()))
                        .or_default() += 1;
                }
            }
            if let Some(month_col) = month_col {
                let month = table.cell(row, month_col);
                if !month.is_empty() {
                    *month_counts
                        .entry((month.to_string(), rider.to_string()))
                        .or_default() += 1;
                }
            }
            if let Some(hour_col) = hour_col {
                if let Ok(hour) = table.cell(row, hour_col).parse::<u32>() {
                    *hour_counts.entry((hour, rider.to_string())).or_default() += 1;
                }
            }
        }

        if let Some(bike_col) = bike_col {
            let value = table.cell(row, bike_col);
            if !value.is_empty() {
                let group = bike_groups.entry(value.to_string()).or_default();
                group.rides += 1;
                if let Some(minutes) = duration {
                    group.durations.push(minutes);
                }
            }
        }
    }

    SummaryTables {
        by_rider: rider_groups
            .into_iter()
            .map(|(rider_type, group)| RiderSummary {
                rider_type,
                rides: group.rides,
                avg_duration_min: mean(&group.durations),
                median_duration_min: median(&group.durations),
            })
            .collect(),
        by_day_user: day_counts
            .into_iter()
            .map(|((day_of_week, rider_type), rides)| DayRiderSummary {
                day_of_week,
                rider_type,
                rides,
            })
            .collect(),
        by_month_user: month_counts
            .into_iter()
            .map(|((month, rider_type), rides)| MonthRiderSummary {
                month,
                rider_type,
                rides,
            })
            .collect(),
        by_hour_user: hour_counts
            .into_iter()
            .map(|((hour, rider_type), rides)| HourRiderSummary {
                hour,
                rider_type,
                rides,
            })
            .collect(),
        by_bike: bike_groups
            .into_iter()
            .map(|(rideable_type, group)| BikeSummary {
                rideable_type,
                rides: group.rides,
                avg_duration_min: mean(&group.durations),
                median_duration_min: median(&group.durations),
            })
            .collect(),
    }
}
