//! Row types for the aggregate summary CSVs.

use serde::{Deserialize, Serialize};

/// One row of `by_rider.csv`: ridership per rider category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderSummary {
    pub rider_type: String,
    pub rides: u64,
    pub avg_duration_min: f64,
    pub median_duration_min: f64,
}

/// One row of `by_day_user.csv`: ridership per weekday and rider category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRiderSummary {
    pub day_of_week: String,
    pub rider_type: String,
    pub rides: u64,
}

/// One row of `by_month_user.csv`: ridership per calendar month and rider
/// category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthRiderSummary {
    pub month: String,
    pub rider_type: String,
    pub rides: u64,
}

/// One row of `by_hour_user.csv`: ridership per start hour and rider
/// category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourRiderSummary {
    pub hour: u32,
    pub rider_type: String,
    pub rides: u64,
}

/// One row of `by_bike.csv`: ridership per vehicle type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BikeSummary {
    pub rideable_type: String,
    pub rides: u64,
    pub avg_duration_min: f64,
    pub median_duration_min: f64,
}
