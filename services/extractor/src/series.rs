//! Row → time series.

use crate::grid::Grid;
use crate::period::{ColumnPeriodMap, Month};

/// Which period kinds an extraction reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    #[default]
    MonthlyOnly,
    IncludeAggregate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub year: i32,
    pub month: Month,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn monthly(year: i32, month: u32, value: f64) -> Self {
        Self {
            year,
            month: Month::Monthly(month),
            value,
        }
    }

    pub fn month_number(&self) -> Option<u32> {
        match self.month {
            Month::Monthly(m) => Some(m),
            Month::Aggregate(_) => None,
        }
    }
}

/// One point per mapped column of the requested kind holding a numeric
/// cell, in column order. Blank and text cells yield nothing; there is no
/// zero-fill.
pub fn extract_row(
    grid: &Grid,
    row: usize,
    periods: &ColumnPeriodMap,
    mode: ExtractMode,
) -> Vec<TimeSeriesPoint> {
    periods
        .iter()
        .filter(|(_, period)| mode == ExtractMode::IncludeAggregate || period.is_monthly())
        .filter_map(|(col, period)| {
            grid.number(row, col).map(|value| TimeSeriesPoint {
                year: period.year,
                month: period.month.clone(),
                value,
            })
        })
        .collect()
}

/// Sort by `(year, month)`; monthly points precede a year's aggregates.
pub fn sort_chronologically(points: &mut [TimeSeriesPoint]) {
    points.sort_by(|a, b| (a.year, &a.month).cmp(&(b.year, &b.month)));
}
