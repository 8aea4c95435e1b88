//! Column-to-period mapping for merged year/month header bands.
//!
//! The year row is sparse: a year is written once above the first of its
//! columns and every following blank cell inherits it. The month row below
//! holds either a month number or a free-text rollup label such as `1 - 12`.

use crate::grid::{cell_ref, CellValue, Grid};
use serde::Serialize;
use std::collections::BTreeMap;

/// Month part of a period. Numeric months are monthly columns; text labels
/// are multi-month aggregate columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Month {
    Monthly(u32),
    Aggregate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: Month,
}

impl Period {
    pub fn monthly(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Month::Monthly(month),
        }
    }

    pub fn aggregate(year: i32, label: impl Into<String>) -> Self {
        Self {
            year,
            month: Month::Aggregate(label.into()),
        }
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self.month, Month::Monthly(_))
    }

    pub fn month_number(&self) -> Option<u32> {
        match self.month {
            Month::Monthly(m) => Some(m),
            Month::Aggregate(_) => None,
        }
    }
}

/// Which rows of the sheet carry the header band (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRows {
    pub year_row: usize,
    pub month_row: usize,
}

impl Default for HeaderRows {
    fn default() -> Self {
        Self {
            year_row: 0,
            month_row: 2,
        }
    }
}

impl HeaderRows {
    /// First row below the header band.
    pub fn body_start(&self) -> usize {
        self.year_row.max(self.month_row) + 1
    }
}

/// A header cell that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIssue {
    pub cell: String,
    pub detail: String,
}

/// Column index → period, ordered by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPeriodMap {
    periods: BTreeMap<usize, Period>,
}

impl ColumnPeriodMap {
    /// Scan the header band left to right, threading the current year
    /// through the fold. Malformed cells are reported and skipped; they
    /// never reset the forward-filled year.
    pub fn build(grid: &Grid, header: HeaderRows) -> (Self, Vec<HeaderIssue>) {
        let (_, periods, issues) = (0..grid.width()).fold(
            (None, BTreeMap::new(), Vec::new()),
            |(current_year, mut periods, mut issues), col| {
                let current_year = match year_of(grid.value(header.year_row, col)) {
                    Ok(Some(year)) => Some(year),
                    Ok(None) => current_year,
                    Err(detail) => {
                        issues.push(HeaderIssue {
                            cell: cell_ref(header.year_row, col),
                            detail,
                        });
                        current_year
                    }
                };

                if let Some(year) = current_year {
                    match month_of(grid.value(header.month_row, col)) {
                        Ok(Some(month)) => {
                            periods.insert(col, Period { year, month });
                        }
                        Ok(None) => {}
                        Err(detail) => issues.push(HeaderIssue {
                            cell: cell_ref(header.month_row, col),
                            detail,
                        }),
                    }
                }

                (current_year, periods, issues)
            },
        );

        (Self { periods }, issues)
    }

    pub fn get(&self, col: usize) -> Option<&Period> {
        self.periods.get(&col)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Period)> {
        self.periods.iter().map(|(col, period)| (*col, period))
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn monthly_columns(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, period)| period.is_monthly())
            .map(|(col, _)| col)
            .collect()
    }

    pub fn aggregate_columns(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, period)| !period.is_monthly())
            .map(|(col, _)| col)
            .collect()
    }

    /// Earliest and latest monthly `(year, month)`.
    pub fn monthly_span(&self) -> Option<((i32, u32), (i32, u32))> {
        let mut months = self
            .periods
            .values()
            .filter_map(|p| p.month_number().map(|m| (p.year, m)));
        let first = months.next()?;
        Some(months.fold((first, first), |(lo, hi), ym| (lo.min(ym), hi.max(ym))))
    }
}

/// `Ok(None)` for blank cells, `Err` for text that is not a year.
fn year_of(cell: &CellValue) -> Result<Option<i32>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Number(n) if n.is_finite() => Ok(Some(n.trunc() as i32)),
        CellValue::Number(n) => Err(format!("year value {} is not finite", n)),
        CellValue::Date(_) => Err(format!("year cell holds the date {}", date_label(cell))),
        CellValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i32>()
                .map(Some)
                .map_err(|_| format!("year text '{}' is not an integer", text))
        }
    }
}

fn month_of(cell: &CellValue) -> Result<Option<Month>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Date(_) => Err(format!("month cell holds the date {}", date_label(cell))),
        CellValue::Number(n) => {
            let month = n.trunc();
            if (1.0..=12.0).contains(&month) {
                Ok(Some(Month::Monthly(month as u32)))
            } else {
                Err(format!("month number {} outside 1..=12", n))
            }
        }
        CellValue::Text(text) => {
            let text = text.trim();
            Ok((!text.is_empty()).then(|| Month::Aggregate(text.to_string())))
        }
    }
}

fn date_label(cell: &CellValue) -> String {
    cell.label().unwrap_or_default()
}
