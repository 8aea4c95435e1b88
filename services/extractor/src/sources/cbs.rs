//! Reader for the cost breakdown structure workbook, a PAMF claim pivot
//! whose tree lives in the indentation of column A.

use crate::grid::Grid;
use crate::hierarchy::{self, HierarchyConfig, HierarchyRecord, HierarchyRow};
use tracing::info;

pub const SOURCE_NAME: &str = "cost_breakdown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbsLayout {
    pub label_column: usize,
    pub count_column: usize,
    pub amount_column: usize,
    pub hierarchy: HierarchyConfig,
}

impl Default for CbsLayout {
    fn default() -> Self {
        Self {
            label_column: 0,
            count_column: 1,
            amount_column: 2,
            hierarchy: HierarchyConfig::default(),
        }
    }
}

pub fn read(grid: &Grid, layout: &CbsLayout) -> Vec<HierarchyRecord> {
    let rows = (0..grid.height()).filter_map(|row| {
        Some(HierarchyRow {
            excel_row: row + 1,
            label: grid.label(row, layout.label_column)?,
            indent: grid.indent(row, layout.label_column),
            count: grid.number(row, layout.count_column),
            amount: grid.number(row, layout.amount_column),
        })
    });
    let records = hierarchy::build(rows, &layout.hierarchy);

    let deepest = records.iter().map(|r| r.level).max().unwrap_or(0);
    info!(records = records.len(), deepest_level = deepest, "read cost breakdown");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellValue;
    use std::collections::HashMap;

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_indent_drives_levels() {
        let mut indents = HashMap::new();
        indents.insert((2, 0), 1u8);
        indents.insert((3, 0), 2u8);
        let grid = Grid::new(vec![
            vec![t("Row Labels"), t("Count of PAMF"), t("Sum of PAMF Claim Amount")],
            vec![t("COVID"), n(10.0), n(1000.0)],
            vec![t("Direct"), n(6.0), n(600.0)],
            vec![t("Medical"), n(2.0), n(200.0)],
            vec![t("Grand Total"), n(10.0), n(1000.0)],
        ])
        .with_indents(indents);

        let records = read(&grid, &CbsLayout::default());

        assert_eq!(records.len(), 4);
        assert_eq!(records[2].level, 2);
        assert_eq!(records[2].category.as_deref(), Some("Direct"));
        assert_eq!(records[2].amount, Some(200.0));
        assert_eq!(records[2].excel_row, 4);
        assert!(records[3].is_total());
    }

    #[test]
    fn test_without_indents_everything_is_level_zero() {
        let grid = Grid::new(vec![vec![t("COVID"), n(1.0)], vec![t("Direct"), n(1.0)]]);
        let records = read(&grid, &CbsLayout::default());
        assert!(records.iter().all(|r| r.level == 0 && r.category.is_none()));
    }
}
