//! Reader for the contract evolution workbook: one line item per row, with
//! the original contract and each amendment side by side.

use crate::grid::Grid;
use serde::Serialize;
use tracing::info;

pub const SOURCE_NAME: &str = "contract_evolution";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionLayout {
    pub row_no_column: usize,
    pub description_column: usize,
    pub first_amount_column: usize,
    /// Original contract plus each amendment.
    pub amount_columns: usize,
}

impl Default for EvolutionLayout {
    fn default() -> Self {
        Self {
            row_no_column: 1,
            description_column: 2,
            first_amount_column: 3,
            amount_columns: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionLine {
    pub excel_row: usize,
    pub row_no: Option<String>,
    pub description: String,
    /// One entry per amount column; `None` where the cell is blank or text.
    pub amounts: Vec<Option<f64>>,
}

impl EvolutionLine {
    pub fn row_no(&self) -> &str {
        self.row_no.as_deref().unwrap_or("")
    }

    pub fn description_contains(&self, needle: &str) -> bool {
        self.description
            .to_uppercase()
            .contains(&needle.to_uppercase())
    }
}

/// Every row with a non-blank description.
pub fn read(grid: &Grid, layout: &EvolutionLayout) -> Vec<EvolutionLine> {
    let lines: Vec<EvolutionLine> = (0..grid.height())
        .filter_map(|row| {
            let description = grid.label(row, layout.description_column)?;
            let amounts = (0..layout.amount_columns)
                .map(|i| grid.number(row, layout.first_amount_column + i))
                .collect();
            Some(EvolutionLine {
                excel_row: row + 1,
                row_no: grid.label(row, layout.row_no_column),
                description,
                amounts,
            })
        })
        .collect();

    info!(lines = lines.len(), "read contract evolution");
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellValue;

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    const E: CellValue = CellValue::Empty;

    #[test]
    fn test_reads_rows_with_description() {
        let grid = Grid::new(vec![
            vec![E, E, t("Description"), t("Original"), t("AMD-1")],
            vec![E, t("A"), t("EPC LUMP SUM"), n(100.0), n(110.0), E, n(130.0)],
            vec![],
            vec![E, n(1.0), t("  Engineering  "), n(40.0), t("-")],
            vec![E, t("X"), E, n(5.0)],
        ]);
        let lines = read(&grid, &EvolutionLayout::default());

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].row_no(), "A");
        assert_eq!(lines[1].excel_row, 2);
        assert_eq!(
            lines[1].amounts,
            vec![Some(100.0), Some(110.0), None, Some(130.0), None, None]
        );
        assert_eq!(lines[2].row_no(), "1");
        assert_eq!(lines[2].description, "Engineering");
        assert_eq!(lines[2].amounts[1], None);
    }

    #[test]
    fn test_description_contains_ignores_case() {
        let line = EvolutionLine {
            excel_row: 1,
            row_no: None,
            description: "Revised Contract Price".into(),
            amounts: vec![],
        };
        assert!(line.description_contains("REVISED CONTRACT"));
        assert!(!line.description_contains("BACKCHARGE"));
        assert_eq!(line.row_no(), "");
    }
}
