//! Cleansing and referential-integrity checks over the normalized tables.

use crate::error::{Diagnostics, Warning};
use crate::tables::{TableSet, Value};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

/// Decimal places kept for monthly cost amounts.
pub const COST_DECIMALS: i32 = 6;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanseReport {
    pub trimmed: usize,
    pub rounded: usize,
}

/// Trim every text value and round monthly cost amounts.
pub fn cleanse(tables: &mut TableSet) -> CleanseReport {
    let mut report = CleanseReport::default();

    for table in tables.iter_mut() {
        for value in table.rows.iter_mut().flat_map(|row| row.iter_mut()) {
            if let Value::Text(text) = value {
                let trimmed = text.trim();
                if trimmed.len() != text.len() {
                    *text = trimmed.to_string();
                    report.trimmed += 1;
                }
            }
        }
    }

    if let Some(table) = tables.get_mut("tb_t_monthly_cost") {
        let columns: Vec<usize> = ["monthly_amount_musd", "cumulative_amount_musd"]
            .iter()
            .filter_map(|c| table.column_index(c))
            .collect();
        for row in &mut table.rows {
            for &col in &columns {
                if let Some(Value::Float(f)) = row.get_mut(col) {
                    let rounded = round_to(*f, COST_DECIMALS);
                    if rounded != *f {
                        *f = rounded;
                        report.rounded += 1;
                    }
                }
            }
        }
    }

    info!(trimmed = report.trimmed, rounded = report.rounded, "cleansed tables");
    report
}

/// A foreign key checked by [`check_integrity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub referenced_table: &'static str,
    pub referenced_column: &'static str,
}

pub const FOREIGN_KEYS: [ForeignKey; 6] = [
    ForeignKey {
        table: "tb_t_contract_value",
        column: "amendment_id",
        referenced_table: "tb_m_amendment",
        referenced_column: "amendment_id",
    },
    ForeignKey {
        table: "tb_t_contract_value",
        column: "cost_category_id",
        referenced_table: "tb_m_cost_category",
        referenced_column: "category_id",
    },
    ForeignKey {
        table: "tb_t_pamf_claim",
        column: "discipline_id",
        referenced_table: "tb_m_cost_discipline",
        referenced_column: "discipline_id",
    },
    ForeignKey {
        table: "tb_t_variation_order",
        column: "approved_in_amendment",
        referenced_table: "tb_m_amendment",
        referenced_column: "amendment_id",
    },
    ForeignKey {
        table: "tb_t_subcontractor_monthly",
        column: "subcontractor_id",
        referenced_table: "tb_m_subcontractor",
        referenced_column: "subcontractor_id",
    },
    ForeignKey {
        table: "tb_t_project_progress",
        column: "subcontractor_id",
        referenced_table: "tb_m_subcontractor",
        referenced_column: "subcontractor_id",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceCheck {
    pub table: String,
    pub column: String,
    pub referenced: String,
    /// Distinct non-null ids in the referencing column.
    pub distinct: usize,
    pub orphaned: Vec<i64>,
}

impl ReferenceCheck {
    pub fn is_ok(&self) -> bool {
        self.orphaned.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub references: Vec<ReferenceCheck>,
    /// Contract value rows below zero; backcharges are expected here.
    pub negative_contract_values: usize,
    /// Sum of level-0 claim amounts.
    pub pamf_level0_total: f64,
}

impl IntegrityReport {
    pub fn orphan_count(&self) -> usize {
        self.references.iter().map(|r| r.orphaned.len()).sum()
    }
}

fn ids(tables: &TableSet, table: &str, column: &str) -> Option<BTreeSet<i64>> {
    tables
        .get(table)
        .map(|t| t.column(column).filter_map(Value::as_int).collect())
}

/// Orphans are reported as warnings and never fail the run. Keys whose
/// tables are absent or empty are skipped.
pub fn check_integrity(tables: &TableSet, diagnostics: &mut Diagnostics) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for key in &FOREIGN_KEYS {
        let Some(referencing) = ids(tables, key.table, key.column) else {
            continue;
        };
        if tables.get(key.table).is_some_and(|t| t.is_empty()) {
            continue;
        }
        let referenced = ids(tables, key.referenced_table, key.referenced_column).unwrap_or_default();
        let orphaned: Vec<i64> = referencing.difference(&referenced).copied().collect();

        if !orphaned.is_empty() {
            diagnostics.warn(Warning::OrphanedReference {
                table: key.table.to_string(),
                column: key.column.to_string(),
                referenced: key.referenced_table.to_string(),
                count: orphaned.len(),
                values: orphaned.clone(),
            });
        }
        info!(
            table = key.table,
            column = key.column,
            distinct = referencing.len(),
            orphaned = orphaned.len(),
            "checked foreign key"
        );
        report.references.push(ReferenceCheck {
            table: key.table.to_string(),
            column: key.column.to_string(),
            referenced: key.referenced_table.to_string(),
            distinct: referencing.len(),
            orphaned,
        });
    }

    if let Some(table) = tables.get("tb_t_contract_value") {
        report.negative_contract_values = table
            .column("amount_usd")
            .filter_map(Value::as_f64)
            .filter(|v| *v < 0.0)
            .count();
    }

    if let Some(table) = tables.get("tb_t_pamf_claim") {
        if let (Some(level), Some(amount)) = (
            table.column_index("level"),
            table.column_index("claim_amount_usd"),
        ) {
            report.pamf_level0_total = table
                .rows
                .iter()
                .filter(|row| row.get(level).and_then(Value::as_int) == Some(0))
                .filter_map(|row| row.get(amount).and_then(Value::as_f64))
                .sum();
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Table;

    fn table(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        let mut table = Table::new(name, columns);
        for row in rows {
            table.push(row);
        }
        table
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 6), 1.234568);
        assert_eq!(round_to(-0.0000004, 6), -0.0);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_cleanse_trims_and_rounds() {
        let mut tables = TableSet::new();
        tables.insert(table(
            "tb_t_monthly_cost",
            &["id", "cost_type", "monthly_amount_musd", "cumulative_amount_musd"],
            vec![vec![
                Value::Int(1),
                Value::from(" FGRS_RCE "),
                Value::Float(0.123456789),
                Value::Null,
            ]],
        ));
        let report = cleanse(&mut tables);

        assert_eq!(report, CleanseReport { trimmed: 1, rounded: 1 });
        let row = &tables.get("tb_t_monthly_cost").unwrap().rows[0];
        assert_eq!(row[1], Value::from("FGRS_RCE"));
        assert_eq!(row[2], Value::Float(0.123457));
    }

    #[test]
    fn test_orphans_are_warnings() {
        let mut tables = TableSet::new();
        tables.insert(table(
            "tb_m_amendment",
            &["amendment_id"],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        ));
        tables.insert(table("tb_m_cost_category", &["category_id"], vec![vec![Value::Int(1)]]));
        tables.insert(table(
            "tb_t_contract_value",
            &["id", "amendment_id", "cost_category_id", "amount_usd"],
            vec![
                vec![Value::Int(1), Value::Int(1), Value::Int(1), Value::Float(-5.0)],
                vec![Value::Int(2), Value::Int(7), Value::Int(1), Value::Float(5.0)],
                vec![Value::Int(3), Value::Int(7), Value::Int(1), Value::Null],
            ],
        ));

        let mut diagnostics = Diagnostics::new();
        let report = check_integrity(&tables, &mut diagnostics);

        assert_eq!(report.references.len(), 2);
        assert_eq!(report.references[0].orphaned, vec![7]);
        assert!(report.references[1].is_ok());
        assert_eq!(report.orphan_count(), 1);
        assert_eq!(report.negative_contract_values, 1);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_pamf_level0_total() {
        let mut tables = TableSet::new();
        tables.insert(table(
            "tb_t_pamf_claim",
            &["id", "level", "claim_amount_usd"],
            vec![
                vec![Value::Int(1), Value::Int(0), Value::Float(10.0)],
                vec![Value::Int(2), Value::Int(1), Value::Float(4.0)],
                vec![Value::Int(3), Value::Int(0), Value::Float(2.5)],
            ],
        ));
        let report = check_integrity(&tables, &mut Diagnostics::new());
        assert_eq!(report.pamf_level0_total, 12.5);
    }
}
