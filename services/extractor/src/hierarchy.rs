//! Indented labels → parent-linked records.
//!
//! A pivot-table export encodes its tree only through cell indentation.
//! Rows are read top-down while remembering the last label seen at levels 0
//! and 1; a deeper row inherits whatever those were. A new level-0 row
//! clears the level-1 ancestor. There is no tree validation: an orphaned
//! level-2 row simply takes the last ancestors set.

use serde::Serialize;

/// Discipline given to the grand-total record.
pub const TOTAL_DISCIPLINE: &str = "TOTAL";

/// Level given to the grand-total record.
pub const TOTAL_LEVEL: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyRow {
    /// 1-based sheet row.
    pub excel_row: usize,
    pub label: String,
    pub indent: u8,
    pub count: Option<f64>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyRecord {
    pub discipline: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub label: String,
    pub level: i32,
    pub count: Option<f64>,
    pub amount: Option<f64>,
    pub excel_row: usize,
}

impl HierarchyRecord {
    pub fn is_total(&self) -> bool {
        self.level == TOTAL_LEVEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyConfig {
    pub total_label: String,
    /// Pivot header labels that are skipped without touching ancestry.
    pub header_labels: Vec<String>,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            total_label: "Grand Total".to_string(),
            header_labels: vec![
                "Row Labels".to_string(),
                "Count of PAMF".to_string(),
                "Sum of PAMF Claim Amount".to_string(),
            ],
        }
    }
}

#[derive(Debug, Default)]
struct Ancestry {
    level0: Option<String>,
    level1: Option<String>,
}

pub fn build(
    rows: impl IntoIterator<Item = HierarchyRow>,
    config: &HierarchyConfig,
) -> Vec<HierarchyRecord> {
    let mut ancestry = Ancestry::default();
    let mut records = Vec::new();

    for row in rows {
        let label = row.label.trim();
        if label.is_empty() {
            continue;
        }

        if label == config.total_label {
            if row.count.is_some() {
                records.push(HierarchyRecord {
                    discipline: Some(TOTAL_DISCIPLINE.to_string()),
                    category: None,
                    subcategory: None,
                    label: label.to_string(),
                    level: TOTAL_LEVEL,
                    count: row.count,
                    amount: row.amount,
                    excel_row: row.excel_row,
                });
            }
            continue;
        }
        if config.header_labels.iter().any(|header| header == label) {
            continue;
        }

        let (discipline, category, subcategory) = match row.indent {
            0 => {
                ancestry.level0 = Some(label.to_string());
                ancestry.level1 = None;
                (Some(label.to_string()), None, None)
            }
            1 => {
                ancestry.level1 = Some(label.to_string());
                (ancestry.level0.clone(), Some(label.to_string()), None)
            }
            _ => (
                ancestry.level0.clone(),
                ancestry.level1.clone(),
                Some(label.to_string()),
            ),
        };

        records.push(HierarchyRecord {
            discipline,
            category,
            subcategory,
            label: label.to_string(),
            level: i32::from(row.indent),
            count: row.count,
            amount: row.amount,
            excel_row: row.excel_row,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(excel_row: usize, indent: u8, label: &str) -> HierarchyRow {
        HierarchyRow {
            excel_row,
            label: label.to_string(),
            indent,
            count: Some(1.0),
            amount: Some(100.0),
        }
    }

    fn triple(record: &HierarchyRecord) -> (Option<&str>, Option<&str>, Option<&str>) {
        (
            record.discipline.as_deref(),
            record.category.as_deref(),
            record.subcategory.as_deref(),
        )
    }

    #[test]
    fn test_covid_logistic_scenario() {
        let records = build(
            vec![
                row(1, 0, "COVID"),
                row(2, 1, "Direct"),
                row(3, 2, "Medical"),
                row(4, 0, "LOGISTIC"),
            ],
            &HierarchyConfig::default(),
        );

        let triples: Vec<_> = records.iter().map(triple).collect();
        assert_eq!(
            triples,
            vec![
                (Some("COVID"), None, None),
                (Some("COVID"), Some("Direct"), None),
                (Some("COVID"), Some("Direct"), Some("Medical")),
                (Some("LOGISTIC"), None, None),
            ]
        );
        assert_eq!(records.iter().map(|r| r.level).collect::<Vec<_>>(), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_level0_resets_level1_ancestor() {
        let records = build(
            vec![
                row(1, 0, "PMT"),
                row(2, 1, "Overhead"),
                row(3, 0, "SMT"),
                row(4, 2, "Orphan"),
            ],
            &HierarchyConfig::default(),
        );
        assert_eq!(triple(&records[3]), (Some("SMT"), None, Some("Orphan")));
    }

    #[test]
    fn test_deep_levels_do_not_move_ancestry() {
        let records = build(
            vec![
                row(1, 0, "COVID"),
                row(2, 1, "Direct"),
                row(3, 3, "Masks"),
                row(4, 2, "Medical"),
            ],
            &HierarchyConfig::default(),
        );
        assert_eq!(triple(&records[2]), (Some("COVID"), Some("Direct"), Some("Masks")));
        assert_eq!(records[2].level, 3);
        assert_eq!(triple(&records[3]), (Some("COVID"), Some("Direct"), Some("Medical")));
    }

    #[test]
    fn test_headers_and_blanks_are_skipped() {
        let records = build(
            vec![
                row(1, 0, "Row Labels"),
                row(2, 0, "COVID"),
                row(3, 0, "Count of PAMF"),
                row(4, 0, "   "),
                row(5, 1, "Direct"),
            ],
            &HierarchyConfig::default(),
        );
        assert_eq!(records.len(), 2);
        assert_eq!(triple(&records[1]), (Some("COVID"), Some("Direct"), None));
    }

    #[test]
    fn test_grand_total_needs_a_count() {
        let mut total = row(9, 0, "Grand Total");
        let with_count = build(vec![total.clone()], &HierarchyConfig::default());
        assert_eq!(with_count.len(), 1);
        assert!(with_count[0].is_total());
        assert_eq!(with_count[0].discipline.as_deref(), Some(TOTAL_DISCIPLINE));

        total.count = None;
        assert!(build(vec![total], &HierarchyConfig::default()).is_empty());
    }

    #[test]
    fn test_grand_total_does_not_touch_ancestry() {
        let records = build(
            vec![row(1, 0, "COVID"), row(2, 0, "Grand Total"), row(3, 1, "Direct")],
            &HierarchyConfig::default(),
        );
        assert_eq!(triple(&records[2]), (Some("COVID"), Some("Direct"), None));
    }
}
