//! Run summary, written as `run_summary.json` and printed at the end of a run.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use extractor::{CleanseReport, Diagnostics, IntegrityReport, Normalized, TableStats, Warning};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: NaiveDateTime,
    pub raw_data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub tables: Vec<TableStats>,
    pub raw_tables: Vec<TableStats>,
    /// Tables with no rows; none of their files are written.
    pub empty_tables: Vec<String>,
    pub warnings: Vec<Warning>,
    pub cleanse: CleanseReport,
    pub integrity: IntegrityReport,
    pub files: Vec<PathBuf>,
}

impl RunSummary {
    pub fn new(
        generated_at: NaiveDateTime,
        normalized: &Normalized,
        diagnostics: &Diagnostics,
        cleanse: CleanseReport,
        integrity: IntegrityReport,
    ) -> Self {
        Self {
            generated_at,
            raw_data_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            dry_run: false,
            tables: normalized.tables.iter().map(|t| t.stats()).collect(),
            raw_tables: normalized.raw.iter().map(|t| t.stats()).collect(),
            empty_tables: normalized.tables.empty_names(),
            warnings: diagnostics.warnings().to_vec(),
            cleanse,
            integrity,
            files: Vec::new(),
        }
    }

    pub fn directories(mut self, raw_data_dir: &Path, output_dir: &Path) -> Self {
        self.raw_data_dir = raw_data_dir.to_path_buf();
        self.output_dir = output_dir.to_path_buf();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Warning counts keyed by kind, e.g. `missing_anchor`.
    pub fn warning_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for warning in &self.warnings {
            *counts.entry(warning_kind(warning)).or_insert(0) += 1;
        }
        counts
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "\n=== Tables ===");
        for stats in &self.tables {
            let _ = writeln!(
                out,
                "  {:<28} {:>6} rows x {:>2} cols  ({} nulls)",
                stats.name, stats.rows, stats.columns, stats.nulls
            );
        }
        if !self.empty_tables.is_empty() {
            let _ = writeln!(out, "  Empty (not emitted): {}", self.empty_tables.join(", "));
        }

        let _ = writeln!(out, "\n=== Raw extractions ===");
        for stats in &self.raw_tables {
            let _ = writeln!(out, "  {:<28} {:>6} rows", stats.name, stats.rows);
        }

        let _ = writeln!(out, "\n=== Warnings ({}) ===", self.warnings.len());
        for (kind, count) in self.warning_counts() {
            let _ = writeln!(out, "  {}: {}", kind, count);
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "  - {}", warning);
        }

        let _ = writeln!(out, "\n=== Integrity ===");
        for check in &self.integrity.references {
            let status = if check.is_ok() { "OK" } else { "ORPHANS" };
            let _ = writeln!(
                out,
                "  {}.{} -> {}: {} ({} distinct, {} orphaned)",
                check.table,
                check.column,
                check.referenced,
                status,
                check.distinct,
                check.orphaned.len()
            );
        }
        let _ = writeln!(
            out,
            "  Negative contract values: {}",
            self.integrity.negative_contract_values
        );
        let _ = writeln!(
            out,
            "  PAMF level-0 total: {:.2} USD",
            self.integrity.pamf_level0_total
        );
        let _ = writeln!(
            out,
            "  Cleansing: {} values trimmed, {} amounts rounded",
            self.cleanse.trimmed, self.cleanse.rounded
        );

        if !self.files.is_empty() {
            let _ = writeln!(out, "\n=== Files ({}) ===", self.files.len());
            for file in &self.files {
                let _ = writeln!(out, "  {}", file.display());
            }
        }
        out
    }
}

fn warning_kind(warning: &Warning) -> &'static str {
    match warning {
        Warning::MissingAnchor { .. } => "missing_anchor",
        Warning::EmptySection { .. } => "empty_section",
        Warning::FallbackAnchor { .. } => "fallback_anchor",
        Warning::MalformedHeader { .. } => "malformed_header",
        Warning::UnclassifiedMetric { .. } => "unclassified_metric",
        Warning::IndentUnavailable { .. } => "indent_unavailable",
        Warning::OrphanedReference { .. } => "orphaned_reference",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use extractor::{Table, TableSet, Value};

    fn summary() -> RunSummary {
        let mut tables = TableSet::new();
        let mut project = Table::new("tb_m_project", &["project_id", "actual_end_date"]);
        project.push(vec![Value::Int(1), Value::Null]);
        tables.insert(project);
        tables.insert(Table::new("tb_t_variation_order", &["vo_id"]));

        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(Warning::MissingAnchor {
            source_name: "timeline".into(),
            section: "Penta".into(),
        });
        diagnostics.warn(Warning::MissingAnchor {
            source_name: "timeline".into(),
            section: "Daewoo".into(),
        });
        diagnostics.warn(Warning::UnclassifiedMetric {
            source_name: "timeline".into(),
            row: 40,
            label: "Remarks".into(),
        });

        let normalized = Normalized {
            tables,
            raw: TableSet::new(),
        };
        RunSummary::new(
            NaiveDate::from_ymd_opt(2024, 7, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            &normalized,
            &diagnostics,
            CleanseReport::default(),
            IntegrityReport::default(),
        )
        .directories(Path::new("raw_data"), Path::new("output"))
    }

    #[test]
    fn test_summary_collects_stats() {
        let summary = summary();
        assert_eq!(summary.tables.len(), 2);
        assert_eq!(summary.tables[0].nulls, 1);
        assert_eq!(summary.empty_tables, vec!["tb_t_variation_order".to_string()]);

        let counts = summary.warning_counts();
        assert_eq!(counts.get("missing_anchor"), Some(&2));
        assert_eq!(counts.get("unclassified_metric"), Some(&1));
    }

    #[test]
    fn test_render_mentions_empty_tables_and_warnings() {
        let text = summary().render();
        assert!(text.contains("Empty (not emitted): tb_t_variation_order"));
        assert!(text.contains("=== Warnings (3) ==="));
        assert!(text.contains("section 'Penta' not found"));
    }

    #[test]
    fn test_json_is_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        summary().write_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["warnings"][0]["kind"], "missing_anchor");
        assert_eq!(json["tables"][0]["name"], "tb_m_project");
        assert_eq!(json["generated_at"], "2024-07-15T08:00:00");
    }
}
