//! One CSV file per table.

use anyhow::{Context, Result};
use extractor::{Table, TableSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header row of column names, then every row rendered as plain text.
/// Nulls become empty fields.
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(&table.columns)
        .with_context(|| format!("Failed to write header of {}", table.name))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|value| value.render()))
            .with_context(|| format!("Failed to write row of {}", table.name))?;
    }
    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// Write every non-empty table as `<dir>/<name>.csv`.
pub fn write_tables(dir: &Path, tables: &TableSet) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for table in tables.non_empty() {
        let path = dir.join(format!("{}.csv", table.name));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_table(file, table)?;
        debug!(path = %path.display(), rows = table.len(), "wrote csv");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extractor::Value;
    use pretty_assertions::assert_eq;

    fn cost_table() -> Table {
        let mut table = Table::new(
            "tb_t_monthly_cost",
            &["id", "cost_type", "monthly_amount_musd", "cumulative_amount_musd"],
        );
        table.push(vec![
            Value::Int(1),
            Value::from("FGRS_RCE"),
            Value::Float(12.5),
            Value::Null,
        ]);
        table.push(vec![
            Value::Int(2),
            Value::from("LOGI, RCE"),
            Value::Float(0.000001),
            Value::Float(3.0),
        ]);
        table
    }

    #[test]
    fn test_write_table() {
        let mut out = Vec::new();
        write_table(&mut out, &cost_table()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,cost_type,monthly_amount_musd,cumulative_amount_musd\n\
             1,FGRS_RCE,12.5,\n\
             2,\"LOGI, RCE\",0.000001,3.0\n"
        );
    }

    #[test]
    fn test_empty_tables_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut tables = TableSet::new();
        tables.insert(cost_table());
        tables.insert(Table::new("tb_t_variation_order", &["vo_id"]));

        let written = write_tables(dir.path(), &tables).unwrap();
        assert_eq!(written, vec![dir.path().join("tb_t_monthly_cost.csv")]);
        assert!(!dir.path().join("tb_t_variation_order.csv").exists());
    }
}
