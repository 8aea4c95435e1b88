//! MySQL script: DDL then batched INSERTs for every non-empty table.
//!
//! Column types are inferred from column names first and stored values
//! second, so a table always gets the same DDL for the same content.

use chrono::NaiveDateTime;
use extractor::{Table, TableSet, Value};
use std::fmt::Write as _;

pub const SCRIPT_FILE: &str = "tep_mysql_insert.sql";
pub const DEFAULT_BATCH_SIZE: usize = 50;

const RULE: &str = "-- ============================================================";
const TEXT_COLUMNS: [&str; 4] = ["description", "scope_of_work", "remarks", "scope"];
const MIN_VARCHAR: usize = 50;

/// Column type for `table.columns[index]`.
pub fn column_type(table: &Table, index: usize) -> String {
    let Some(name) = table.columns.get(index) else {
        return format!("VARCHAR({})", MIN_VARCHAR);
    };
    let name = name.to_lowercase();

    if name.ends_with("_id") {
        return if index == 0 { "INT AUTO_INCREMENT" } else { "INT" }.to_string();
    }
    if name.contains("date") {
        return "DATE".to_string();
    }
    if ["amount", "value", "usd"].iter().any(|k| name.contains(k)) {
        return "DECIMAL(18,2)".to_string();
    }
    if name.contains("progress") || name.contains("pct") {
        return "DECIMAL(10,6)".to_string();
    }

    let values = || table.rows.iter().filter_map(move |row| row.get(index));
    let stored = || values().filter(|v| !v.is_null());
    let has_stored = stored().next().is_some();
    if has_stored && stored().all(|v| matches!(v, Value::Int(_) | Value::Float(_))) {
        return if stored().any(|v| matches!(v, Value::Float(_))) {
            "DECIMAL(18,6)"
        } else {
            "INT"
        }
        .to_string();
    }
    if TEXT_COLUMNS.contains(&name.as_str()) {
        return "TEXT".to_string();
    }

    let longest = values().map(|v| v.render().chars().count()).max().unwrap_or(0);
    format!("VARCHAR({})", (longest * 3 / 2).max(MIN_VARCHAR))
}

/// `DROP` + `CREATE` with the first column as primary key.
pub fn create_table(table: &Table) -> String {
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let nullable = if index == 0 { "" } else { " NULL" };
            format!("  `{}` {}{}", column, column_type(table, index), nullable)
        })
        .collect();
    if let Some(key) = table.columns.first() {
        definitions.push(format!("  PRIMARY KEY (`{}`)", key));
    }

    format!(
        "DROP TABLE IF EXISTS `{name}`;\nCREATE TABLE `{name}` (\n{columns}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;",
        name = table.name,
        columns = definitions.join(",\n"),
    )
}

pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(_) => value.render(),
        Value::Text(text) => format!("'{}'", escape(text)),
        Value::Date(date) => format!("'{}'", date.format("%Y-%m-%d")),
    }
}

/// One `INSERT` per `batch_size` rows. A batch size of 0 is treated as 1.
pub fn insert_statements(table: &Table, batch_size: usize) -> Vec<String> {
    let columns = table
        .columns
        .iter()
        .map(|c| format!("`{}`", c))
        .collect::<Vec<_>>()
        .join(", ");

    table
        .rows
        .chunks(batch_size.max(1))
        .map(|batch| {
            let tuples = batch
                .iter()
                .map(|row| {
                    let values = row.iter().map(literal).collect::<Vec<_>>().join(", ");
                    format!("  ({})", values)
                })
                .collect::<Vec<_>>()
                .join(",\n");
            format!("INSERT INTO `{}` ({}) VALUES\n{};", table.name, columns, tuples)
        })
        .collect()
}

/// Full script over the non-empty tables of `tables`, in set order.
pub fn render_script(tables: &TableSet, batch_size: usize, generated_at: NaiveDateTime) -> String {
    let included: Vec<&Table> = tables.non_empty().collect();
    let mut script = String::new();

    let _ = writeln!(script, "{}", RULE);
    let _ = writeln!(script, "-- TEP Data Pipeline - MySQL DDL + DML Script");
    let _ = writeln!(script, "-- Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(script, "-- Tables: {}", included.len());
    let _ = writeln!(script, "{}\n", RULE);
    let _ = writeln!(script, "SET FOREIGN_KEY_CHECKS = 0;\n");

    let _ = writeln!(script, "{}\n-- DDL: CREATE TABLE STATEMENTS\n{}\n", RULE, RULE);
    for table in &included {
        let _ = writeln!(script, "{}\n", create_table(table));
    }

    let _ = writeln!(script, "{}\n-- DML: INSERT STATEMENTS\n{}\n", RULE, RULE);
    for table in &included {
        let _ = writeln!(script, "-- {} ({} rows)", table.name, table.len());
        let _ = writeln!(script, "{}\n", insert_statements(table, batch_size).join("\n\n"));
    }

    let _ = writeln!(script, "SET FOREIGN_KEY_CHECKS = 1;\n");
    let _ = writeln!(script, "-- End of script");
    script
}
