//! Tabular output model shared by the normalizer and the exporters.

use chrono::NaiveDate;
use serde::Serialize;

/// Reference tables first, then fact tables; the order tables are created in.
pub const TABLE_ORDER: [&str; 13] = [
    "tb_m_project",
    "tb_m_amendment",
    "tb_m_cost_category",
    "tb_m_cost_discipline",
    "tb_m_subcontractor",
    "tb_m_event",
    "tb_t_contract_value",
    "tb_t_monthly_cost",
    "tb_t_monthly_pob",
    "tb_t_pamf_claim",
    "tb_t_variation_order",
    "tb_t_subcontractor_monthly",
    "tb_t_project_progress",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Plain-text rendering; nulls are empty.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => render_float(*f),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Shortest decimal text that parses back to the same value. `Display` for
/// `f64` never switches to exponent form, so tiny and huge values stay plain.
pub fn render_float(f: f64) -> String {
    if !f.is_finite() {
        return String::new();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{:.1}", f);
    }
    f.to_string()
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        if f.is_finite() {
            Value::Float(f)
        } else {
            Value::Null
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A typed row that knows its table's column layout.
pub trait Record {
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<Value>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_records<R: Record>(name: &str, records: &[R]) -> Self {
        let mut table = Self::new(name, R::COLUMNS);
        table.rows = records.iter().map(Record::values).collect();
        table
    }

    pub fn push(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width of {}", self.name);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Values of one column, top to bottom. Empty when the column is absent.
    pub fn column(&self, column: &str) -> impl Iterator<Item = &Value> {
        let index = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|i| row.get(i)))
    }

    pub fn null_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|v| v.is_null())
            .count()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            name: self.name.clone(),
            rows: self.len(),
            columns: self.columns.len(),
            nulls: self.null_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub nulls: usize,
}

/// Named tables in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSet {
    tables: Vec<Table>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing any earlier table of the same name in place.
    pub fn insert(&mut self, table: Table) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.iter_mut()
    }

    pub fn non_empty(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| !t.is_empty())
    }

    pub fn empty_names(&self) -> Vec<String> {
        self.tables
            .iter()
            .filter(|t| t.is_empty())
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        id: i64,
        label: Option<String>,
    }

    impl Record for Pair {
        const COLUMNS: &'static [&'static str] = &["id", "label"];

        fn values(&self) -> Vec<Value> {
            vec![self.id.into(), self.label.clone().into()]
        }
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Null.render(), "");
        assert_eq!(Value::from(3i64).render(), "3");
        assert_eq!(Value::from(2.0).render(), "2.0");
        assert_eq!(Value::from(0.123456).render(), "0.123456");
        assert_eq!(Value::from(1234567890.25).render(), "1234567890.25");
        assert_eq!(Value::from(1e-7).render(), "0.0000001");
        assert_eq!(Value::from(1e-11).render(), "0.00000000001");
        assert_eq!(Value::from(0.1 + 0.2).render(), "0.30000000000000004");
        assert_eq!(Value::from(-2.5e-12).render().parse::<f64>(), Ok(-2.5e-12));
        assert_eq!(Value::from(f64::NAN), Value::Null);
        let d = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        assert_eq!(Value::from(d).render(), "2020-03-01");
    }

    #[test]
    fn test_from_records_and_columns() {
        let table = Table::from_records(
            "pairs",
            &[
                Pair { id: 1, label: Some("a".into()) },
                Pair { id: 2, label: None },
            ],
        );
        assert_eq!(table.columns, vec!["id", "label"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.null_count(), 1);
        assert_eq!(
            table.column("id").filter_map(Value::as_int).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(table.column("missing").count(), 0);
    }

    #[test]
    fn test_table_set_keeps_insertion_order() {
        let mut set = TableSet::new();
        set.insert(Table::new("b", &["x"]));
        set.insert(Table::new("a", &["x"]));
        let mut replacement = Table::new("b", &["x"]);
        replacement.push(vec![Value::Int(1)]);
        set.insert(replacement);

        let names: Vec<&str> = set.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(set.get("b").map(Table::len), Some(1));
        assert_eq!(set.empty_names(), vec!["a".to_string()]);
        assert_eq!(set.non_empty().count(), 1);
    }
}
