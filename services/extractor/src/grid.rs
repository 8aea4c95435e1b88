//! Positional access over a materialized worksheet.
//!
//! A [`Grid`] is built once per sheet and never mutated afterwards. Rows and
//! columns are 0-based here; sheet coordinates (1-based rows, lettered
//! columns) only appear in diagnostics and provenance fields.

use calamine::{Data, Range};
use chrono::{Days, NaiveDate};
use std::collections::HashMap;

static EMPTY: CellValue = CellValue::Empty;

/// Widest sheet Excel can produce (column XFD).
pub const MAX_COLUMNS: usize = 16_384;

/// Untyped cell content. Dates keep their serial day number but are never
/// numeric: a report date in a header band or data row is not a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Date(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Trimmed display text, `None` for empty or blank cells.
    pub fn label(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(render_number(*n)),
            CellValue::Date(serial) => Some(
                serial_date(*serial)
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| render_number(*serial)),
            ),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::DateTime(dt) => CellValue::Date(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                if s.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.clone())
                }
            }
            Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Calendar date of a 1900-system serial day number.
pub fn serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

/// Integral numbers render without a fractional part.
pub fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
    indents: HashMap<(usize, usize), u8>,
    width: usize,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            rows,
            indents: HashMap::new(),
            width,
        }
    }

    /// Materialize a calamine range at its absolute sheet position, so that
    /// row 0 is always sheet row 1 even when the used range starts lower.
    pub fn from_range(range: &Range<Data>) -> Self {
        let Some((start_row, start_col)) = range.start() else {
            return Self::default();
        };
        let (start_row, start_col) = (start_row as usize, start_col as usize);

        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row];
        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; start_col];
            cells.extend(row.iter().map(CellValue::from));
            rows.push(cells);
        }
        Self::new(rows)
    }

    pub fn with_indents(mut self, indents: HashMap<(usize, usize), u8>) -> Self {
        self.indents = indents;
        self
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        self.value(row, col).as_number()
    }

    pub fn label(&self, row: usize, col: usize) -> Option<String> {
        self.value(row, col).label()
    }

    /// Visual indentation level of a cell, 0 when unstyled.
    pub fn indent(&self, row: usize, col: usize) -> u8 {
        self.indents.get(&(row, col)).copied().unwrap_or(0)
    }

    /// First non-blank label among `columns`, left to right.
    pub fn row_label(&self, row: usize, columns: std::ops::Range<usize>) -> Option<String> {
        columns.into_iter().find_map(|col| self.label(row, col))
    }
}

/// Spreadsheet column letters for a 0-based index (0 → A, 26 → AA).
pub fn column_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Sheet-style reference for a 0-based position (0, 1 → B1).
pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Parse an A1-style reference into a 0-based `(row, col)`. Columns past
/// [`MAX_COLUMNS`] are rejected.
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }

    let mut col = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
        if col > MAX_COLUMNS {
            return None;
        }
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}
