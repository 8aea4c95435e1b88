//! Error and warning types.
//!
//! Only loading a workbook can fail. Anything unexpected found while reading
//! a layout is recorded as a [`Warning`]; the affected records are dropped
//! and the run continues.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal load errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open workbook {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} has no sheets", path.display())]
    NoSheets { path: PathBuf },

    #[error("workbook {} has no sheet named '{sheet}'", path.display())]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("cannot read sheet '{sheet}' of {}: {source}", path.display())]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("cannot read cell styles of {}: {source}", path.display())]
    Styles {
        path: PathBuf,
        #[source]
        source: StylesError,
    },
}

impl ExtractError {
    /// The workbook file the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ExtractError::Open { path, .. }
            | ExtractError::NoSheets { path }
            | ExtractError::MissingSheet { path, .. }
            | ExtractError::Sheet { path, .. }
            | ExtractError::Styles { path, .. } => path,
        }
    }
}

/// Failures while reading the OOXML style and worksheet parts.
#[derive(Debug, Error)]
pub enum StylesError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error("missing required part: {0}")]
    MissingPart(String),
}

/// Recoverable anomalies. Rows and cells are reported in sheet coordinates
/// (1-based rows, lettered columns).
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    #[error("{source_name}: section '{section}' not found")]
    MissingAnchor { source_name: String, section: String },

    #[error("{source_name}: section '{section}' has anchors but no numeric row nearby")]
    EmptySection { source_name: String, section: String },

    #[error("{source_name}: section '{section}' located through configured fallback row {row}")]
    FallbackAnchor {
        source_name: String,
        section: String,
        row: usize,
    },

    #[error("{source_name}: malformed header cell {cell}: {detail}")]
    MalformedHeader {
        source_name: String,
        cell: String,
        detail: String,
    },

    #[error("{source_name}: row {row} label '{label}' matched no metric keyword")]
    UnclassifiedMetric {
        source_name: String,
        row: usize,
        label: String,
    },

    #[error("{source_name}: indent levels unavailable for this format, hierarchy read as flat")]
    IndentUnavailable { source_name: String },

    #[error("{table}.{column}: {count} value(s) missing from {referenced}: {values:?}")]
    OrphanedReference {
        table: String,
        column: String,
        referenced: String,
        count: usize,
        values: Vec<i64>,
    },
}

/// Warnings collected over a run, logged as they are recorded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for warning in warnings {
            self.warn(warning);
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
