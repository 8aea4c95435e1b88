//! Layout inference and normalization for the TEP contract workbooks.
//!
//! The workbooks are reports, not data exports: a timeline sheet with a
//! merged year band and label-anchored sections, an amendment comparison
//! sheet, and an indented claim pivot. This crate recovers their structure
//! from positional and visual conventions and reshapes the result into a
//! fixed relational schema.
//!
//! ```text
//! workbook ─▶ grid ─▶ period map ─┐
//!                    row locator ─┼─▶ series / classifier ─┐
//!                    hierarchy ───┘                        ├─▶ normalize ─▶ validate
//!                    evolution lines ──────────────────────┘
//! ```

pub mod classify;
pub mod error;
pub mod grid;
pub mod hierarchy;
pub mod locator;
pub mod normalize;
pub mod period;
pub mod reference;
pub mod series;
pub mod sources;
pub mod styles;
pub mod tables;
pub mod validate;
pub mod workbook;

pub use classify::{CanonicalMetric, MetricClassifier, MetricName};
pub use error::{Diagnostics, ExtractError, Warning};
pub use grid::{CellValue, Grid};
pub use hierarchy::{HierarchyConfig, HierarchyRecord, HierarchyRow};
pub use locator::{RowLocation, ScanWindow, Section};
pub use normalize::{normalize, Normalized};
pub use period::{ColumnPeriodMap, HeaderRows, Month, Period};
pub use series::{ExtractMode, TimeSeriesPoint};
pub use sources::{extract, Extraction, Layouts, SourceFiles};
pub use tables::{Table, TableSet, TableStats, Value, TABLE_ORDER};
pub use validate::{check_integrity, cleanse, CleanseReport, IntegrityReport};
