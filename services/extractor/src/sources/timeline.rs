//! Reader for the contract value overview and timeline workbook.
//!
//! The sheet has a merged year band in row 1 and month numbers in row 3.
//! Below it, cost, manpower and subcontractor sections sit at positions that
//! drift between report revisions, so every section is found by its label.

use crate::classify::{MetricClassifier, MetricName};
use crate::error::{Diagnostics, Warning};
use crate::grid::Grid;
use crate::locator::{locate_below, RowLabels, RowLocation, ScanWindow, Section};
use crate::period::{ColumnPeriodMap, HeaderRows};
use crate::reference::{SubcontractorInfo, SUBCONTRACTORS};
use crate::series::{extract_row, ExtractMode, TimeSeriesPoint};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, info};

pub const SOURCE_NAME: &str = "timeline";

pub const FGRS: Section = Section::new("FGRS", &["FGRS", "RCE"]).excluding(&["LOGI"]);
pub const LOGI: Section = Section::new("LOGI", &["LOGI"]);
pub const POB: Section = Section::new("POB", &["POB"]);
pub const ISOLATION: Section = Section::new("Isolation", &["ISOLATION", "ISOL"]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineLayout {
    pub header: HeaderRows,
    pub label_columns: Range<usize>,
    /// Window searched around the cost and manpower section anchors.
    pub section_window: ScanWindow,
    /// Rows read from a subcontractor anchor downwards.
    pub block_rows: usize,
    /// Explicit 1-based sheet rows used when a section has no anchor,
    /// keyed by upper-case section name.
    pub fallback_rows: BTreeMap<String, usize>,
}

impl Default for TimelineLayout {
    fn default() -> Self {
        Self {
            header: HeaderRows::default(),
            label_columns: 0..3,
            section_window: ScanWindow::new(2, 4),
            block_rows: 15,
            fallback_rows: BTreeMap::new(),
        }
    }
}

impl TimelineLayout {
    pub fn with_fallback_row(mut self, section: &str, excel_row: usize) -> Self {
        self.fallback_rows.insert(section.to_uppercase(), excel_row);
        self
    }

    fn fallback_row(&self, section: &str) -> Option<usize> {
        self.fallback_rows.get(&section.to_uppercase()).copied()
    }
}

/// One located section and its monthly points.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSeries {
    pub section: &'static str,
    pub location: RowLocation,
    pub points: Vec<TimeSeriesPoint>,
}

impl SectionSeries {
    fn not_found(section: &'static str) -> Self {
        Self {
            section,
            location: RowLocation::NotFound,
            points: Vec::new(),
        }
    }

    /// 1-based sheet row the points were read from.
    pub fn excel_row(&self) -> Option<usize> {
        self.location.row().map(|row| row + 1)
    }
}

/// One metric row of a subcontractor block.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcontractorMetric {
    pub subcontractor: &'static str,
    pub metric: MetricName,
    pub raw_label: String,
    pub excel_row: usize,
    pub points: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineExtraction {
    pub periods: ColumnPeriodMap,
    pub fgrs: SectionSeries,
    pub logi: SectionSeries,
    pub pob: SectionSeries,
    pub isolation: SectionSeries,
    pub subcontractors: Vec<SubcontractorMetric>,
}

pub fn read(
    grid: &Grid,
    layout: &TimelineLayout,
    classifier: &MetricClassifier,
    diagnostics: &mut Diagnostics,
) -> TimelineExtraction {
    let (periods, issues) = ColumnPeriodMap::build(grid, layout.header);
    diagnostics.extend(issues.into_iter().map(|issue| Warning::MalformedHeader {
        source_name: SOURCE_NAME.to_string(),
        cell: issue.cell,
        detail: issue.detail,
    }));

    let monthly = periods.monthly_columns();
    info!(
        columns = periods.len(),
        monthly = monthly.len(),
        aggregate = periods.len() - monthly.len(),
        span = ?periods.monthly_span(),
        "mapped timeline columns"
    );

    let labels = RowLabels::scan(grid, layout.label_columns.clone());
    debug!(labelled_rows = labels.len(), "scanned timeline labels");

    let reader = SectionReader {
        grid,
        labels: &labels,
        periods: &periods,
        monthly: &monthly,
        layout,
    };

    let fgrs = reader.section(&FGRS, diagnostics);
    let logi = reader.section(&LOGI, diagnostics);
    let pob = reader.section(&POB, diagnostics);
    let isolation = reader.section(&ISOLATION, diagnostics);

    let subcontractors = SUBCONTRACTORS
        .iter()
        .flat_map(|info| reader.subcontractor_block(info, classifier, diagnostics))
        .collect();

    TimelineExtraction {
        periods,
        fgrs,
        logi,
        pob,
        isolation,
        subcontractors,
    }
}

struct SectionReader<'a> {
    grid: &'a Grid,
    labels: &'a RowLabels,
    periods: &'a ColumnPeriodMap,
    monthly: &'a [usize],
    layout: &'a TimelineLayout,
}

impl SectionReader<'_> {
    fn section(&self, section: &Section, diagnostics: &mut Diagnostics) -> SectionSeries {
        let mut anchors = self.labels.anchors(section);
        if anchors.is_empty() {
            match self.layout.fallback_row(section.name) {
                Some(excel_row) => {
                    diagnostics.warn(Warning::FallbackAnchor {
                        source_name: SOURCE_NAME.to_string(),
                        section: section.name.to_string(),
                        row: excel_row,
                    });
                    anchors.push(excel_row.saturating_sub(1));
                }
                None => {
                    diagnostics.warn(Warning::MissingAnchor {
                        source_name: SOURCE_NAME.to_string(),
                        section: section.name.to_string(),
                    });
                    return SectionSeries::not_found(section.name);
                }
            }
        }

        let location = locate_below(
            self.grid,
            self.layout.header.body_start(),
            &anchors,
            self.monthly,
            self.layout.section_window,
        );
        let points = match location.row() {
            Some(row) => extract_row(self.grid, row, self.periods, ExtractMode::MonthlyOnly),
            None => {
                diagnostics.warn(Warning::EmptySection {
                    source_name: SOURCE_NAME.to_string(),
                    section: section.name.to_string(),
                });
                Vec::new()
            }
        };

        info!(
            section = section.name,
            anchors = ?anchors.iter().map(|r| r + 1).collect::<Vec<_>>(),
            row = ?location.row().map(|r| r + 1),
            points = points.len(),
            "located section"
        );

        SectionSeries {
            section: section.name,
            location,
            points,
        }
    }

    /// Every labelled row with monthly data in the block starting at the
    /// subcontractor's first anchor.
    fn subcontractor_block(
        &self,
        info: &SubcontractorInfo,
        classifier: &MetricClassifier,
        diagnostics: &mut Diagnostics,
    ) -> Vec<SubcontractorMetric> {
        let section = Section::new(info.name, info.keywords);
        let Some(&start) = self.labels.anchors(&section).first() else {
            diagnostics.warn(Warning::MissingAnchor {
                source_name: SOURCE_NAME.to_string(),
                section: info.name.to_string(),
            });
            return Vec::new();
        };

        let end = (start + self.layout.block_rows).min(self.grid.height());
        let mut metrics = Vec::new();
        for row in start..end {
            let Some(label) = self.labels.get(row) else {
                continue;
            };
            let points = extract_row(self.grid, row, self.periods, ExtractMode::MonthlyOnly);
            if points.is_empty() {
                continue;
            }

            let excel_row = row + 1;
            let metric = classifier.classify(label, excel_row);
            if metric.canonical().is_none() {
                diagnostics.warn(Warning::UnclassifiedMetric {
                    source_name: SOURCE_NAME.to_string(),
                    row: excel_row,
                    label: label.to_string(),
                });
            }
            debug!(
                subcontractor = info.name,
                row = excel_row,
                label,
                metric = %metric,
                points = points.len(),
                "subcontractor metric row"
            );
            metrics.push(SubcontractorMetric {
                subcontractor: info.name,
                metric,
                raw_label: label.to_string(),
                excel_row,
                points,
            });
        }

        info!(
            subcontractor = info.name,
            anchor = start + 1,
            metrics = metrics.len(),
            "read subcontractor block"
        );
        metrics
    }
}
