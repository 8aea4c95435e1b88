//! Label-driven row discovery.
//!
//! Sections of a sheet are found in two steps. A keyword scan over the label
//! columns yields anchor rows; then every row in a window around each anchor
//! is scored by how many numeric cells it holds under the monthly columns,
//! and the best-scoring row is taken as the section's data row. Scoring and
//! selection are separate pure functions.

use crate::grid::Grid;
use std::ops::Range;

/// Keywords identifying a section by its row label. Matching is
/// case-insensitive substring containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub include: &'static [&'static str],
    pub exclude: &'static [&'static str],
}

impl Section {
    pub const fn new(name: &'static str, include: &'static [&'static str]) -> Self {
        Self {
            name,
            include,
            exclude: &[],
        }
    }

    pub const fn excluding(self, exclude: &'static [&'static str]) -> Self {
        Self { exclude, ..self }
    }

    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_uppercase();
        self.include.iter().any(|kw| label.contains(&kw.to_uppercase()))
            && !self.exclude.iter().any(|kw| label.contains(&kw.to_uppercase()))
    }
}

/// Row labels of a sheet: the first non-blank cell among the label columns.
#[derive(Debug, Clone, Default)]
pub struct RowLabels {
    labels: Vec<(usize, String)>,
}

impl RowLabels {
    pub fn scan(grid: &Grid, label_columns: Range<usize>) -> Self {
        let labels = (0..grid.height())
            .filter_map(|row| {
                grid.row_label(row, label_columns.clone())
                    .map(|label| (row, label))
            })
            .collect();
        Self { labels }
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.labels
            .binary_search_by_key(&row, |(r, _)| *r)
            .ok()
            .map(|i| self.labels[i].1.as_str())
    }

    /// Rows whose label matches `section`, ascending.
    pub fn anchors(&self, section: &Section) -> Vec<usize> {
        self.labels
            .iter()
            .filter(|(_, label)| section.matches(label))
            .map(|(row, _)| *row)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Rows scanned around an anchor: `[anchor - above, anchor + below]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub above: usize,
    pub below: usize,
}

impl Default for ScanWindow {
    fn default() -> Self {
        Self {
            above: 2,
            below: 15,
        }
    }
}

impl ScanWindow {
    pub const fn new(above: usize, below: usize) -> Self {
        Self { above, below }
    }

    /// The window clamped to `0..height`.
    pub fn rows(&self, anchor: usize, height: usize) -> Range<usize> {
        let start = anchor.saturating_sub(self.above);
        let end = anchor.saturating_add(self.below).saturating_add(1).min(height);
        start..end.max(start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLocation {
    Found { row: usize, score: usize },
    NotFound,
}

impl RowLocation {
    pub fn row(&self) -> Option<usize> {
        match self {
            RowLocation::Found { row, .. } => Some(*row),
            RowLocation::NotFound => None,
        }
    }

    pub fn score(&self) -> usize {
        match self {
            RowLocation::Found { score, .. } => *score,
            RowLocation::NotFound => 0,
        }
    }
}

/// Number of numeric cells of `row` under `columns`.
pub fn score_row(grid: &Grid, row: usize, columns: &[usize]) -> usize {
    columns
        .iter()
        .filter(|&&col| grid.number(row, col).is_some())
        .count()
}

/// Highest score wins, the first candidate wins a tie, and a zero score
/// never wins.
pub fn select_best(candidates: impl IntoIterator<Item = (usize, usize)>) -> RowLocation {
    candidates
        .into_iter()
        .fold(RowLocation::NotFound, |best, (row, score)| match best {
            RowLocation::Found { score: best_score, .. } if score <= best_score => best,
            _ if score == 0 => best,
            _ => RowLocation::Found { row, score },
        })
}

/// Best data row around `anchors`, visited in the given order, each window
/// scanned top-down.
pub fn locate(grid: &Grid, anchors: &[usize], columns: &[usize], window: ScanWindow) -> RowLocation {
    locate_below(grid, 0, anchors, columns, window)
}

/// [`locate`] restricted to rows at or after `first_row`, so a header band
/// of numbers above the data can never be picked.
pub fn locate_below(
    grid: &Grid,
    first_row: usize,
    anchors: &[usize],
    columns: &[usize],
    window: ScanWindow,
) -> RowLocation {
    let candidates = anchors
        .iter()
        .flat_map(|&anchor| window.rows(anchor, grid.height()))
        .filter(|&row| row >= first_row)
        .map(|row| (row, score_row(grid, row, columns)));
    select_best(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellValue;

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    const E: CellValue = CellValue::Empty;

    // -------------------------------------------------------------------------
    // SECTION KEYWORDS
    // -------------------------------------------------------------------------

    #[test]
    fn test_section_matching_is_case_insensitive_with_exclusions() {
        let fgrs = Section::new("FGRS", &["FGRS", "RCE"]).excluding(&["LOGI"]);
        assert!(fgrs.matches("fgrs monthly cost"));
        assert!(fgrs.matches("RCE for site"));
        assert!(!fgrs.matches("LOGI RCE Cumulative"));
        assert!(!fgrs.matches("POB"));
    }

    #[test]
    fn test_row_labels_scan_and_anchor_order() {
        let grid = Grid::new(vec![
            vec![E, t("POB Plan")],
            vec![],
            vec![E, E, t("Isolation")],
            vec![t("Total POB")],
        ]);
        let labels = RowLabels::scan(&grid, 0..3);
        let pob = Section::new("POB", &["POB"]);

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(2), Some("Isolation"));
        assert_eq!(labels.get(1), None);
        assert_eq!(labels.anchors(&pob), vec![0, 3]);
    }

    // -------------------------------------------------------------------------
    // WINDOW
    // -------------------------------------------------------------------------

    #[test]
    fn test_window_is_clamped() {
        let window = ScanWindow::new(2, 4);
        assert_eq!(window.rows(1, 100), 0..6);
        assert_eq!(window.rows(10, 100), 8..15);
        assert_eq!(window.rows(10, 12), 8..12);
        assert_eq!(window.rows(10, 0), 8..8);
    }

    // -------------------------------------------------------------------------
    // SCORING AND SELECTION
    // -------------------------------------------------------------------------

    #[test]
    fn test_score_counts_numeric_cells_in_columns() {
        let grid = Grid::new(vec![vec![t("x"), n(1.0), t("2"), n(3.0), n(4.0)]]);
        assert_eq!(score_row(&grid, 0, &[1, 2, 3]), 2);
        assert_eq!(score_row(&grid, 0, &[]), 0);
    }

    #[test]
    fn test_tie_goes_to_first_encountered() {
        assert_eq!(
            select_best(vec![(5, 3), (6, 7), (9, 7), (10, 2)]),
            RowLocation::Found { row: 6, score: 7 }
        );
    }

    #[test]
    fn test_zero_score_never_wins() {
        assert_eq!(select_best(vec![(3, 0), (4, 0)]), RowLocation::NotFound);
        assert_eq!(select_best(Vec::new()), RowLocation::NotFound);
        assert_eq!(RowLocation::NotFound.row(), None);
    }

    #[test]
    fn test_locate_prefers_fuller_row_near_anchor() {
        let grid = Grid::new(vec![
            vec![t("FGRS RCE"), n(1.0)],
            vec![t("Plan"), n(1.0), n(2.0)],
            vec![t("Actual"), n(1.0), n(2.0), n(3.0)],
            vec![t("Forecast"), n(1.0), n(2.0), n(3.0)],
        ]);
        let location = locate(&grid, &[0], &[1, 2, 3], ScanWindow::new(2, 4));
        assert_eq!(location, RowLocation::Found { row: 2, score: 3 });
        assert_eq!(location.score(), 3);
    }

    #[test]
    fn test_locate_without_numbers_is_not_found() {
        let grid = Grid::new(vec![vec![t("LOGI")], vec![t("notes")]]);
        assert_eq!(locate(&grid, &[0], &[1, 2], ScanWindow::default()), RowLocation::NotFound);
    }

    #[test]
    fn test_locate_visits_anchors_in_given_order() {
        let grid = Grid::new(vec![
            vec![t("A"), n(1.0), n(1.0)],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![t("B"), n(1.0), n(1.0)],
        ]);
        let window = ScanWindow::new(0, 0);
        assert_eq!(locate(&grid, &[6, 0], &[1, 2], window).row(), Some(6));
        assert_eq!(locate(&grid, &[0, 6], &[1, 2], window).row(), Some(0));
    }

    #[test]
    fn test_locate_below_skips_header_band() {
        let grid = Grid::new(vec![
            vec![CellValue::Empty, n(11.0), n(12.0)],
            vec![t("FGRS RCE")],
            vec![t("MUSD"), n(1.0), n(2.0)],
        ]);
        let window = ScanWindow::new(2, 4);
        assert_eq!(locate(&grid, &[1], &[1, 2], window).row(), Some(0));
        assert_eq!(locate_below(&grid, 1, &[1], &[1, 2], window).row(), Some(2));
    }
}
