//! The three source workbooks and their readers.

pub mod cbs;
pub mod evolution;
pub mod timeline;

use crate::classify::MetricClassifier;
use crate::error::{Diagnostics, ExtractError, Warning};
use crate::hierarchy::HierarchyRecord;
use crate::workbook::{load_sheet, LoadedSheet};
use std::path::{Path, PathBuf};

pub use cbs::CbsLayout;
pub use evolution::{EvolutionLayout, EvolutionLine};
pub use timeline::{SectionSeries, SubcontractorMetric, TimelineExtraction, TimelineLayout};

pub const TIMELINE_FILE: &str = "Contract Value Overview and Timeline_15-Jul-24.xlsx";
pub const EVOLUTION_FILE: &str = "TEP Contract Evolution.xlsx";
pub const CBS_FILE: &str = "Cost Breakdown Structure.xlsx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    pub timeline: PathBuf,
    pub evolution: PathBuf,
    pub cbs: PathBuf,
}

impl SourceFiles {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            timeline: dir.join(TIMELINE_FILE),
            evolution: dir.join(EVOLUTION_FILE),
            cbs: dir.join(CBS_FILE),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layouts {
    pub timeline: TimelineLayout,
    pub evolution: EvolutionLayout,
    pub cbs: CbsLayout,
}

/// Everything read from the three workbooks.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub timeline: TimelineExtraction,
    pub evolution: Vec<EvolutionLine>,
    pub claims: Vec<HierarchyRecord>,
}

/// Load all three workbooks, then read them. Any load failure aborts
/// before reading starts.
pub fn extract(
    files: &SourceFiles,
    layouts: &Layouts,
    diagnostics: &mut Diagnostics,
) -> Result<Extraction, ExtractError> {
    let timeline_sheet = load_sheet(&files.timeline, None)?;
    let evolution_sheet = load_sheet(&files.evolution, None)?;
    let cbs_sheet = load_sheet(&files.cbs, None)?;

    Ok(read_sheets(
        &timeline_sheet,
        &evolution_sheet,
        &cbs_sheet,
        layouts,
        diagnostics,
    ))
}

pub fn read_sheets(
    timeline_sheet: &LoadedSheet,
    evolution_sheet: &LoadedSheet,
    cbs_sheet: &LoadedSheet,
    layouts: &Layouts,
    diagnostics: &mut Diagnostics,
) -> Extraction {
    let classifier = MetricClassifier::default();
    let timeline = timeline::read(
        &timeline_sheet.grid,
        &layouts.timeline,
        &classifier,
        diagnostics,
    );
    let evolution = evolution::read(&evolution_sheet.grid, &layouts.evolution);

    if !cbs_sheet.indents_available {
        diagnostics.warn(Warning::IndentUnavailable {
            source_name: cbs::SOURCE_NAME.to_string(),
        });
    }
    let claims = cbs::read(&cbs_sheet.grid, &layouts.cbs);

    Extraction {
        timeline,
        evolution,
        claims,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_names() {
        let files = SourceFiles::in_dir(Path::new("raw_data"));
        assert_eq!(files.evolution, Path::new("raw_data/TEP Contract Evolution.xlsx"));
        assert!(files.timeline.ends_with(TIMELINE_FILE));
    }

    #[test]
    fn test_missing_workbook_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut diagnostics = Diagnostics::new();
        let err = extract(&SourceFiles::in_dir(dir.path()), &Layouts::default(), &mut diagnostics)
            .unwrap_err();
        assert!(err.path().ends_with(TIMELINE_FILE));
    }
}
