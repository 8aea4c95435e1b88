//! Workbook loading.
//!
//! Values come from calamine (format auto-detected: xlsx, xlsm, xlsb, xls,
//! ods). Indentation is only recoverable from OOXML archives; other formats
//! load with every indent at 0.

use crate::error::ExtractError;
use crate::grid::Grid;
use crate::styles;
use calamine::{open_workbook_auto, Reader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One worksheet, fully materialized.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub path: PathBuf,
    pub sheet_name: String,
    pub grid: Grid,
    /// False when the file format carries no readable alignment data.
    pub indents_available: bool,
}

/// Load `sheet` (or the first sheet) of the workbook at `path`.
pub fn load_sheet(path: &Path, sheet: Option<&str>) -> Result<LoadedSheet, ExtractError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| ExtractError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    debug!(path = %path.display(), sheets = ?sheet_names, "opened workbook");

    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| ExtractError::MissingSheet {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ExtractError::NoSheets {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|source| ExtractError::Sheet {
            path: path.to_path_buf(),
            sheet: sheet_name.clone(),
            source,
        })?;
    let mut grid = Grid::from_range(&range);

    let indents_available = is_ooxml(path);
    if indents_available {
        let indents = styles::read_indents(path, &sheet_name).map_err(|source| {
            ExtractError::Styles {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(sheet = %sheet_name, indented_cells = indents.len(), "read cell indents");
        grid = grid.with_indents(indents);
    }

    info!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = grid.height(),
        cols = grid.width(),
        "loaded sheet"
    );

    Ok(LoadedSheet {
        path: path.to_path_buf(),
        sheet_name,
        grid,
        indents_available,
    })
}

fn is_ooxml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xlsm"))
        .unwrap_or(false)
}
