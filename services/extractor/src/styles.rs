//! Cell indentation read straight from the OOXML archive.
//!
//! calamine only exposes values, so the hierarchy's indent levels come from
//! the workbook parts: `xl/styles.xml` maps each `cellXfs` entry to its
//! `alignment@indent`, and the worksheet part maps every styled cell to one of
//! those entries through its `s` attribute.

use crate::error::StylesError;
use crate::grid::parse_cell_ref;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// Indent level per styled cell of `sheet_name`, keyed by 0-based
/// `(row, col)`. Cells without indentation are not listed.
pub fn read_indents(
    path: &Path,
    sheet_name: &str,
) -> Result<HashMap<(usize, usize), u8>, StylesError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let xf_indents = match read_part(&mut archive, STYLES_PART)? {
        Some(xml) => parse_cell_xf_indents(&xml)?,
        None => Vec::new(),
    };
    if xf_indents.iter().all(|&indent| indent == 0) {
        return Ok(HashMap::new());
    }

    let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
        .ok_or_else(|| StylesError::MissingPart(WORKBOOK_PART.to_string()))?;
    let rels_xml = read_part(&mut archive, WORKBOOK_RELS_PART)?.unwrap_or_default();
    let sheet_part = resolve_sheet_part(&workbook_xml, &rels_xml, sheet_name)?
        .ok_or_else(|| StylesError::MissingPart(format!("worksheet '{}'", sheet_name)))?;

    let sheet_xml = read_part(&mut archive, &sheet_part)?
        .ok_or(StylesError::MissingPart(sheet_part))?;
    parse_cell_indents(&sheet_xml, &xf_indents)
}

/// Read a part by name, matching case-insensitively like Excel does.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, StylesError> {
    let Some(actual) = archive
        .file_names()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .map(str::to_owned)
    else {
        return Ok(None);
    };

    match archive.by_name(&actual) {
        Ok(mut file) => {
            let mut xml = String::new();
            file.read_to_string(&mut xml)?;
            Ok(Some(xml))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn attr_value(element: &BytesStart, name: &[u8]) -> Result<Option<String>, StylesError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = match quick_xml::escape::unescape(&raw) {
                Ok(unescaped) => unescaped.into_owned(),
                Err(_) => raw.clone(),
            };
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Indent level of each `cellXfs/xf`, in style-index order.
pub(crate) fn parse_cell_xf_indents(styles_xml: &str) -> Result<Vec<u8>, StylesError> {
    let mut reader = Reader::from_str(styles_xml);
    let mut in_cell_xfs = false;
    let mut indents = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Start(e) | Event::Empty(e) if in_cell_xfs => match e.local_name().as_ref() {
                b"xf" => indents.push(0),
                b"alignment" => {
                    let indent = attr_value(&e, b"indent")?
                        .and_then(|v| v.trim().parse::<u8>().ok())
                        .unwrap_or(0);
                    if let Some(last) = indents.last_mut() {
                        *last = indent;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(indents)
}

/// Locate the archive path of a worksheet through `workbook.xml` and its
/// relationships. Falls back to the conventional `sheetN.xml` name when the
/// relationship is missing.
pub(crate) fn resolve_sheet_part(
    workbook_xml: &str,
    rels_xml: &str,
    sheet_name: &str,
) -> Result<Option<String>, StylesError> {
    let mut sheets: Vec<(String, Option<String>)> = Vec::new();
    let mut reader = Reader::from_str(workbook_xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let Some(name) = attr_value(&e, b"name")? {
                    sheets.push((name, attr_value(&e, b"id")?));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut targets: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(rels_xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr_value(&e, b"Id")?, attr_value(&e, b"Target")?) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let Some(position) = sheets.iter().position(|(name, _)| name == sheet_name) else {
        return Ok(None);
    };
    let part = sheets[position]
        .1
        .as_ref()
        .and_then(|id| targets.get(id))
        .map(|target| match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", target.trim_start_matches("./")),
        })
        .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", position + 1));
    Ok(Some(part))
}

/// Map every styled cell of a worksheet part to its indent level.
pub(crate) fn parse_cell_indents(
    sheet_xml: &str,
    xf_indents: &[u8],
) -> Result<HashMap<(usize, usize), u8>, StylesError> {
    let mut indents = HashMap::new();
    let mut reader = Reader::from_str(sheet_xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let Some(style) = attr_value(&e, b"s")?.and_then(|s| s.parse::<usize>().ok()) else {
                    continue;
                };
                let indent = xf_indents.get(style).copied().unwrap_or(0);
                if indent == 0 {
                    continue;
                }
                if let Some(position) = attr_value(&e, b"r")?.as_deref().and_then(parse_cell_ref) {
                    indents.insert(position, indent);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(indents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0"><alignment indent="7"/></xf></cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" applyAlignment="1"><alignment horizontal="left" indent="1"/></xf>
    <xf numFmtId="0" fontId="0" applyAlignment="1"><alignment horizontal="left" indent="2"/></xf>
    <xf numFmtId="4" fontId="1"/>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn test_cell_xf_indents_ignore_cell_style_xfs() {
        let indents = parse_cell_xf_indents(STYLES).unwrap();
        assert_eq!(indents, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_cell_indents_from_style_index() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c></row>
            <row r="2"><c r="A2" s="1" t="s"><v>1</v></c><c r="B2" s="3"><v>5</v></c></row>
            <row r="3"><c r="A3" s="2" t="s"><v>2</v></c></row>
            <row r="4"><c r="A4" s="9"/></row>
        </sheetData></worksheet>"#;
        let indents = parse_cell_indents(sheet, &[0, 1, 2, 0]).unwrap();

        assert_eq!(indents.len(), 2);
        assert_eq!(indents.get(&(1, 0)), Some(&1));
        assert_eq!(indents.get(&(2, 0)), Some(&2));
    }

    #[test]
    fn test_resolve_sheet_part_through_relationships() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
              <sheet name="Summary" sheetId="1" r:id="rId3"/>
              <sheet name="PAMF &amp; Claims" sheetId="2" r:id="rId1"/>
            </sheets></workbook>"#;
        let rels = r#"<Relationships>
            <Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet2.xml"/>
            <Relationship Id="rId3" Type="worksheet" Target="/xl/worksheets/sheet1.xml"/>
        </Relationships>"#;

        assert_eq!(
            resolve_sheet_part(workbook, rels, "Summary").unwrap().as_deref(),
            Some("xl/worksheets/sheet1.xml")
        );
        assert_eq!(
            resolve_sheet_part(workbook, rels, "PAMF & Claims").unwrap().as_deref(),
            Some("xl/worksheets/sheet2.xml")
        );
        assert_eq!(resolve_sheet_part(workbook, rels, "Missing").unwrap(), None);
    }

    #[test]
    fn test_resolve_sheet_part_without_relationships() {
        let workbook = r#"<workbook><sheets><sheet name="A" sheetId="1"/><sheet name="B" sheetId="2"/></sheets></workbook>"#;
        assert_eq!(
            resolve_sheet_part(workbook, "", "B").unwrap().as_deref(),
            Some("xl/worksheets/sheet2.xml")
        );
    }
}
