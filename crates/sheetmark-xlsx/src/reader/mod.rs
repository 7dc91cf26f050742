//! XLSX reader

mod chart;
mod drawing;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::markup::read_markup;
use crate::styles::read_styles_xml;
use sheetmark_core::{
    CellAddress, CellData, CellError, CellRange, CellValue, PageBreak, PageBreaks, RowInfo,
    Style, Workbook, Worksheet,
};

const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_WORKSHEET: &str = "/worksheet";
const REL_DRAWING: &str = "/drawing";

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.get(6..7) == Some("_"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// A package relationship with its target resolved to a part name
#[derive(Debug, Clone)]
pub(crate) struct Relationship {
    pub(crate) target: String,
    pub(crate) rel_type: String,
}

/// Resolve a relationship target against the part that declares it
pub(crate) fn resolve_part(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_part.split('/').collect();
    parts.pop();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Name of the relationships part belonging to a part
pub(crate) fn rels_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Read the relationships of `part`, keyed by id. A part without
/// relationships yields an empty map.
pub(crate) fn read_relationships<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    part: &str,
) -> XlsxResult<HashMap<String, Relationship>> {
    let rels_path = rels_part(part);
    let mut rels = HashMap::new();

    let file = match archive.by_name(&rels_path) {
        Ok(f) => f,
        Err(_) => return Ok(rels),
    };

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr(&e, b"Id");
                let target = attr(&e, b"Target");
                let rel_type = attr(&e, b"Type");
                let external = attr(&e, b"TargetMode").as_deref() == Some("External");

                if let (Some(id), Some(target), Some(rel_type), false) =
                    (id, target, rel_type, external)
                {
                    let target = resolve_part(part, &target);
                    rels.insert(id, Relationship { target, rel_type });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Get an attribute by its full (prefixed) name
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Get an attribute by local name, whatever its prefix
fn attr_local(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn is_true(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Convert an ISO 8601 date cell (`t="d"`) to a serial date number
fn iso_to_serial(value: &str) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some((parsed - epoch).num_milliseconds() as f64 / 86_400_000.0)
}

/// Cell attributes and content collected while its element is open
#[derive(Debug, Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    formula: Option<String>,
    /// `si` of a shared formula the cell takes part in
    shared_index: Option<String>,
}

impl PendingCell {
    fn from_attrs(e: &BytesStart<'_>) -> Self {
        Self {
            reference: attr(e, b"r"),
            cell_type: attr(e, b"t"),
            style: attr(e, b"s").and_then(|s| s.parse().ok()),
            ..Self::default()
        }
    }
}

/// Cursor used for cells that omit their `r` attribute
#[derive(Debug, Default)]
struct GridPosition {
    /// Last row seen, `None` before the first one
    row: Option<u32>,
    next_col: u16,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from an in-memory buffer
    pub fn read_bytes(bytes: &[u8]) -> XlsxResult<Workbook> {
        Self::read(Cursor::new(bytes))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let workbook_part = Self::find_workbook_part(&mut archive)?;
        log::debug!("workbook part: {}", workbook_part);

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let cell_styles = Self::read_styles(&mut archive);
        let sheet_info = Self::read_workbook_xml(&mut archive, &workbook_part)?;

        let sheet_paths: HashMap<String, String> =
            read_relationships(&mut archive, &workbook_part)?
                .into_iter()
                .filter(|(_, rel)| rel.rel_type.ends_with(REL_WORKSHEET))
                .map(|(id, rel)| (id, rel.target))
                .collect();

        let mut workbook = Workbook::empty();

        for (name, r_id) in &sheet_info {
            // chartsheets and dialog sheets are not worksheets
            let Some(path) = sheet_paths.get(r_id) else {
                log::debug!("skipping sheet '{}': {} is not a worksheet", name, r_id);
                continue;
            };

            let mut worksheet = Worksheet::new(name.as_str());
            let drawing_ids =
                Self::read_worksheet(&mut archive, path, &mut worksheet, &shared_strings, &cell_styles)?;
            worksheet.set_markup(Self::read_worksheet_markup(&mut archive, path));

            if !drawing_ids.is_empty() {
                let rels = read_relationships(&mut archive, path)?;
                for id in drawing_ids {
                    match rels.get(&id) {
                        Some(rel) if rel.rel_type.ends_with(REL_DRAWING) => {
                            for object in drawing::read_drawing(&mut archive, &rel.target)? {
                                worksheet.add_drawing(object);
                            }
                        }
                        _ => log::warn!("sheet '{}': drawing {} has no target", name, id),
                    }
                }
            }

            workbook.add_existing_worksheet(worksheet)?;
        }

        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat("workbook has no worksheets".into()));
        }

        Ok(workbook)
    }

    /// Locate the workbook part through the package relationships
    fn find_workbook_part<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<String> {
        let rels = read_relationships(archive, "")?;
        Ok(rels
            .into_values()
            .find(|rel| rel.rel_type.ends_with(REL_OFFICE_DOCUMENT))
            .map(|rel| rel.target)
            .unwrap_or_else(|| "xl/workbook.xml".to_string()))
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // phonetic runs are not part of the text
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current_string.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Vec<Style> {
        let file = match archive.by_name("xl/styles.xml") {
            Ok(f) => f,
            Err(_) => return vec![Style::default()],
        };
        read_styles_xml(file).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable styles.xml: {}", e);
            vec![Style::default()]
        })
    }

    /// Read workbook.xml to get sheet names and rIds, in tab order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        workbook_part: &str,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name(workbook_part)
            .map_err(|_| XlsxError::MissingPart(workbook_part.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(r_id)) = (attr(&e, b"name"), attr_local(&e, b"id")) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read the typed content of a worksheet. Returns the relationship ids
    /// of the drawings the sheet references.
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        cell_styles: &[Style],
    ) -> XlsxResult<Vec<String>> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut style_map: HashMap<u32, u32> = HashMap::new();
        let mut drawing_ids = Vec::new();
        let mut position = GridPosition::default();

        let mut cell = PendingCell::default();
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;
        let mut row_breaks: Option<PageBreaks> = None;
        let mut in_row_breaks = false;
        // master text of each shared formula, by `si`
        let mut shared_formulas: HashMap<String, String> = HashMap::new();

        loop {
            let (e, is_empty) = match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => (e, false),
                Ok(Event::Empty(e)) => (e, true),
                Ok(Event::End(e)) => {
                    match e.local_name().as_ref() {
                        b"c" => {
                            Self::resolve_shared_formula(&mut cell, &mut shared_formulas);
                            Self::process_cell(
                                worksheet,
                                std::mem::take(&mut cell),
                                &mut position,
                                shared_strings,
                                cell_styles,
                                &mut style_map,
                            )?;
                            in_cell = false;
                        }
                        b"v" => in_value = false,
                        b"f" => in_formula = false,
                        b"is" => in_inline_str = false,
                        b"t" => in_inline_text = false,
                        b"rowBreaks" => in_row_breaks = false,
                        _ => {}
                    }
                    buf.clear();
                    continue;
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape()?;
                    if in_value {
                        cell.value = Some(text.into_owned());
                    } else if in_formula {
                        cell.formula.get_or_insert_with(String::new).push_str(&text);
                    } else if in_inline_text {
                        cell.value
                            .get_or_insert_with(String::new)
                            .push_str(&decode_excel_escapes(&text));
                    }
                    buf.clear();
                    continue;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {
                    buf.clear();
                    continue;
                }
            };

            match e.local_name().as_ref() {
                b"row" => Self::apply_row_attrs(worksheet, &e, &mut position),
                b"c" => {
                    cell = PendingCell::from_attrs(&e);
                    if is_empty {
                        Self::process_cell(
                            worksheet,
                            std::mem::take(&mut cell),
                            &mut position,
                            shared_strings,
                            cell_styles,
                            &mut style_map,
                        )?;
                    } else {
                        in_cell = true;
                    }
                }
                b"v" if in_cell => in_value = !is_empty,
                // an empty <f> follows a shared formula
                b"f" if in_cell => {
                    cell.formula = Some(String::new());
                    if attr(&e, b"t").as_deref() == Some("shared") {
                        cell.shared_index = attr(&e, b"si");
                    }
                    in_formula = !is_empty;
                }
                b"is" if in_cell => in_inline_str = !is_empty,
                b"t" if in_inline_str => in_inline_text = !is_empty,
                b"mergeCell" => {
                    if let Some(range) = attr(&e, b"ref").and_then(|r| CellRange::parse(&r).ok()) {
                        if let Err(err) = worksheet.merge_cells(&range) {
                            log::warn!("sheet '{}': {}", worksheet.name(), err);
                        }
                    }
                }
                b"autoFilter" => {
                    let range = attr(&e, b"ref").and_then(|r| CellRange::parse(&r).ok());
                    worksheet.set_auto_filter(range);
                }
                b"sheetFormatPr" => {
                    if let Some(level) = attr(&e, b"outlineLevelRow").and_then(|v| v.parse().ok()) {
                        worksheet.set_outline_level_row(level);
                    }
                }
                b"rowBreaks" => {
                    row_breaks = Some(PageBreaks {
                        manual_break_count: attr(&e, b"manualBreakCount").and_then(|v| v.parse().ok()),
                        count: attr(&e, b"count").and_then(|v| v.parse().ok()),
                        breaks: Vec::new(),
                    });
                    in_row_breaks = !is_empty;
                }
                b"brk" if in_row_breaks => {
                    if let (Some(breaks), Some(id)) = (
                        row_breaks.as_mut(),
                        attr(&e, b"id").and_then(|v| v.parse().ok()),
                    ) {
                        let manual = attr(&e, b"man").map_or(false, |v| is_true(&v));
                        breaks.breaks.push(PageBreak { id, manual });
                    }
                }
                b"drawing" => {
                    if let Some(id) = attr_local(&e, b"id") {
                        drawing_ids.push(id);
                    }
                }
                _ => {}
            }

            buf.clear();
        }

        worksheet.set_row_breaks(row_breaks);
        log::debug!(
            "sheet '{}': {} styles in use, {} drawing(s)",
            worksheet.name(),
            worksheet.styles().len(),
            drawing_ids.len()
        );
        Ok(drawing_ids)
    }

    fn apply_row_attrs(worksheet: &mut Worksheet, e: &BytesStart<'_>, position: &mut GridPosition) {
        let row = match attr(e, b"r").and_then(|r| r.parse::<u32>().ok()) {
            Some(r) => r.saturating_sub(1), // 1-based to 0-based
            None => position.row.map_or(0, |r| r.saturating_add(1)),
        };
        position.row = Some(row);
        position.next_col = 0;

        let info = RowInfo {
            hidden: attr(e, b"hidden").map_or(false, |v| is_true(&v)),
            outline_level: attr(e, b"outlineLevel")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            collapsed: attr(e, b"collapsed").map_or(false, |v| is_true(&v)),
        };
        worksheet.set_row_info(row, info);
    }

    /// The master of a shared formula records its text; followers get a
    /// copy of it (not shifted to their own position).
    fn resolve_shared_formula(cell: &mut PendingCell, shared: &mut HashMap<String, String>) {
        let (Some(si), Some(formula)) = (cell.shared_index.as_ref(), cell.formula.as_mut()) else {
            return;
        };
        if formula.is_empty() {
            if let Some(master) = shared.get(si) {
                formula.clone_from(master);
            }
        } else {
            shared.insert(si.clone(), formula.clone());
        }
    }

    fn process_cell(
        worksheet: &mut Worksheet,
        cell: PendingCell,
        position: &mut GridPosition,
        shared_strings: &[String],
        cell_styles: &[Style],
        style_map: &mut HashMap<u32, u32>,
    ) -> XlsxResult<()> {
        let (row, col) = match cell.reference.as_deref() {
            Some(cell_ref) => {
                let addr = CellAddress::parse(cell_ref).map_err(|e| {
                    XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
                })?;
                (addr.row, addr.col)
            }
            None => (position.row.unwrap_or(0), position.next_col),
        };
        position.row = Some(row);
        position.next_col = col.saturating_add(1);

        let value = match cell.value.as_deref() {
            None => CellValue::Empty,
            Some(v) => match cell.cell_type.as_deref() {
                // Shared string
                Some("s") => {
                    let idx: usize = v.trim().parse().map_err(|_| {
                        XlsxError::Parse(format!("Invalid shared string index: {}", v))
                    })?;
                    let s = shared_strings.get(idx).ok_or_else(|| {
                        XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                    })?;
                    CellValue::String(s.clone())
                }
                Some("b") => CellValue::Boolean(is_true(v)),
                Some("e") => CellError::parse(v)
                    .map(CellValue::Error)
                    .unwrap_or_else(|| CellValue::string(v)),
                Some("str") => CellValue::String(decode_excel_escapes(v)),
                Some("inlineStr") => CellValue::string(v),
                Some("d") => iso_to_serial(v)
                    .map(CellValue::Number)
                    .unwrap_or_else(|| CellValue::string(v)),
                // Number (default type or explicit "n")
                _ => v
                    .trim()
                    .parse::<f64>()
                    .map(CellValue::Number)
                    .unwrap_or_else(|_| CellValue::string(v)),
            },
        };

        let style_index = match cell.style {
            Some(xf) if xf > 0 => *style_map.entry(xf).or_insert_with(|| {
                let style = cell_styles.get(xf as usize).cloned().unwrap_or_default();
                worksheet.styles_mut().get_or_insert(style)
            }),
            _ => 0,
        };

        let formula = cell
            .formula
            .map(|f| f.strip_prefix('=').map(str::to_string).unwrap_or(f));

        worksheet.insert_cell(
            row,
            col,
            CellData {
                value,
                formula,
                style_index,
            },
        )?;
        Ok(())
    }

    /// Worksheet markup without the cell table. Unreadable markup is logged
    /// and left out.
    fn read_worksheet_markup<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
    ) -> Option<sheetmark_core::MarkupNode> {
        let file = archive.by_name(path).ok()?;
        match read_markup(BufReader::new(file), &["sheetData"]) {
            Ok(markup) => Some(markup),
            Err(e) => {
                log::warn!("{}: markup not available: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("line1_x000d__x000a_line2"), "line1\r\nline2");
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
        // Incomplete sequences are left as-is
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
    }

    #[test]
    fn test_resolve_part() {
        assert_eq!(
            resolve_part("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_part("xl/worksheets/sheet1.xml", "../drawings/drawing1.xml"),
            "xl/drawings/drawing1.xml"
        );
        assert_eq!(resolve_part("", "xl/workbook.xml"), "xl/workbook.xml");
        assert_eq!(resolve_part("xl/workbook.xml", "/xl/styles.xml"), "xl/styles.xml");
    }

    #[test]
    fn test_rels_part() {
        assert_eq!(rels_part("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(
            rels_part("xl/drawings/drawing1.xml"),
            "xl/drawings/_rels/drawing1.xml.rels"
        );
        assert_eq!(rels_part(""), "_rels/.rels");
    }

    #[test]
    fn test_iso_to_serial() {
        assert_eq!(iso_to_serial("1900-01-01"), Some(2.0));
        assert_eq!(iso_to_serial("2024-01-01T12:00:00"), Some(45292.5));
        assert_eq!(iso_to_serial("yesterday"), None);
    }
}
