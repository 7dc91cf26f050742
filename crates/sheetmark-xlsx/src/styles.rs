//! Reads `xl/styles.xml` into resolved cell styles

use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use sheetmark_core::style::NORMAL_STYLE;
use sheetmark_core::{FontStyle, Style};

/// One resolved style per `cellXfs` entry, indexed by a cell's `s` attribute
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();

    let mut fonts: Vec<FontStyle> = Vec::new();
    let mut current_font: Option<FontStyle> = None;

    // (fontId, xfId) of each cellXfs entry
    let mut cell_xfs: Vec<(Option<u32>, Option<u32>)> = Vec::new();
    // fontId of each cellStyleXfs entry
    let mut style_xfs: Vec<u32> = Vec::new();
    // (name, xfId) of each cellStyles entry
    let mut named_styles: Vec<(String, u32)> = Vec::new();

    let mut in_cell_xfs = false;
    let mut in_style_xfs = false;
    let mut in_dxfs = false;

    loop {
        let event = xml_reader.read_event_into(&mut buf);
        let (e, is_start) = match event {
            Ok(Event::Start(e)) => (e, true),
            Ok(Event::Empty(e)) => (e, false),
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"font" => {
                        if let Some(f) = current_font.take() {
                            fonts.push(f);
                        }
                    }
                    b"cellXfs" => in_cell_xfs = false,
                    b"cellStyleXfs" => in_style_xfs = false,
                    b"dxfs" => in_dxfs = false,
                    _ => {}
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

        match e.name().as_ref() {
            b"cellXfs" if is_start => in_cell_xfs = true,
            b"cellStyleXfs" if is_start => in_style_xfs = true,
            b"dxfs" if is_start => in_dxfs = true,

            // differential formats are not cell fonts
            b"font" if !in_dxfs => {
                let font = FontStyle::default();
                if is_start {
                    current_font = Some(font);
                } else {
                    fonts.push(font);
                }
            }
            b"name" => {
                if let (Some(font), Some(v)) = (current_font.as_mut(), attr(&e, b"val")) {
                    font.name = v;
                }
            }
            b"sz" => {
                if let (Some(font), Some(v)) = (current_font.as_mut(), attr(&e, b"val")) {
                    if let Ok(size) = v.parse() {
                        font.size = size;
                    }
                }
            }
            b"b" => {
                if let Some(font) = current_font.as_mut() {
                    font.bold = flag(&e);
                }
            }
            b"i" => {
                if let Some(font) = current_font.as_mut() {
                    font.italic = flag(&e);
                }
            }

            b"xf" if in_cell_xfs => {
                let font_id = attr(&e, b"fontId").and_then(|v| v.parse().ok());
                let xf_id = attr(&e, b"xfId").and_then(|v| v.parse().ok());
                cell_xfs.push((font_id, xf_id));
            }
            b"xf" if in_style_xfs => {
                let font_id = attr(&e, b"fontId").and_then(|v| v.parse().ok()).unwrap_or(0);
                style_xfs.push(font_id);
            }
            b"cellStyle" => {
                let name = attr(&e, b"name");
                let xf_id = attr(&e, b"xfId").and_then(|v| v.parse().ok());
                if let (Some(name), Some(xf_id)) = (name, xf_id) {
                    named_styles.push((name, xf_id));
                }
            }
            _ => {}
        }

        buf.clear();
    }

    if cell_xfs.is_empty() {
        return Ok(vec![Style::default()]);
    }

    let styles = cell_xfs
        .into_iter()
        .map(|(font_id, xf_id)| {
            // an xf without its own font inherits the one of its cell style
            let font_id = font_id
                .or_else(|| xf_id.and_then(|id| style_xfs.get(id as usize).copied()))
                .unwrap_or(0);
            let named_style = xf_id
                .and_then(|id| named_styles.iter().find(|(_, x)| *x == id))
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| NORMAL_STYLE.to_string());
            Style {
                font: fonts.get(font_id as usize).cloned().unwrap_or_default(),
                named_style,
            }
        })
        .collect::<Vec<_>>();
    log::debug!(
        "styles.xml: {} fonts, {} cell formats, {} named styles",
        fonts.len(),
        styles.len(),
        named_styles.len()
    );
    Ok(styles)
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Boolean font property: present means on unless `val` says otherwise
fn flag(e: &BytesStart<'_>) -> bool {
    attr(e, b"val").map_or(true, |v| v != "0" && v != "false")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="24"/><name val="Calibri Light"/></font>
    <font><b val="0"/><i/><sz val="10"/><name val="Arial"/></font>
  </fonts>
  <cellStyleXfs count="2">
    <xf numFmtId="0" fontId="0"/>
    <xf numFmtId="0" fontId="1"/>
  </cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" xfId="1"/>
    <xf numFmtId="0" fontId="2" xfId="0"/>
  </cellXfs>
  <cellStyles count="2">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
    <cellStyle name="Title" xfId="1" builtinId="15"/>
  </cellStyles>
  <dxfs count="1"><dxf><font><b/><sz val="40"/></font></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_resolves_fonts_and_named_styles() {
        let styles = read_styles_xml(STYLES.as_bytes()).unwrap();
        assert_eq!(styles.len(), 3);

        assert_eq!(styles[0].named_style, "Normal");
        assert!(!styles[0].font.bold);

        assert_eq!(styles[1].named_style, "Title");
        assert_eq!(styles[1].font.size, 24.0);
        assert!(styles[1].font.bold);
        assert_eq!(styles[1].font.name, "Calibri Light");

        assert!(!styles[2].font.bold);
        assert!(styles[2].font.italic);
    }

    #[test]
    fn test_empty_stylesheet_yields_default() {
        let xml = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"/>"#;
        let styles = read_styles_xml(xml.as_bytes()).unwrap();
        assert_eq!(styles, vec![Style::default()]);
    }
}
