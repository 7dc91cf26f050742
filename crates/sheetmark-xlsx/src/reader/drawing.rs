//! Drawing parts: anchors and the objects placed on them

use std::io::{BufReader, Read, Seek};

use super::{chart::chart_from_markup, read_relationships};
use crate::error::XlsxResult;
use crate::markup::read_markup;
use sheetmark_core::{ns, ChartAnchor, Drawing, MarkupNode};

const REL_CHART: &str = "/chart";

/// Read every anchored object of a drawing part.
///
/// Charts whose part cannot be read are left out with a warning; the rest of
/// the drawing is still returned.
pub(crate) fn read_drawing<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> XlsxResult<Vec<Drawing>> {
    let markup = match archive.by_name(path) {
        Ok(file) => read_markup(BufReader::new(file), &[])?,
        Err(_) => {
            log::warn!("drawing part {} is missing", path);
            return Ok(Vec::new());
        }
    };
    let rels = read_relationships(archive, path)?;

    let mut objects = Vec::new();
    for anchor_node in &markup.children {
        let anchor = match anchor_node.name.local.as_str() {
            "twoCellAnchor" | "oneCellAnchor" | "absoluteAnchor" => read_anchor(anchor_node),
            _ => continue,
        };

        for object in &anchor_node.children {
            if object.name.ns.as_deref() != Some(ns::SPREADSHEET_DRAWING) {
                continue;
            }
            let name = object
                .descendant(ns::SPREADSHEET_DRAWING, "cNvPr")
                .and_then(|n| n.attr("name"))
                .map(str::to_string);

            match object.name.local.as_str() {
                "graphicFrame" => {
                    let Some(chart_id) = object
                        .descendant(ns::CHART, "chart")
                        .and_then(|c| c.attr_ns(ns::RELATIONSHIPS, "id"))
                    else {
                        log::debug!("{}: graphic frame without a chart", path);
                        continue;
                    };
                    let Some(rel) = rels.get(chart_id).filter(|r| r.rel_type.ends_with(REL_CHART))
                    else {
                        log::warn!("{}: chart {} has no target", path, chart_id);
                        continue;
                    };
                    match read_chart_part(archive, &rel.target) {
                        Ok(Some(chart_markup)) => {
                            let mut chart = chart_from_markup(chart_markup);
                            chart.name = name;
                            chart.anchor = anchor;
                            objects.push(Drawing::Chart(Box::new(chart)));
                        }
                        Ok(None) => log::warn!("chart part {} is missing", rel.target),
                        Err(e) => log::warn!("chart part {} is unreadable: {}", rel.target, e),
                    }
                }
                "pic" => objects.push(Drawing::Picture { name, anchor }),
                "sp" | "cxnSp" | "grpSp" => objects.push(Drawing::Shape { name, anchor }),
                _ => {}
            }
        }
    }

    log::debug!("{}: {} drawing object(s)", path, objects.len());
    Ok(objects)
}

fn read_chart_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> XlsxResult<Option<MarkupNode>> {
    match archive.by_name(path) {
        Ok(file) => read_markup(BufReader::new(file), &[]).map(Some),
        Err(_) => Ok(None),
    }
}

/// Cell corners of an anchor; a one-cell anchor ends where it starts
fn read_anchor(anchor: &MarkupNode) -> ChartAnchor {
    let marker = |local: &str| {
        anchor.child(ns::SPREADSHEET_DRAWING, local).map(|m| {
            let index = |name: &str| {
                m.child(ns::SPREADSHEET_DRAWING, name)
                    .and_then(|n| n.text.trim().parse::<u32>().ok())
                    .unwrap_or(0)
            };
            (index("row"), index("col"))
        })
    };

    let (from_row, from_col) = marker("from").unwrap_or((0, 0));
    let (to_row, to_col) = marker("to").unwrap_or((from_row, from_col));
    ChartAnchor::new(
        from_row,
        from_col.min(u16::MAX as u32) as u16,
        to_row,
        to_col.min(u16::MAX as u32) as u16,
    )
}
