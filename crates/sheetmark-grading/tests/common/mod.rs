//! In-memory `.xlsx` packages for end-to-end grading tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

/// Cell format 1 is the Title style at 24pt bold. Format 2 uses the Title
/// style at 18pt without bold.
pub const TITLE_24_BOLD: u32 = 1;
pub const TITLE_18_PLAIN: u32 = 2;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="24"/><name val="Calibri Light"/></font>
    <font><sz val="18"/><name val="Calibri Light"/></font>
  </fonts>
  <cellStyleXfs count="2"><xf fontId="0"/><xf fontId="1"/></cellStyleXfs>
  <cellXfs count="3">
    <xf fontId="0" xfId="0"/>
    <xf fontId="1" xfId="1"/>
    <xf fontId="2" xfId="1"/>
  </cellXfs>
  <cellStyles count="2">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
    <cellStyle name="Title" xfId="1" builtinId="15"/>
  </cellStyles>
</styleSheet>"#;

const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_DRAWING: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
const REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";

/// A chart placed on a sheet with a two-cell anchor
pub struct ChartPart {
    /// `(from_col, from_row, to_col, to_row)`, 0-based
    pub anchor: (u16, u32, u16, u32),
    /// Full `c:chartSpace` document
    pub xml: String,
}

/// One worksheet of a package
pub struct SheetPart {
    name: String,
    rows: Vec<String>,
    extra: String,
    sheet_format: Option<String>,
    chart: Option<ChartPart>,
}

impl SheetPart {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
            extra: String::new(),
            sheet_format: None,
            chart: None,
        }
    }

    /// Add a `<row>` with its attributes and cells
    pub fn row(mut self, number: u32, attrs: &str, cells: &[Cell]) -> Self {
        let cells: String = cells.iter().map(|c| c.to_xml(number)).collect();
        self.rows
            .push(format!(r#"<row r="{number}" {attrs}>{cells}</row>"#));
        self
    }

    /// Elements after `sheetData` (autoFilter, mergeCells, rowBreaks)
    pub fn extra(mut self, xml: &str) -> Self {
        self.extra.push_str(xml);
        self
    }

    /// Attributes of `sheetFormatPr`
    pub fn sheet_format(mut self, attrs: &str) -> Self {
        self.sheet_format = Some(attrs.to_string());
        self
    }

    pub fn chart(mut self, chart: ChartPart) -> Self {
        self.chart = Some(chart);
        self
    }

    fn to_xml(&self) -> String {
        let format = self
            .sheet_format
            .as_deref()
            .map(|attrs| format!(r#"<sheetFormatPr defaultRowHeight="15" {attrs}/>"#))
            .unwrap_or_default();
        let drawing = if self.chart.is_some() {
            r#"<drawing r:id="rId1"/>"#
        } else {
            ""
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
           xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
{format}<sheetData>{}</sheetData>{}{drawing}
</worksheet>"#,
            self.rows.concat(),
            self.extra
        )
    }
}

/// A cell in a row
pub enum Cell {
    Text(&'static str, &'static str),
    Styled(&'static str, &'static str, u32),
    Number(&'static str, f64),
    Formula(&'static str, &'static str, f64),
}

impl Cell {
    fn to_xml(&self, row: u32) -> String {
        match self {
            Cell::Text(col, text) => {
                format!(r#"<c r="{col}{row}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(text))
            }
            Cell::Styled(col, text, style) => format!(
                r#"<c r="{col}{row}" s="{style}" t="inlineStr"><is><t>{}</t></is></c>"#,
                escape(text)
            ),
            Cell::Number(col, value) => format!(r#"<c r="{col}{row}"><v>{value}</v></c>"#),
            Cell::Formula(col, formula, value) => {
                format!(r#"<c r="{col}{row}"><f>{formula}</f><v>{value}</v></c>"#)
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Quote and escape a sheet name for use in a chart reference
pub fn sheet_ref(sheet: &str, range: &str) -> String {
    format!("'{}'!{range}", escape(sheet))
}

/// A `c:chartSpace` document
pub fn chart_space(plot_area: &str, legend: &str, chart_sp_pr: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart"
              xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <c:chart><c:plotArea><c:layout/>{plot_area}</c:plotArea>{legend}</c:chart>{chart_sp_pr}
</c:chartSpace>"#
    )
}

/// A series with category and value references
pub fn series(categories: &str, values: &str) -> String {
    format!(
        r#"<c:ser><c:idx val="0"/><c:cat><c:strRef><c:f>{categories}</c:f></c:strRef></c:cat><c:val><c:numRef><c:f>{values}</c:f></c:numRef></c:val></c:ser>"#
    )
}

fn drawing_xml(anchor: (u16, u32, u16, u32)) -> String {
    let (from_col, from_row, to_col, to_row) = anchor;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing"
          xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <xdr:twoCellAnchor>
    <xdr:from><xdr:col>{from_col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{from_row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:to><xdr:col>{to_col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{to_row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
    <xdr:graphicFrame macro="">
      <xdr:nvGraphicFramePr><xdr:cNvPr id="2" name="Chart 1"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr>
      <a:graphic>
        <a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart">
          <c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart"
                   xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:id="rId1"/>
        </a:graphicData>
      </a:graphic>
    </xdr:graphicFrame>
    <xdr:clientData/>
  </xdr:twoCellAnchor>
</xdr:wsDr>"#
    )
}

fn relationships(entries: &[(String, &str, String)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, rel_type, target)| {
            format!(r#"<Relationship Id="{id}" Type="{rel_type}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

/// Assemble a package from worksheets, in tab order
pub fn package(sheets: Vec<SheetPart>) -> Vec<u8> {
    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".into(), CONTENT_TYPES.into()),
        ("_rels/.rels".into(), ROOT_RELS.into()),
        ("xl/styles.xml".into(), STYLES.into()),
    ];

    let mut sheet_entries = String::new();
    let mut workbook_rels = Vec::new();
    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        sheet_entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(&sheet.name)
        ));
        workbook_rels.push((format!("rId{n}"), REL_WORKSHEET, format!("worksheets/sheet{n}.xml")));
        parts.push((format!("xl/worksheets/sheet{n}.xml"), sheet.to_xml()));

        if let Some(chart) = &sheet.chart {
            parts.push((
                format!("xl/worksheets/_rels/sheet{n}.xml.rels"),
                relationships(&[(
                    "rId1".into(),
                    REL_DRAWING,
                    format!("../drawings/drawing{n}.xml"),
                )]),
            ));
            parts.push((format!("xl/drawings/drawing{n}.xml"), drawing_xml(chart.anchor)));
            parts.push((
                format!("xl/drawings/_rels/drawing{n}.xml.rels"),
                relationships(&[("rId1".into(), REL_CHART, format!("../charts/chart{n}.xml"))]),
            ));
            parts.push((format!("xl/charts/chart{n}.xml"), chart.xml.clone()));
        }
    }
    let styles_id = format!("rId{}", sheets.len() + 1);
    workbook_rels.push((styles_id, REL_STYLES, "styles.xml".to_string()));

    parts.push((
        "xl/workbook.xml".into(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>{sheet_entries}</sheets>
</workbook>"#
        ),
    ));
    parts.push(("xl/_rels/workbook.xml.rels".into(), relationships(&workbook_rels)));

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default();
        for (name, content) in &parts {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

/// A workbook that earns every point of P09
pub fn p09_full_marks() -> Vec<u8> {
    use Cell::*;

    let report = SheetPart::new("Sales")
        .row(1, "", &[Styled("A", "Quarterly Sales", TITLE_24_BOLD)])
        .row(2, "", &[Text("A", "Region"), Text("B", "Total")])
        .row(3, "", &[Text("A", "East"), Number("B", 38_000.0)])
        .row(4, r#"hidden="1""#, &[Text("A", "West"), Number("B", 50_000.0)])
        .row(5, "", &[Text("A", "North"), Number("B", 45_000.0)])
        .extra(r#"<autoFilter ref="A2:B5"><filterColumn colId="1"/></autoFilter>"#);

    let summary_chart = chart_space(
        &format!(
            r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/>{}</c:barChart><c:spPr><a:pattFill prst="pct10"/></c:spPr>"#,
            series("Summary!$A$2:$A$3", "Summary!$B$2:$B$3")
        ),
        r#"<c:legend><c:legendPos val="r"/><c:overlay val="1"/></c:legend>"#,
        r#"<c:spPr><a:pattFill prst="pct50"/></c:spPr>"#,
    );
    let summary = SheetPart::new("Summary")
        .row(1, "", &[Text("A", "Quarter"), Text("B", "Sales")])
        .row(2, "", &[Text("A", "Q1"), Number("B", 10.0)])
        .row(3, "", &[Text("A", "Q2"), Number("B", 12.0)])
        .chart(ChartPart {
            anchor: (3, 1, 9, 15),
            xml: summary_chart,
        });

    p09_with(report, summary, shirt_orders(true))
}

/// The subtotal sheet, its grand total typed in or computed
pub fn shirt_orders(grand_total_formula: bool) -> SheetPart {
    use Cell::*;

    let grand = if grand_total_formula {
        Formula("D", "SUBTOTAL(9,D2:D6)", 240.0)
    } else {
        Number("D", 240.0)
    };
    SheetPart::new("Shirt Orders")
        .sheet_format(r#"outlineLevelRow="2""#)
        .row(1, "", &[Text("A", "Color"), Text("D", "Amount")])
        .row(2, r#"outlineLevel="2""#, &[Text("A", "Blue"), Number("D", 120.0)])
        .row(3, r#"outlineLevel="1""#, &[Text("A", "Blue Total"), Formula("D", "SUBTOTAL(9,D2:D2)", 120.0)])
        .row(4, r#"outlineLevel="2""#, &[Text("A", "Red"), Number("D", 80.0)])
        .row(5, r#"outlineLevel="2""#, &[Text("A", "Red"), Number("D", 40.0)])
        .row(6, r#"outlineLevel="1""#, &[Text("A", "Red Total"), Formula("D", "SUBTOTAL(9,D4:D5)", 120.0)])
        .row(7, "", &[Text("A", "Grand Total"), grand])
        .extra(r#"<rowBreaks count="1" manualBreakCount="1"><brk id="3" max="16383" man="1"/></rowBreaks>"#)
}

/// Farmers & Market with a 3-D pie over Product and Total at J2:P15
pub fn farmers_market() -> SheetPart {
    use Cell::*;

    let sheet = "Farmers & Market";
    let pie = chart_space(
        &format!(
            r#"<c:pie3DChart><c:varyColors val="1"/>{}</c:pie3DChart>"#,
            series(&sheet_ref(sheet, "$A$2:$A$3"), &sheet_ref(sheet, "$B$2:$B$3"))
        ),
        r#"<c:legend><c:legendPos val="b"/></c:legend>"#,
        "",
    );
    SheetPart::new(sheet)
        .row(1, "", &[Text("A", "Product"), Text("B", "Total")])
        .row(2, "", &[Text("A", "Apples"), Number("B", 500.0)])
        .row(3, "", &[Text("A", "Pears"), Number("B", 300.0)])
        .chart(ChartPart {
            anchor: (9, 1, 15, 14),
            xml: pie,
        })
}

/// Report, Summary and Shirt Orders sheets followed by Farmers & Market
pub fn p09_with(report: SheetPart, summary: SheetPart, orders: SheetPart) -> Vec<u8> {
    package(vec![report, summary, orders, farmers_market()])
}
