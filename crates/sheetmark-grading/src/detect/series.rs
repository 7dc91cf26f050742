//! Where a chart's data comes from

use lazy_regex::regex;
use sheetmark_core::{ns, Chart, DataReference, SheetReference, Worksheet};
use tracing::debug;

use super::{contains_ignore_case, Detection};

/// Expected data columns of a chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceRule {
    /// Header text of the category column (e.g. "Product")
    pub category_header: String,
    /// Header text of the value column (e.g. "Total")
    pub value_header: String,
    /// Column letters accepted for categories
    pub category_columns: Vec<String>,
    /// Column letters accepted for values
    pub value_columns: Vec<String>,
}

/// Evidence for each half of a chart's data source
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    /// Categories come from the expected column. Holds the header text or
    /// the reference that matched.
    pub category: Detection<String>,
    /// Values come from the expected column
    pub values: Detection<String>,
    /// Reference of the first value series
    pub data_range: Option<String>,
}

impl Provenance {
    /// Number of satisfied halves (0 to 2)
    pub fn satisfied(&self) -> usize {
        usize::from(self.category.is_found()) + usize::from(self.values.is_found())
    }
}

/// One half of the rule: a header word and the columns it may live in
struct Target<'a> {
    header: &'a str,
    columns: &'a [String],
}

impl Target<'_> {
    /// The reference names an accepted column, or spells out the header
    fn literal_match(&self, reference: &str) -> bool {
        referenced_columns(reference)
            .any(|col| self.columns.iter().any(|c| c.eq_ignore_ascii_case(&col)))
            || contains_ignore_case(reference, self.header)
    }

    /// Text of the header cell above the referenced range, if it matches
    fn header_match(&self, sheet: &Worksheet, reference: &str) -> Option<String> {
        header_above(sheet, reference).filter(|text| contains_ignore_case(text, self.header))
    }
}

/// Check a chart's series against the expected category and value columns.
///
/// Each half is a chain of its own: the header cell above each typed series
/// reference, then column letters or the header word in the reference text,
/// then the `c:f` references found anywhere under `c:cat` / `c:val` in the
/// markup.
pub fn series_provenance(chart: &Chart, sheet: &Worksheet, rule: &ProvenanceRule) -> Provenance {
    let category_target = Target {
        header: &rule.category_header,
        columns: &rule.category_columns,
    };
    let value_target = Target {
        header: &rule.value_header,
        columns: &rule.value_columns,
    };

    let category_refs: Vec<&str> = chart
        .series
        .iter()
        .filter_map(|s| s.categories.as_ref().and_then(DataReference::as_formula))
        .collect();
    let value_refs: Vec<&str> = chart
        .series
        .iter()
        .filter_map(|s| s.values.as_formula())
        .collect();

    let category = typed_links(sheet, &category_target, &category_refs)
        .or_else(|| markup_link(chart, sheet, &category_target, "cat"));

    let values = typed_links(sheet, &value_target, &value_refs)
        .or_else(|| {
            // a pie series is usually named after its value column
            let named = chart
                .series
                .iter()
                .filter_map(|s| s.name_reference.as_deref())
                .find_map(|r| cell_text(sheet, r))
                .filter(|text| contains_ignore_case(text, value_target.header));
            Detection::from(named)
        })
        .or_else(|| markup_link(chart, sheet, &value_target, "val"));

    let data_range = value_refs
        .first()
        .map(|r| r.to_string())
        .or_else(|| markup_references(chart, "val").next());

    debug!(?category, ?values, ?data_range, "series provenance");
    Provenance {
        category,
        values,
        data_range,
    }
}

fn typed_links(sheet: &Worksheet, target: &Target<'_>, refs: &[&str]) -> Detection<String> {
    Detection::from(refs.iter().find_map(|r| target.header_match(sheet, r))).or_else(|| {
        let literal = refs.iter().find(|r| target.literal_match(r));
        Detection::from(literal.map(|r| r.to_string()))
    })
}

fn markup_link(
    chart: &Chart,
    sheet: &Worksheet,
    target: &Target<'_>,
    container: &str,
) -> Detection<String> {
    let found = markup_references(chart, container).find_map(|reference| {
        target
            .header_match(sheet, &reference)
            .or_else(|| target.literal_match(&reference).then_some(reference))
    });
    Detection::from(found)
}

/// `c:f` texts under every `c:cat` / `c:val` of the chart part
fn markup_references<'a>(chart: &'a Chart, container: &'a str) -> impl Iterator<Item = String> + 'a {
    chart
        .markup
        .descendants_named(ns::CHART, container)
        .filter_map(|node| node.descendant(ns::CHART, "f"))
        .map(|f| f.text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Absolute column letters a reference mentions (`$B$2:$B$9` -> B, B)
fn referenced_columns(reference: &str) -> impl Iterator<Item = String> + '_ {
    regex!(r"\$([A-Za-z]{1,3})[$:]")
        .captures_iter(reference)
        .map(|caps| caps[1].to_ascii_uppercase())
}

/// The reference, parsed, if it points into this sheet
fn local_reference(sheet: &Worksheet, reference: &str) -> Option<SheetReference> {
    let parsed = SheetReference::parse(reference).ok()?;
    match &parsed.sheet {
        Some(name) if !name.eq_ignore_ascii_case(sheet.name()) => None,
        _ => Some(parsed),
    }
}

fn header_above(sheet: &Worksheet, reference: &str) -> Option<String> {
    let start = local_reference(sheet, reference)?.range.start;
    let row = start.row.checked_sub(1)?;
    Some(sheet.text_at(row, start.col)).filter(|text| !text.is_empty())
}

fn cell_text(sheet: &Worksheet, reference: &str) -> Option<String> {
    let start = local_reference(sheet, reference)?.range.start;
    Some(sheet.text_at(start.row, start.col)).filter(|text| !text.is_empty())
}
