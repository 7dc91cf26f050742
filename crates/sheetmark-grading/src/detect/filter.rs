//! Autofilter facts

use sheetmark_core::{ns, CellRange, Worksheet};
use tracing::debug;

use super::{contains_ignore_case, Detection};

/// Range covered by the sheet's autofilter
pub fn autofilter_range(sheet: &Worksheet) -> Detection<CellRange> {
    Detection::from(sheet.auto_filter()).or_else(|| {
        let range = sheet
            .markup()
            .and_then(|m| m.child(ns::SPREADSHEETML, "autoFilter"))
            .and_then(|filter| filter.attr("ref"))
            .and_then(|r| CellRange::parse(r).ok());
        Detection::from(range)
    })
}

/// Column of the filter's header row whose text contains `header`
pub fn filter_column(sheet: &Worksheet, range: &CellRange, header: &str) -> Detection<u16> {
    let row = range.start.row;
    let column = (range.start.col..=range.end.col)
        .find(|&col| contains_ignore_case(&sheet.text_at(row, col), header));
    debug!(sheet = sheet.name(), header, ?column, "filter column");
    Detection::from(column)
}

/// Tally of the visible data rows of one filter column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeCheck {
    /// Data rows not hidden
    pub visible: usize,
    /// Visible rows whose value lies in the range
    pub in_range: usize,
    /// Visible rows whose value lies outside the range
    pub out_of_range: usize,
    /// Visible rows without a numeric value
    pub skipped: usize,
}

impl RangeCheck {
    /// At least one row is visible and none of them is out of range
    pub fn passed(&self) -> bool {
        self.out_of_range == 0 && self.visible > 0
    }
}

/// Check the visible data rows of `col` against the closed range
/// `[min, max]`.
///
/// The first row of `range` is the header. Hidden rows are left out. Values
/// that do not parse as numbers are counted as skipped and do not fail the
/// check.
pub fn visible_range_check(
    sheet: &Worksheet,
    range: &CellRange,
    col: u16,
    min: f64,
    max: f64,
) -> RangeCheck {
    let mut check = RangeCheck::default();

    // whole-column filters stop at the last populated row
    let last_row = sheet
        .used_range()
        .map_or(range.start.row, |used| used.end.row.min(range.end.row));

    for row in range.start.row + 1..=last_row {
        if sheet.is_row_hidden(row) {
            continue;
        }
        check.visible += 1;

        match sheet.value_at(row, col).coerce_number() {
            Some(value) if value >= min && value <= max => check.in_range += 1,
            Some(value) => {
                debug!(row = row + 1, value, min, max, "value outside filter range");
                check.out_of_range += 1;
            }
            None => check.skipped += 1,
        }
    }

    debug!(sheet = sheet.name(), ?check, "filter range check");
    check
}
