//! Subtotal report facts: grouping, page breaks and the grand total

use sheetmark_core::{ns, CellAddress, MarkupNode, Worksheet};
use tracing::debug;

use super::{contains_ignore_case, Detection};

/// Label heuristics only look at the leading columns of a report
const LABEL_COLUMNS: u16 = 10;

/// Independent signs that a sheet carries a subtotal outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupingSignals {
    /// Rows with an outline level above zero
    pub outlined_rows: usize,
    /// Label cells mentioning "Total" or "Subtotal" but not "Grand"
    pub total_labels: usize,
    /// Cells whose formula uses SUBTOTAL
    pub subtotal_formulas: usize,
    /// Sheet-level `outlineLevelRow`
    pub outline_level_row: u8,
    /// Rows holding at least one subtotal label
    pub group_rows: usize,
}

impl GroupingSignals {
    /// Number of signals that fired, out of four
    pub fn signals(&self) -> usize {
        [
            self.outlined_rows > 0,
            self.total_labels > 1,
            self.subtotal_formulas > 1,
            self.outline_level_row > 0,
        ]
        .into_iter()
        .filter(|&fired| fired)
        .count()
    }

    /// A grouping needs two signals to agree
    pub fn is_present(&self) -> bool {
        self.signals() >= 2
    }
}

/// Collect the grouping signals of a sheet
pub fn subtotal_grouping(sheet: &Worksheet) -> GroupingSignals {
    let mut signals = GroupingSignals {
        outlined_rows: sheet.rows().filter(|(_, info)| info.outline_level > 0).count(),
        ..GroupingSignals::default()
    };

    let mut last_label_row = None;
    for ((row, col), cell) in sheet.cells() {
        if col < LABEL_COLUMNS {
            let text = cell.text();
            if contains_ignore_case(&text, "total") && !contains_ignore_case(&text, "grand") {
                signals.total_labels += 1;
                if last_label_row != Some(row) {
                    signals.group_rows += 1;
                    last_label_row = Some(row);
                }
            }
        }
        if cell
            .formula
            .as_deref()
            .map_or(false, |f| contains_ignore_case(f, "SUBTOTAL"))
        {
            signals.subtotal_formulas += 1;
        }
    }

    signals.outline_level_row = match sheet.outline_level_row() {
        0 => sheet
            .markup()
            .and_then(|m| m.child(ns::SPREADSHEETML, "sheetFormatPr"))
            .and_then(|pr| pr.attr("outlineLevelRow"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        level => level,
    };

    debug!(sheet = sheet.name(), ?signals, "subtotal grouping");
    signals
}

/// The attributes of a `rowBreaks` container that matter for counting
#[derive(Debug)]
struct BreakContainer {
    manual_break_count: Option<u32>,
    count: Option<u32>,
    breaks: usize,
}

impl BreakContainer {
    fn from_markup(node: &MarkupNode) -> Self {
        let number = |name: &str| node.attr(name).and_then(|v| v.trim().parse().ok());
        Self {
            manual_break_count: number("manualBreakCount"),
            count: number("count"),
            breaks: node.children.iter().filter(|c| c.name.local == "brk").count(),
        }
    }
}

/// Number of manual row page breaks.
///
/// Explicit counters win over enumerated `brk` entries. A container with
/// neither is what "page break between groups" leaves behind, so the count
/// falls back to the number of subtotal groups, then to one.
pub fn page_break_count(sheet: &Worksheet) -> Detection<u32> {
    let container = sheet
        .row_breaks()
        .map(|breaks| BreakContainer {
            manual_break_count: breaks.manual_break_count,
            count: breaks.count,
            breaks: breaks.breaks.len(),
        })
        .or_else(|| {
            sheet
                .markup()
                .and_then(|m| m.descendant_by_local_name("rowBreaks"))
                .map(BreakContainer::from_markup)
        });

    let Some(container) = container else {
        return Detection::NotDetected;
    };
    debug!(sheet = sheet.name(), ?container, "row break container");

    let positive = |n: Option<u32>| Detection::from(n.filter(|&n| n > 0));
    positive(container.manual_break_count)
        .or_else(|| positive(container.count))
        .or_else(|| positive(Some(container.breaks as u32)))
        .or_else(|| {
            let grouping = subtotal_grouping(sheet);
            if grouping.is_present() && grouping.group_rows > 0 {
                Detection::DetectedDefault(grouping.group_rows as u32)
            } else {
                Detection::NotDetected
            }
        })
        .or_else(|| Detection::DetectedDefault(1))
}

/// The grand total of a report
#[derive(Debug, Clone, PartialEq)]
pub struct GrandTotal {
    /// Cell holding the total
    pub address: CellAddress,
    /// Its numeric value
    pub value: f64,
    /// Computed by a formula rather than typed in
    pub has_formula: bool,
}

/// Find the grand total: the bottom-most row with a "Grand Total" label,
/// and on it the right-most numeric cell.
pub fn grand_total(sheet: &Worksheet) -> Detection<GrandTotal> {
    let Some(used) = sheet.used_range() else {
        return Detection::NotDetected;
    };
    let label_end = used.end.col.min(LABEL_COLUMNS - 1);

    for row in (used.start.row..=used.end.row).rev() {
        let labelled = (0..=label_end).any(|col| {
            let text = sheet.text_at(row, col);
            contains_ignore_case(&text, "grand") && contains_ignore_case(&text, "total")
        });
        if !labelled {
            continue;
        }

        let found = (0..=used.end.col).rev().find_map(|col| {
            let cell = sheet.cell_at(row, col)?;
            let value = cell.value.coerce_number()?;
            Some(GrandTotal {
                address: CellAddress::new(row, col),
                value,
                has_formula: cell.has_formula(),
            })
        });
        if let Some(total) = found {
            debug!(sheet = sheet.name(), ?total, "grand total");
            return Detection::Detected(total);
        }
    }
    Detection::NotDetected
}
