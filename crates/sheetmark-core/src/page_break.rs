//! Horizontal page breaks (`rowBreaks`)

/// One page break. The break falls below row `id` (1-based, as stored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBreak {
    /// Row the break follows
    pub id: u32,
    /// Inserted by the user rather than by automatic pagination
    pub manual: bool,
}

/// The row page break container of a worksheet
///
/// The two counters are kept exactly as declared in the file; they can
/// disagree with `breaks.len()` when the producer wrote only one of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageBreaks {
    /// Declared `manualBreakCount`
    pub manual_break_count: Option<u32>,
    /// Declared `count`
    pub count: Option<u32>,
    /// Enumerated `brk` entries
    pub breaks: Vec<PageBreak>,
}

impl PageBreaks {
    /// Container with the given manual breaks and both counters set
    pub fn manual(rows: impl IntoIterator<Item = u32>) -> Self {
        let breaks: Vec<_> = rows
            .into_iter()
            .map(|id| PageBreak { id, manual: true })
            .collect();
        let n = breaks.len() as u32;
        Self {
            manual_break_count: Some(n),
            count: Some(n),
            breaks,
        }
    }
}
