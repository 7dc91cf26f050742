//! Row metadata

/// Row metadata relevant to filtering and outlining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowInfo {
    /// Row is hidden (by a filter, grouping collapse or manually)
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Row is collapsed (in outline)
    pub collapsed: bool,
}

impl RowInfo {
    /// Check if this row has any non-default settings
    pub fn has_custom_settings(&self) -> bool {
        self.hidden || self.outline_level > 0 || self.collapsed
    }
}
