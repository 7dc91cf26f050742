//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellRange, CellValue};
use crate::chart::Chart;
use crate::drawing::Drawing;
use crate::error::{Error, Result};
use crate::markup::MarkupNode;
use crate::page_break::PageBreaks;
use crate::row::RowInfo;
use crate::style::{Style, StylePool};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Populated cells keyed by (row, col)
    cells: BTreeMap<(u32, u16), CellData>,
    /// Styles referenced by cells
    styles: StylePool,
    /// Merged regions
    merged: Vec<CellRange>,
    /// Rows with non-default metadata
    rows: BTreeMap<u32, RowInfo>,
    /// AutoFilter range
    auto_filter: Option<CellRange>,
    /// Horizontal page breaks
    row_breaks: Option<PageBreaks>,
    /// Declared `sheetFormatPr/@outlineLevelRow`
    outline_level_row: u8,
    /// Drawing layer
    drawings: Vec<Drawing>,
    /// Worksheet markup without the cell table
    markup: Option<MarkupNode>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            styles: StylePool::new(),
            merged: Vec::new(),
            rows: BTreeMap::new(),
            auto_filter: None,
            row_breaks: None,
            outline_level_row: 0,
            drawings: Vec::new(),
            markup: None,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell by address (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by row and column
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(&(row, col))
    }

    /// Get a cell's value (Empty if the cell is not populated)
    pub fn value_at(&self, row: u32, col: u16) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cell_at(row, col).map_or(&EMPTY, |c| &c.value)
    }

    /// Display text of a cell ("" if the cell is not populated)
    pub fn text_at(&self, row: u32, col: u16) -> String {
        self.cell_at(row, col).map(CellData::text).unwrap_or_default()
    }

    /// Formula text of a cell, if it holds one
    pub fn formula_at(&self, row: u32, col: u16) -> Option<&str> {
        self.cell_at(row, col).and_then(|c| c.formula.as_deref())
    }

    /// Resolved style of a cell (the default style for unstyled cells)
    pub fn style_at(&self, row: u32, col: u16) -> &Style {
        self.cell_at(row, col)
            .and_then(|c| self.styles.get(c.style_index))
            .unwrap_or_else(|| self.styles.default_style())
    }

    /// Resolved style of a cell by address
    pub fn style(&self, address: &str) -> Result<&Style> {
        let addr = CellAddress::parse(address)?;
        Ok(self.style_at(addr.row, addr.col))
    }

    /// Iterate over populated cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &CellData)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    /// Iterate over populated cells of one row, left to right
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells
            .range((row, 0)..=(row, MAX_COLS - 1))
            .map(|(&(_, col), data)| (col, data))
    }

    /// Get the used range (bounds of all populated cells)
    pub fn used_range(&self) -> Option<CellRange> {
        let (&(min_row, _), _) = self.cells.first_key_value()?;
        let (&(max_row, _), _) = self.cells.last_key_value()?;
        let min_col = self.cells.keys().map(|&(_, c)| c).min()?;
        let max_col = self.cells.keys().map(|&(_, c)| c).max()?;
        Some(CellRange::from_indices(min_row, min_col, max_row, max_col))
    }

    /// Store a value, keeping any existing style
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Store a value by row and column, keeping any existing style
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        check_bounds(row, col)?;
        let cell = self.cells.entry((row, col)).or_default();
        cell.value = value.into();
        cell.formula = None;
        Ok(())
    }

    /// Store a formula (without the leading `=`) and its cached result
    pub fn set_cell_formula_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        cached: V,
    ) -> Result<()> {
        check_bounds(row, col)?;
        let cell = self.cells.entry((row, col)).or_default();
        cell.value = cached.into();
        cell.formula = Some(formula.trim_start_matches('=').to_string());
        Ok(())
    }

    /// Apply a style to a cell, creating it if needed
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        check_bounds(row, col)?;
        let index = self.styles.get_or_insert(style.clone());
        self.cells.entry((row, col)).or_default().style_index = index;
        Ok(())
    }

    /// Apply a style by address
    pub fn set_cell_style(&mut self, address: &str, style: &Style) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_style_at(addr.row, addr.col, style)
    }

    /// Insert a fully formed cell, as a reader does
    pub fn insert_cell(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        check_bounds(row, col)?;
        self.cells.insert((row, col), data);
        Ok(())
    }

    /// Style pool of this sheet
    pub fn styles(&self) -> &StylePool {
        &self.styles
    }

    /// Mutable style pool of this sheet
    pub fn styles_mut(&mut self) -> &mut StylePool {
        &mut self.styles
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged
    }

    /// Merge cells
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if self.merged.iter().any(|existing| existing.overlaps(range)) {
            return Err(Error::MergedCellConflict(range.to_string()));
        }
        self.merged.push(*range);
        Ok(())
    }

    /// Check whether a cell belongs to a merged region
    pub fn is_merged(&self, row: u32, col: u16) -> bool {
        let addr = CellAddress::new(row, col);
        self.merged.iter().any(|r| r.contains(&addr))
    }

    // === Rows ===

    /// Metadata of a row (default for rows never declared)
    pub fn row_info(&self, row: u32) -> RowInfo {
        self.rows.get(&row).copied().unwrap_or_default()
    }

    /// Set row metadata
    pub fn set_row_info(&mut self, row: u32, info: RowInfo) {
        if info.has_custom_settings() {
            self.rows.insert(row, info);
        } else {
            self.rows.remove(&row);
        }
    }

    /// Check if a row is hidden
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.row_info(row).hidden
    }

    /// Set whether a row is hidden
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        let info = RowInfo {
            hidden,
            ..self.row_info(row)
        };
        self.set_row_info(row, info);
    }

    /// Set the outline (grouping) level of a row
    pub fn set_row_outline_level(&mut self, row: u32, level: u8) {
        let info = RowInfo {
            outline_level: level.min(7),
            ..self.row_info(row)
        };
        self.set_row_info(row, info);
    }

    /// Rows with non-default metadata, in order
    pub fn rows(&self) -> impl Iterator<Item = (u32, &RowInfo)> {
        self.rows.iter().map(|(r, info)| (*r, info))
    }

    /// Declared default outline level of rows
    pub fn outline_level_row(&self) -> u8 {
        self.outline_level_row
    }

    /// Set the declared default outline level of rows
    pub fn set_outline_level_row(&mut self, level: u8) {
        self.outline_level_row = level;
    }

    // === Filtering & Printing ===

    /// AutoFilter range, if any
    pub fn auto_filter(&self) -> Option<CellRange> {
        self.auto_filter
    }

    /// Set the AutoFilter range
    pub fn set_auto_filter(&mut self, range: Option<CellRange>) {
        self.auto_filter = range;
    }

    /// Horizontal page breaks, if the sheet declares any
    pub fn row_breaks(&self) -> Option<&PageBreaks> {
        self.row_breaks.as_ref()
    }

    /// Set the horizontal page breaks
    pub fn set_row_breaks(&mut self, breaks: Option<PageBreaks>) {
        self.row_breaks = breaks;
    }

    // === Drawings ===

    /// Objects on the drawing layer
    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    /// Add an object to the drawing layer
    pub fn add_drawing(&mut self, drawing: Drawing) {
        self.drawings.push(drawing);
    }

    /// Add a chart to the drawing layer
    pub fn add_chart(&mut self, chart: Chart) {
        self.drawings.push(Drawing::Chart(Box::new(chart)));
    }

    /// Charts on this sheet in drawing order
    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.drawings.iter().filter_map(Drawing::as_chart)
    }

    // === Markup ===

    /// Worksheet markup (all content except the cell table)
    pub fn markup(&self) -> Option<&MarkupNode> {
        self.markup.as_ref()
    }

    /// Set the worksheet markup
    pub fn set_markup(&mut self, markup: Option<MarkupNode>) {
        self.markup = markup;
    }
}

fn check_bounds(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_values_and_text() {
        let mut ws = Worksheet::new("Summary");
        ws.set_cell_value("A1", "Sales").unwrap();
        ws.set_cell_value_at(1, 0, 38_500.0).unwrap();
        ws.set_cell_formula_at(2, 0, "=SUM(A2:A2)", 38_500.0).unwrap();

        assert_eq!(ws.text_at(0, 0), "Sales");
        assert_eq!(ws.text_at(1, 0), "38500");
        assert_eq!(ws.text_at(9, 9), "");
        assert_eq!(ws.formula_at(2, 0), Some("SUM(A2:A2)"));
        assert_eq!(ws.value_at(5, 5), &CellValue::Empty);
        assert_eq!(ws.used_range(), Some(CellRange::from_indices(0, 0, 2, 0)));
    }

    #[test]
    fn test_styles_resolve_per_cell() {
        let mut ws = Worksheet::new("Sheet1");
        let title = Style::new().named("Title").font_size(24.0).bold(true);
        ws.set_cell_style("A1", &title).unwrap();

        assert_eq!(ws.style_at(0, 0), &title);
        assert_eq!(ws.style_at(3, 3).named_style, "Normal");
    }

    #[test]
    fn test_merges() {
        let mut ws = Worksheet::new("Sheet1");
        ws.merge_cells(&CellRange::parse("A1:F1").unwrap()).unwrap();
        assert!(ws.is_merged(0, 3));
        assert!(!ws.is_merged(1, 0));
        assert!(ws.merge_cells(&CellRange::parse("C1:C4").unwrap()).is_err());
    }

    #[test]
    fn test_row_metadata() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_row_hidden(4, true);
        ws.set_row_outline_level(5, 2);
        assert!(ws.is_row_hidden(4));
        assert_eq!(ws.row_info(5).outline_level, 2);
        assert_eq!(ws.rows().count(), 2);

        ws.set_row_hidden(4, false);
        assert_eq!(ws.rows().count(), 1);
    }

    #[test]
    fn test_row_cells_in_order() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value_at(3, 5, 1.0).unwrap();
        ws.set_cell_value_at(3, 0, "Blue Total").unwrap();
        ws.set_cell_value_at(4, 0, "x").unwrap();
        let cols: Vec<u16> = ws.row_cells(3).map(|(c, _)| c).collect();
        assert_eq!(cols, vec![0, 5]);
    }

    #[test]
    fn test_charts() {
        let mut ws = Worksheet::new("Sheet1");
        ws.add_chart(Chart::new(ChartKind::Pie3D));
        assert_eq!(ws.charts().count(), 1);
    }
}
