//! Per-cell storage record

use super::CellValue;

/// Contents of one populated cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    /// Stored value (the cached result for formula cells)
    pub value: CellValue,
    /// Formula text without the leading `=`.
    ///
    /// Cells that follow a shared formula carry the master's text, or
    /// `Some("")` when the master was not seen. Either way they hold a formula.
    pub formula: Option<String>,
    /// Index into the worksheet's [`StylePool`](crate::StylePool)
    pub style_index: u32,
}

impl CellData {
    /// Create a cell holding a plain value with the default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            formula: None,
            style_index: 0,
        }
    }

    /// Create a formula cell with its cached result
    pub fn with_formula<S: Into<String>>(formula: S, cached: CellValue) -> Self {
        Self {
            value: cached,
            formula: Some(formula.into()),
            style_index: 0,
        }
    }

    /// Check whether this cell holds a formula
    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Display text of the cell
    pub fn text(&self) -> String {
        self.value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_formula() {
        let cell = CellData::with_formula("SUBTOTAL(9,F2:F5)", CellValue::Number(1200.0));
        assert!(cell.has_formula());
        assert_eq!(cell.text(), "1200");

        let follower = CellData::with_formula("", CellValue::Number(3.0));
        assert!(follower.has_formula());

        assert!(!CellData::new(CellValue::from("Total")).has_formula());
    }
}
