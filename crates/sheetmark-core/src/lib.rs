//! # sheetmark-core
//!
//! Read-only spreadsheet document model used by the sheetmark grading engine.
//!
//! This crate provides the types a grader inspects:
//! - [`Workbook`], [`Worksheet`] - the document and its sheets
//! - [`CellAddress`] and [`CellRange`] - cell addressing and ranges
//! - [`CellValue`] and [`CellData`] - cell contents, formulas and style indices
//! - [`Style`] - the subset of cell formatting a rubric can check
//! - [`Chart`] and [`Drawing`] - embedded objects anchored to a sheet
//! - [`MarkupNode`] - the raw markup tree behind charts and worksheets
//!
//! ## Example
//!
//! ```rust
//! use sheetmark_core::{Workbook, CellValue};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Product").unwrap();
//! sheet.set_cell_value_at(1, 0, CellValue::Number(42.0)).unwrap();
//!
//! assert_eq!(sheet.text_at(1, 0), "42");
//! ```

pub mod cell;
pub mod chart;
pub mod drawing;
pub mod error;
pub mod markup;
pub mod page_break;
pub mod row;
pub mod style;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellData, CellError, CellRange, CellValue, SheetReference};
pub use chart::{
    Chart, ChartAnchor, ChartKind, DataReference, DataSeries, Legend, LegendPosition, ShapeFill,
};
pub use drawing::Drawing;
pub use error::{Error, Result};
pub use markup::{ns, MarkupNode, QName};
pub use page_break::{PageBreak, PageBreaks};
pub use row::RowInfo;
pub use style::{FontStyle, Style, StylePool};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
