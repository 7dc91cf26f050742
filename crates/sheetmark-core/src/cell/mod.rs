//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`SheetReference`] - A possibly sheet-qualified range (e.g., "'Data'!$A$2:$A$9")
//! - [`CellData`] - Value, formula and style index of one cell

mod address;
mod data;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator, SheetReference};
pub use data::CellData;
pub use value::{CellError, CellValue};
