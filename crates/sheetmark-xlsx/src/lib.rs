//! # sheetmark-xlsx
//!
//! Read-only XLSX (Office Open XML) accessor for sheetmark.
//!
//! Reads what grading inspects: sheets, cells, styles, merges, row metadata,
//! autofilters, page breaks, drawings and charts. Charts and worksheets also
//! keep their markup trees.

pub mod error;
pub mod reader;

mod markup;
mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
