//! Prelude module - common imports for sheetmark users
//!
//! ```rust
//! use sheetmark::prelude::*;
//! ```

pub use crate::{
    // Document types
    CellAddress,
    CellRange,
    CellValue,
    Chart,
    ChartKind,
    // Error types
    Error,
    GradingError,
    // Grading types
    GradingPipeline,
    GradingResult,
    PipelineOptions,
    Registry,
    Result,
    Status,
    TaskResult,

    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,

    // I/O types
    XlsxError,
    XlsxReader,
};
