//! # sheetmark
//!
//! Rule-based grading of spreadsheet submissions.
//!
//! A project is an ordered rubric of tasks. Grading opens a student document
//! and a reference document, evaluates every task against the student's
//! sheets and reduces the task results into a [`GradingResult`].
//!
//! ## Features
//!
//! - Read-only XLSX access to cells, styles, filters, outlines, page breaks
//!   and charts
//! - Detection strategies that fall back from the typed model to the raw
//!   markup
//! - Built-in rubric for project P09, and a registry for more
//! - Per-task time budget, parallel evaluation
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetmark::prelude::*;
//!
//! let student = std::fs::read("student.xlsx").unwrap();
//! let reference = std::fs::read("answer.xlsx").unwrap();
//!
//! let report = sheetmark::grade_project("P09", &student, &reference);
//! for task in &report.task_results {
//!     println!("{}: {} / {}", task.task_name, task.score, task.max_score);
//! }
//! println!("{}% {}", report.percentage, report.status);
//! ```

pub mod grading;
pub mod prelude;

pub use grading::{grade_project, grade_project_with};

// Re-export core types
pub use sheetmark_core::{
    CellAddress, CellData, CellError, CellRange, CellValue, Chart, ChartAnchor, ChartKind,
    DataReference, DataSeries, Drawing, Error, FontStyle, Legend, LegendPosition, MarkupNode,
    PageBreaks, Result, RowInfo, ShapeFill, Style, Workbook, Worksheet,
};

// Re-export grading types
pub use sheetmark_grading::{
    detect, rubric, Detection, GradingError, GradingPipeline, GradingResult, PipelineOptions,
    Project, Registry, RubricRule, RubricTask, SheetSelector, Status, TaskResult,
};

// Re-export I/O types
pub use sheetmark_xlsx::{XlsxError, XlsxReader};

use std::path::Path;

/// Extension trait for Workbook to add file input
pub trait WorkbookExt {
    /// Open a workbook from an `.xlsx` or `.xlsm` file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => {
                XlsxReader::read_file(path).map_err(|e| Error::other(e.to_string()))
            }
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}
