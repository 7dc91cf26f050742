//! Error types for grading

use thiserror::Error;

/// Result type for grading operations
pub type Result<T> = std::result::Result<T, GradingError>;

/// Errors raised while grading a task.
///
/// Inside a task these never escape: [`RubricTask::grade`](crate::RubricTask::grade)
/// turns them into an Errors line on the task result.
#[derive(Error, Debug)]
pub enum GradingError {
    /// Subject sheet not found
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// No chart on the subject sheet
    #[error("No chart found on sheet '{0}'")]
    ChartNotFound(String),

    /// Bad cell or range in a rubric constant
    #[error("Invalid cell reference: {0}")]
    CellAddress(#[from] sheetmark_core::Error),

    /// Document could not be opened
    #[error("Cannot open document: {0}")]
    Document(#[from] sheetmark_xlsx::XlsxError),

    /// Unexpected failure inside an evaluator
    #[error("Internal error: {0}")]
    Internal(String),
}
