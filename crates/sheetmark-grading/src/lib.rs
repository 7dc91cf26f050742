//! # sheetmark-grading
//!
//! Rubric-based grading of spreadsheet submissions.
//!
//! - [`detect`] - strategies that extract one fact each from a sheet or chart
//! - [`rubric`] - rubric rules, tasks and the built-in project catalog
//! - [`Registry`] - projects by id
//! - [`GradingPipeline`] - opens the documents, runs every task and
//!   aggregates the results into a [`GradingResult`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetmark_grading::GradingPipeline;
//!
//! # async fn run(student: Vec<u8>, reference: Vec<u8>) {
//! let pipeline = GradingPipeline::default();
//! let report = pipeline.grade("P09", &student, &reference).await;
//! println!("{} / {} ({})", report.total_score, report.max_score, report.status);
//! # }
//! ```

pub mod detect;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod rubric;

pub use detect::Detection;
pub use error::{GradingError, Result};
pub use pipeline::{Clock, GradingPipeline, PipelineOptions};
pub use registry::{Project, Registry};
pub use report::{aggregate, GradingResult, Status, TaskResult, SYSTEM_ERROR_TASK_ID};
pub use rubric::{RubricRule, RubricTask, Scorecard, SheetSelector};
