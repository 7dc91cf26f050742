//! Blocking entry points
//!
//! The pipeline is async. These helpers run it on a runtime of their own for
//! callers without one. Do not call them from inside a tokio runtime; await
//! [`GradingPipeline::grade`] there instead.

use chrono::Utc;
use sheetmark_grading::{aggregate, GradingPipeline, GradingResult, TaskResult};

/// Grade a student document against a built-in project with default options
pub fn grade_project(project_id: &str, student: &[u8], reference: &[u8]) -> GradingResult {
    grade_project_with(
        &GradingPipeline::default(),
        project_id,
        student,
        reference,
    )
}

/// Grade with a configured pipeline
pub fn grade_project_with(
    pipeline: &GradingPipeline,
    project_id: &str,
    student: &[u8],
    reference: &[u8],
) -> GradingResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build();

    match runtime {
        Ok(runtime) => runtime.block_on(pipeline.grade(project_id, student, reference)),
        Err(e) => aggregate(
            project_id,
            "",
            vec![TaskResult::system_error(format!(
                "Cannot start grading runtime: {e}"
            ))],
            Utc::now(),
        ),
    }
}

