//! Project grading pipeline
//!
//! One run opens both documents, evaluates every task of the project against
//! them and aggregates the results. Opening failures and unknown projects end
//! the run with a single system-error result; anything that goes wrong inside
//! a task stays inside that task's result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sheetmark_core::Workbook;
use sheetmark_xlsx::XlsxReader;
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{GradingError, Result};
use crate::registry::{Project, Registry};
use crate::report::{aggregate, GradingResult, TaskResult};
use crate::rubric::RubricTask;

/// Source of the `graded_at` timestamp
pub type Clock = fn() -> DateTime<Utc>;

/// Options for a grading run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Time budget of each task
    pub task_timeout: Duration,
    /// Evaluate all tasks at once instead of one at a time
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(30),
            parallel: true,
        }
    }
}

/// Grades submissions against the projects of a registry
#[derive(Debug, Clone)]
pub struct GradingPipeline {
    registry: Arc<Registry>,
    options: PipelineOptions,
    clock: Clock,
}

impl Default for GradingPipeline {
    fn default() -> Self {
        Self::new(Registry::builtin())
    }
}

impl GradingPipeline {
    /// Pipeline over a registry, with default options and the system clock
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            options: PipelineOptions::default(),
            clock: Utc::now,
        }
    }

    /// Replace the run options
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the clock, e.g. to pin `graded_at` in reproducible reports
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Registered projects
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run options
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Grade a student document against a project.
    ///
    /// Always returns a complete report. Both buffers must open as
    /// spreadsheet documents before any task runs.
    pub async fn grade(&self, project_id: &str, student: &[u8], reference: &[u8]) -> GradingResult {
        let span = info_span!("grade", project = project_id);
        self.run(project_id, student, reference).instrument(span).await
    }

    async fn run(&self, project_id: &str, student: &[u8], reference: &[u8]) -> GradingResult {
        let Some(project) = self.registry.get(project_id) else {
            warn!("unknown project");
            let message = format!("Unknown project '{project_id}'");
            return self.failed(project_id, "", message);
        };

        let (student, reference) = match open_documents(student, reference) {
            Ok(documents) => documents,
            Err(e) => {
                warn!(error = %e, "cannot open documents");
                return self.failed(&project.id, &project.name, e.to_string());
            }
        };
        debug!(
            student_sheets = student.sheet_count(),
            reference_sheets = reference.sheet_count(),
            "documents opened"
        );

        let results = if self.options.parallel {
            self.run_parallel(project, &student, &reference).await
        } else {
            self.run_sequential(project, &student, &reference).await
        };
        debug!(tasks = results.len(), "tasks finished");

        let report = aggregate(&project.id, &project.name, results, (self.clock)());
        info!(
            total = %report.total_score,
            max = %report.max_score,
            status = %report.status,
            "graded"
        );
        report
    }

    async fn run_parallel(
        &self,
        project: &Project,
        student: &Arc<Workbook>,
        reference: &Arc<Workbook>,
    ) -> Vec<TaskResult> {
        let budget = self.options.task_timeout;
        let handles: Vec<_> = project
            .tasks
            .iter()
            .map(|task| {
                let job = run_task(task.clone(), Arc::clone(student), Arc::clone(reference), budget);
                (task, tokio::spawn(job.in_current_span()))
            })
            .collect();

        // joined in rubric order
        let mut results = Vec::with_capacity(handles.len());
        for (task, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(task = %task.id, error = %e, "task did not complete");
                    zero_result(task, GradingError::Internal(e.to_string()).to_string())
                }
            };
            results.push(result);
        }
        results
    }

    async fn run_sequential(
        &self,
        project: &Project,
        student: &Arc<Workbook>,
        reference: &Arc<Workbook>,
    ) -> Vec<TaskResult> {
        let mut results = Vec::with_capacity(project.tasks.len());
        for task in &project.tasks {
            let job = run_task(
                task.clone(),
                Arc::clone(student),
                Arc::clone(reference),
                self.options.task_timeout,
            );
            results.push(job.await);
        }
        results
    }

    fn failed(&self, project_id: &str, project_name: &str, message: String) -> GradingResult {
        aggregate(
            project_id,
            project_name,
            vec![TaskResult::system_error(message)],
            (self.clock)(),
        )
    }
}

fn open_documents(student: &[u8], reference: &[u8]) -> Result<(Arc<Workbook>, Arc<Workbook>)> {
    let student = XlsxReader::read_bytes(student)?;
    let reference = XlsxReader::read_bytes(reference)?;
    Ok((Arc::new(student), Arc::new(reference)))
}

/// Evaluate one task on the blocking pool within its time budget.
///
/// A task that runs out of time is reported with no points. Its thread is
/// left to finish in the background.
async fn run_task(
    task: RubricTask,
    student: Arc<Workbook>,
    reference: Arc<Workbook>,
    budget: Duration,
) -> TaskResult {
    let header = task.clone();
    let job = tokio::task::spawn_blocking(move || task.grade(&student, Some(&reference)));
    await_within(&header, budget, job).await
}

async fn await_within<F>(task: &RubricTask, budget: Duration, job: F) -> TaskResult
where
    F: Future<Output = std::result::Result<TaskResult, JoinError>>,
{
    match timeout(budget, job).await {
        Ok(Ok(result)) => {
            debug!(task = %result.task_id, score = %result.score, "task graded");
            result
        }
        Ok(Err(e)) => {
            warn!(task = %task.id, error = %e, "task did not complete");
            zero_result(task, GradingError::Internal(e.to_string()).to_string())
        }
        Err(_) => {
            warn!(task = %task.id, ?budget, "task timed out");
            timed_out(task, budget)
        }
    }
}

fn timed_out(task: &RubricTask, budget: Duration) -> TaskResult {
    zero_result(
        task,
        format!("Task timed out after {:.1}s", budget.as_secs_f64()),
    )
}

fn zero_result(task: &RubricTask, error: String) -> TaskResult {
    TaskResult::new(
        task.id.clone(),
        task.name.clone(),
        Decimal::ZERO,
        task.max_score,
        Vec::new(),
        vec![error],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SYSTEM_ERROR_TASK_ID;
    use crate::rubric::{RubricRule, SheetSelector, TitleCellFormat};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn pipeline() -> GradingPipeline {
        GradingPipeline::default().with_clock(fixed_clock)
    }

    #[test]
    fn test_default_options() {
        let options = PipelineOptions::default();
        assert_eq!(options.task_timeout, Duration::from_secs(30));
        assert!(options.parallel);
    }

    #[tokio::test]
    async fn test_corrupt_buffer_is_a_system_error() {
        let result = pipeline().grade("P09", b"not a spreadsheet", b"").await;
        assert!(result.is_system_error());
        assert_eq!(result.project_id, "P09");
        assert_eq!(result.project_name, "Sales and Orders Report");
        assert_eq!(result.total_score, Decimal::ZERO);
        assert_eq!(result.max_score, Decimal::ZERO);
        assert_eq!(result.graded_at, fixed_clock());

        let only = &result.task_results[0];
        assert_eq!(only.task_id, SYSTEM_ERROR_TASK_ID);
        assert_eq!(only.task_name, "System Error");
        assert_eq!(only.errors.len(), 1);
        assert!(only.errors[0].starts_with("Cannot open document"));
    }

    #[tokio::test]
    async fn test_unknown_project_is_a_system_error() {
        let result = pipeline().grade("P99", b"", b"").await;
        assert!(result.is_system_error());
        assert_eq!(
            result.task_results[0].errors,
            vec!["Unknown project 'P99'".to_string()]
        );
    }

    fn title_task() -> RubricTask {
        RubricTask::new(
            "X-T1",
            "Title",
            Decimal::from(4),
            SheetSelector::First,
            RubricRule::TitleCellFormat(TitleCellFormat::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_over_budget_scores_zero() {
        let task = title_task();
        let budget = Duration::from_millis(1500);
        let started = tokio::time::Instant::now();

        let result = await_within(&task, budget, std::future::pending()).await;
        assert!(started.elapsed() >= budget);
        assert_eq!(result.task_id, "X-T1");
        assert_eq!(result.score, Decimal::ZERO);
        assert_eq!(result.max_score, Decimal::from(4));
        assert!(!result.passed);
        assert_eq!(result.errors, vec!["Task timed out after 1.5s".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_within_budget_is_kept() {
        let task = title_task();
        let graded = TaskResult::new(
            "X-T1",
            "Title",
            Decimal::from(4),
            Decimal::from(4),
            vec!["done".into()],
            vec![],
        );
        let job = {
            let graded = graded.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                graded
            })
        };

        let result = await_within(&task, Duration::from_secs(30), job).await;
        assert_eq!(result, graded);
    }

    #[tokio::test]
    async fn test_aborted_task_scores_zero() {
        let task = title_task();
        let job = tokio::spawn(std::future::pending::<TaskResult>());
        job.abort();

        let result = await_within(&task, Duration::from_secs(30), job).await;
        assert_eq!(result.score, Decimal::ZERO);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Internal error: "));
    }
}
