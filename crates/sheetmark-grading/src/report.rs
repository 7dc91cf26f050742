//! Grading report and score aggregation

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Task id of the synthetic result reported when grading cannot start
pub const SYSTEM_ERROR_TASK_ID: &str = "ERROR";

/// Outcome of one rubric task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Rubric task id (e.g. "P09-T2")
    pub task_id: String,
    /// Display name
    pub task_name: String,
    /// Awarded points, `0 <= score <= max_score`
    pub score: Decimal,
    /// Points available
    pub max_score: Decimal,
    /// At least half of the points were awarded
    pub passed: bool,
    /// Satisfied sub-rules, in evaluation order
    pub details: Vec<String>,
    /// Unmet sub-rules and failures, in evaluation order
    pub errors: Vec<String>,
}

impl TaskResult {
    /// Build a result, clamping the score and deriving `passed`
    pub fn new(
        task_id: impl Into<String>,
        task_name: impl Into<String>,
        score: Decimal,
        max_score: Decimal,
        details: Vec<String>,
        errors: Vec<String>,
    ) -> Self {
        let max_score = max_score.max(Decimal::ZERO);
        let score = score.clamp(Decimal::ZERO, max_score);
        Self {
            task_id: task_id.into(),
            task_name: task_name.into(),
            score,
            max_score,
            passed: score * Decimal::TWO >= max_score,
            details,
            errors,
        }
    }

    /// The single result reported when documents cannot be graded at all
    pub fn system_error(message: impl Into<String>) -> Self {
        Self::new(
            SYSTEM_ERROR_TASK_ID,
            "System Error",
            Decimal::ZERO,
            Decimal::ZERO,
            Vec::new(),
            vec![message.into()],
        )
    }
}

/// Qualitative band of a percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Status {
    /// Band a percentage. Each lower bound is inclusive.
    pub fn from_percentage(percentage: Decimal) -> Self {
        if percentage >= Decimal::from(80) {
            Status::Excellent
        } else if percentage >= Decimal::from(60) {
            Status::Good
        } else if percentage >= Decimal::from(40) {
            Status::Fair
        } else {
            Status::Poor
        }
    }

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Excellent => "Excellent",
            Status::Good => "Good",
            Status::Fair => "Fair",
            Status::Poor => "Poor",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project-level grading report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// Project id (e.g. "P09")
    pub project_id: String,
    /// Project display name
    pub project_name: String,
    /// Sum of task scores
    pub total_score: Decimal,
    /// Sum of task maximums
    pub max_score: Decimal,
    /// `total_score / max_score * 100`, or 0 without any points available
    pub percentage: f64,
    /// Band of the percentage
    pub status: Status,
    /// When the report was produced
    pub graded_at: DateTime<Utc>,
    /// Task outcomes in rubric order
    pub task_results: Vec<TaskResult>,
}

impl GradingResult {
    /// Whether this is the synthetic report of a run that could not start
    pub fn is_system_error(&self) -> bool {
        matches!(self.task_results.as_slice(), [only] if only.task_id == SYSTEM_ERROR_TASK_ID)
    }
}

/// Exact percentage, or zero when nothing can be scored
pub fn percentage(total: Decimal, max: Decimal) -> Decimal {
    if max > Decimal::ZERO {
        total * Decimal::ONE_HUNDRED / max
    } else {
        Decimal::ZERO
    }
}

/// Reduce task results into a project report
pub fn aggregate(
    project_id: impl Into<String>,
    project_name: impl Into<String>,
    task_results: Vec<TaskResult>,
    graded_at: DateTime<Utc>,
) -> GradingResult {
    let total_score: Decimal = task_results.iter().map(|t| t.score).sum();
    let max_score: Decimal = task_results.iter().map(|t| t.max_score).sum();
    let exact = percentage(total_score, max_score);

    GradingResult {
        project_id: project_id.into(),
        project_name: project_name.into(),
        total_score,
        max_score,
        percentage: exact.to_f64().unwrap_or(0.0),
        status: Status::from_percentage(exact),
        graded_at,
        task_results,
    }
}
