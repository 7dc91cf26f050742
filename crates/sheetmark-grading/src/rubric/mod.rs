//! Rubric tasks and their evaluation
//!
//! A [`RubricTask`] pairs a scored line item with the [`RubricRule`] that
//! checks it. Rules write points and lines into a [`Scorecard`]; the task
//! turns the card into a bounded [`TaskResult`] whatever happens inside the
//! rule.

pub mod catalog;
mod rules;

pub use rules::{
    ChartPatternFill, LegendLayout, NumericAutoFilter, Pie3dChart, SubtotalReport,
    TitleCellFormat,
};

use std::panic::{self, AssertUnwindSafe};

use rust_decimal::Decimal;
use sheetmark_core::{Workbook, Worksheet};
use tracing::{debug, warn};

use crate::error::{GradingError, Result};
use crate::report::TaskResult;

/// Points and diagnostic lines collected while a rule runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scorecard {
    score: Decimal,
    details: Vec<String>,
    errors: Vec<String>,
}

impl Scorecard {
    /// Empty card
    pub fn new() -> Self {
        Self::default()
    }

    /// A satisfied sub-rule
    pub fn award(&mut self, points: Decimal, detail: impl Into<String>) {
        self.score += points;
        self.details.push(detail.into());
    }

    /// A sub-rule that earns reduced points but is still reported as an error
    pub fn partial(&mut self, points: Decimal, error: impl Into<String>) {
        self.score += points;
        self.errors.push(error.into());
    }

    /// An unmet sub-rule
    pub fn fail(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Points collected so far
    pub fn score(&self) -> Decimal {
        self.score
    }

    /// Lines of satisfied sub-rules
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// Lines of unmet sub-rules and failures
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Which worksheet a task is evaluated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// The workbook's first sheet
    First,
    /// The first candidate name present in the workbook, matched exactly
    /// and then ignoring case
    Named {
        candidates: Vec<String>,
        /// Use the first sheet when no candidate exists
        or_first: bool,
    },
}

impl SheetSelector {
    /// A single required sheet name
    pub fn named(name: impl Into<String>) -> Self {
        SheetSelector::Named {
            candidates: vec![name.into()],
            or_first: false,
        }
    }

    /// Resolve the subject sheet of a workbook
    pub fn resolve<'a>(&self, workbook: &'a Workbook) -> Result<&'a Worksheet> {
        let first = || {
            workbook
                .worksheet(0)
                .ok_or_else(|| GradingError::Internal("workbook has no sheets".to_string()))
        };
        match self {
            SheetSelector::First => first(),
            SheetSelector::Named {
                candidates,
                or_first,
            } => {
                if let Some(sheet) = candidates.iter().find_map(|name| workbook.find_worksheet(name)) {
                    return Ok(sheet);
                }
                if *or_first {
                    debug!(?candidates, "no named sheet, using the first one");
                    return first();
                }
                let wanted = candidates.first().cloned().unwrap_or_default();
                Err(GradingError::SheetNotFound(wanted))
            }
        }
    }
}

/// Closed set of rubric rules, each carrying its constants
#[derive(Debug, Clone, PartialEq)]
pub enum RubricRule {
    ChartPatternFill(ChartPatternFill),
    TitleCellFormat(TitleCellFormat),
    LegendLayout(LegendLayout),
    NumericAutoFilter(NumericAutoFilter),
    SubtotalReport(SubtotalReport),
    Pie3dChart(Pie3dChart),
}

impl RubricRule {
    /// Evaluate against a student sheet.
    ///
    /// `reference` is the matching sheet of the answer document. No built-in
    /// rule reads it; every check compares against the rule's own constants.
    pub fn evaluate(
        &self,
        student: &Worksheet,
        reference: Option<&Worksheet>,
        card: &mut Scorecard,
    ) -> Result<()> {
        let _ = reference;
        match self {
            RubricRule::ChartPatternFill(rule) => rule.evaluate(student, card),
            RubricRule::TitleCellFormat(rule) => rule.evaluate(student, card),
            RubricRule::LegendLayout(rule) => rule.evaluate(student, card),
            RubricRule::NumericAutoFilter(rule) => rule.evaluate(student, card),
            RubricRule::SubtotalReport(rule) => rule.evaluate(student, card),
            RubricRule::Pie3dChart(rule) => rule.evaluate(student, card),
        }
    }
}

/// One scored line item of a project
#[derive(Debug, Clone, PartialEq)]
pub struct RubricTask {
    /// Task id (e.g. "P09-T1")
    pub id: String,
    /// Display name
    pub name: String,
    /// Points available
    pub max_score: Decimal,
    /// Subject sheet
    pub sheet: SheetSelector,
    /// Check to run
    pub rule: RubricRule,
}

impl RubricTask {
    /// Create a task
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        max_score: Decimal,
        sheet: SheetSelector,
        rule: RubricRule,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_score,
            sheet,
            rule,
        }
    }

    /// Grade a student workbook. The subject sheet is resolved first; a
    /// missing sheet fails this task only.
    pub fn grade(&self, student: &Workbook, reference: Option<&Workbook>) -> TaskResult {
        match self.sheet.resolve(student) {
            Ok(sheet) => {
                let reference = reference.and_then(|wb| self.sheet.resolve(wb).ok());
                self.grade_sheet(sheet, reference)
            }
            Err(e) => {
                debug!(task = %self.id, error = %e, "subject sheet missing");
                self.result(Scorecard {
                    errors: vec![e.to_string()],
                    ..Scorecard::default()
                })
            }
        }
    }

    /// Grade an already selected sheet.
    ///
    /// Never fails: an error or panic inside the rule becomes an Errors line
    /// and the points collected before it are kept.
    pub fn grade_sheet(&self, student: &Worksheet, reference: Option<&Worksheet>) -> TaskResult {
        let mut card = Scorecard::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.rule.evaluate(student, reference, &mut card)
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(task = %self.id, error = %e, "rule stopped early");
                card.fail(e.to_string());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(task = %self.id, %message, "rule panicked");
                card.fail(GradingError::Internal(message).to_string());
            }
        }
        self.result(card)
    }

    fn result(&self, card: Scorecard) -> TaskResult {
        TaskResult::new(
            self.id.clone(),
            self.name.clone(),
            card.score,
            self.max_score,
            card.details,
            card.errors,
        )
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "evaluation panicked".to_string()
    }
}
