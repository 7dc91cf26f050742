//! End-to-end grading of generated P09 submissions.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::Cell::*;
use common::{package, p09_full_marks, p09_with, shirt_orders, SheetPart};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use sheetmark_grading::{
    GradingPipeline, GradingResult, PipelineOptions, Status, TaskResult, SYSTEM_ERROR_TASK_ID,
};

fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 8, 30, 0).unwrap()
}

fn pipeline() -> GradingPipeline {
    GradingPipeline::default().with_clock(fixed_clock)
}

fn task<'a>(result: &'a GradingResult, id: &str) -> &'a TaskResult {
    result
        .task_results
        .iter()
        .find(|t| t.task_id == id)
        .unwrap_or_else(|| panic!("no result for {id}"))
}

/// The first sheet: a title in A1 and a filtered Total column
fn report(title_style: u32, west_hidden: bool) -> SheetPart {
    let west_attrs = if west_hidden { r#"hidden="1""# } else { "" };
    SheetPart::new("Sales")
        .row(1, "", &[Styled("A", "Quarterly Sales", title_style)])
        .row(2, "", &[Text("A", "Region"), Text("B", "Total")])
        .row(3, "", &[Text("A", "East"), Number("B", 38_000.0)])
        .row(4, west_attrs, &[Text("A", "West"), Number("B", 50_000.0)])
        .row(5, "", &[Text("A", "North"), Number("B", 45_000.0)])
        .extra(r#"<autoFilter ref="A2:B5"><filterColumn colId="1"/></autoFilter>"#)
}

fn empty_summary() -> SheetPart {
    SheetPart::new("Summary").row(1, "", &[Text("A", "Quarter")])
}

#[tokio::test]
async fn full_marks_submission() {
    let bytes = p09_full_marks();
    let result = pipeline().grade("P09", &bytes, &bytes).await;

    assert_eq!(result.project_id, "P09");
    assert_eq!(result.project_name, "Sales and Orders Report");
    assert_eq!(result.max_score, Decimal::from(32));
    for t in &result.task_results {
        assert!(t.errors.is_empty(), "{}: {:?}", t.task_id, t.errors);
        assert_eq!(t.score, t.max_score, "{}", t.task_id);
        assert!(t.passed);
    }
    assert_eq!(result.total_score, Decimal::from(32));
    assert_eq!(result.percentage, 100.0);
    assert_eq!(result.status, Status::Excellent);
    assert_eq!(result.graded_at, fixed_clock());

    let ids: Vec<_> = result.task_results.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, ["P09-T1", "P09-T2", "P09-T3", "P09-T4", "P09-T5", "P09-T6"]);
}

#[tokio::test]
async fn title_cell_fully_formatted() {
    let bytes = p09_full_marks();
    let result = pipeline().grade("P09", &bytes, &bytes).await;

    let title = task(&result, "P09-T2");
    assert_eq!(title.score, Decimal::from(4));
    assert_eq!(title.details.len(), 4);
    assert!(title.errors.is_empty());
}

#[tokio::test]
async fn title_cell_wrong_size_and_not_bold() {
    let bytes = p09_with(report(common::TITLE_18_PLAIN, true), empty_summary(), shirt_orders(true));
    let result = pipeline().grade("P09", &bytes, &p09_full_marks()).await;

    let title = task(&result, "P09-T2");
    assert_eq!(title.score, Decimal::TWO);
    assert!(title.passed);
    assert_eq!(
        title.details,
        vec!["Cell A1 is not merged".to_string(), "Title style applied".to_string()]
    );
    assert_eq!(
        title.errors,
        vec![
            "Font size is 18pt (expected 24pt)".to_string(),
            "Font is not bold".to_string(),
        ]
    );
}

#[tokio::test]
async fn visible_value_outside_filter_range() {
    let bytes = p09_with(report(common::TITLE_24_BOLD, false), empty_summary(), shirt_orders(true));
    let result = pipeline().grade("P09", &bytes, &p09_full_marks()).await;

    let filter = task(&result, "P09-T4");
    assert_eq!(filter.score, Decimal::TWO);
    assert_eq!(filter.details, vec!["AutoFilter enabled on A2:B5".to_string()]);
    assert_eq!(
        filter.errors,
        vec!["1 of 3 visible rows are outside 34,000 - 45,000".to_string()]
    );
}

#[tokio::test]
async fn literal_grand_total_earns_half() {
    let bytes = p09_with(report(common::TITLE_24_BOLD, true), empty_summary(), shirt_orders(false));
    let result = pipeline().grade("P09", &bytes, &p09_full_marks()).await;

    let subtotal = task(&result, "P09-T5");
    assert_eq!(subtotal.score, Decimal::new(65, 1));
    assert!(subtotal.errors.is_empty());
    assert_eq!(
        subtotal.details.last().map(String::as_str),
        Some("Grand Total at D7 (240) has no formula")
    );
}

#[tokio::test]
async fn missing_chart_fails_only_chart_tasks() {
    let bytes = p09_with(report(common::TITLE_24_BOLD, true), empty_summary(), shirt_orders(true));
    let result = pipeline().grade("P09", &bytes, &p09_full_marks()).await;

    for id in ["P09-T1", "P09-T3"] {
        let t = task(&result, id);
        assert_eq!(t.score, Decimal::ZERO);
        assert_eq!(t.errors, vec!["No chart found on sheet 'Summary'".to_string()]);
    }
    assert_eq!(task(&result, "P09-T6").score, Decimal::from(8));
    assert_eq!(result.total_score, Decimal::from(24));
    assert_eq!(result.status, Status::Good);
}

#[tokio::test]
async fn missing_sheets_fail_their_tasks() {
    let bytes = package(vec![report(common::TITLE_24_BOLD, true)]);
    let result = pipeline().grade("P09", &bytes, &bytes).await;

    assert_eq!(
        task(&result, "P09-T1").errors,
        vec!["Sheet 'Summary' not found".to_string()]
    );
    assert_eq!(
        task(&result, "P09-T6").errors,
        vec!["Sheet 'Farmers & Market' not found".to_string()]
    );
    // the subtotal task falls back to the first sheet
    let subtotal = task(&result, "P09-T5");
    assert_eq!(subtotal.errors.len(), 3);
    assert_eq!(task(&result, "P09-T2").score, Decimal::from(4));
    assert_eq!(task(&result, "P09-T4").score, Decimal::from(4));
}

#[tokio::test]
async fn corrupt_document_is_a_system_error() {
    let student = p09_full_marks();
    for (student, reference) in [
        (&b"PK\x03\x04 truncated"[..], &student[..]),
        (&student[..], &b"plain text"[..]),
    ] {
        let result = pipeline().grade("P09", student, reference).await;
        assert!(result.is_system_error());
        assert_eq!(result.task_results.len(), 1);
        assert_eq!(result.task_results[0].task_id, SYSTEM_ERROR_TASK_ID);
        assert_eq!(result.total_score, Decimal::ZERO);
        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.status, Status::Poor);
    }
}

#[tokio::test]
async fn grading_is_deterministic() {
    let bytes = p09_with(report(common::TITLE_18_PLAIN, false), empty_summary(), shirt_orders(false));
    let reference = p09_full_marks();

    let first = pipeline().grade("P09", &bytes, &reference).await;
    let second = pipeline().grade("P09", &bytes, &reference).await;
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let sequential = pipeline()
        .with_options(PipelineOptions {
            parallel: false,
            ..PipelineOptions::default()
        })
        .grade("P09", &bytes, &reference)
        .await;
    assert_eq!(sequential, first);
}
