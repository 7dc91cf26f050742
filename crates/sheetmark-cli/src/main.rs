//! Sheetmark CLI - rubric-based spreadsheet grader

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use sheetmark::prelude::*;
use sheetmark::{CellRange, SheetSelector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};
use tracing::level_filters::LevelFilter;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sheetmark")]
#[command(author, version, about = "Rubric-based spreadsheet grader")]
struct Cli {
    /// More log output on stderr (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a student submission against a project rubric
    Grade {
        /// Student workbook (xlsx, xlsm)
        student: PathBuf,

        /// Reference (answer) workbook
        reference: PathBuf,

        /// Project id
        #[arg(short, long, default_value = "P09")]
        project: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Time budget of each task in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Evaluate tasks one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// List the registered projects and their tasks
    Projects,

    /// Show the sheets, charts and filters of a workbook
    Inspect {
        /// Input workbook
        input: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Grade {
            student,
            reference,
            project,
            format,
            timeout_secs,
            sequential,
        } => {
            let options = PipelineOptions {
                task_timeout: Duration::from_secs(timeout_secs),
                parallel: !sequential,
            };
            grade(&student, &reference, &project, format, options).await
        }
        Commands::Projects => {
            list_projects();
            Ok(())
        }
        Commands::Inspect { input } => inspect(&input),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let fmt = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false);
    tracing_subscriber::registry()
        .with(fmt)
        .with(LevelFilter::from_level(level))
        .init();
}

async fn grade(
    student: &Path,
    reference: &Path,
    project: &str,
    format: Format,
    options: PipelineOptions,
) -> Result<()> {
    let student_bytes = std::fs::read(student)
        .with_context(|| format!("Failed to read '{}'", student.display()))?;
    let reference_bytes = std::fs::read(reference)
        .with_context(|| format!("Failed to read '{}'", reference.display()))?;
    debug!(?options, "grading {}", student.display());

    let pipeline = GradingPipeline::default().with_options(options);
    let report = pipeline
        .grade(project, &student_bytes, &reference_bytes)
        .await;

    match format {
        Format::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
        }
        Format::Table => print_report(&report),
    }
    Ok(())
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task")]
    id: String,
    #[tabled(rename = "Requirement")]
    name: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Passed")]
    passed: &'static str,
    #[tabled(rename = "Notes")]
    notes: String,
}

impl From<&TaskResult> for TaskRow {
    fn from(task: &TaskResult) -> Self {
        let notes = task
            .details
            .iter()
            .map(|d| format!("+ {d}"))
            .chain(task.errors.iter().map(|e| format!("- {e}")))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            id: task.task_id.clone(),
            name: task.task_name.clone(),
            score: format!("{}/{}", task.score.normalize(), task.max_score.normalize()),
            passed: if task.passed { "yes" } else { "no" },
            notes,
        }
    }
}

fn print_report(report: &GradingResult) {
    let rows: Vec<TaskRow> = report.task_results.iter().map(TaskRow::from).collect();
    let title = format!("{} {}", report.project_id, report.project_name);
    println!(
        "{}",
        Table::new(&rows)
            .with(Panel::header(title))
            .with(Style::modern())
    );
    println!(
        "Total: {} / {} ({:.1}%) {}",
        report.total_score.normalize(),
        report.max_score.normalize(),
        report.percentage,
        report.status
    );
}

#[derive(Tabled)]
struct ProjectTaskRow {
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Task")]
    id: String,
    #[tabled(rename = "Requirement")]
    name: String,
    #[tabled(rename = "Points")]
    points: String,
    #[tabled(rename = "Sheet")]
    sheet: String,
}

fn describe_selector(selector: &SheetSelector) -> String {
    match selector {
        SheetSelector::First => "(first sheet)".to_string(),
        SheetSelector::Named {
            candidates,
            or_first,
        } => {
            let names = candidates.join(" | ");
            if *or_first {
                format!("{names}, else first")
            } else {
                names
            }
        }
    }
}

fn list_projects() {
    let pipeline = GradingPipeline::default();
    let rows: Vec<ProjectTaskRow> = pipeline
        .registry()
        .projects()
        .flat_map(|project| {
            project.tasks.iter().map(move |task| ProjectTaskRow {
                project: format!("{} {}", project.id, project.name),
                id: task.id.clone(),
                name: task.name.clone(),
                points: task.max_score.normalize().to_string(),
                sheet: describe_selector(&task.sheet),
            })
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::modern()));
}

#[derive(Tabled)]
struct ChartRow {
    #[tabled(rename = "Sheet")]
    sheet: String,
    #[tabled(rename = "Chart")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Anchor")]
    anchor: String,
    #[tabled(rename = "Legend")]
    legend: String,
    #[tabled(rename = "Series")]
    series: usize,
}

fn inspect(input: &Path) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());

    let mut charts = Vec::new();
    for (i, sheet) in workbook.worksheets().enumerate() {
        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());
        match sheet.used_range() {
            Some(range) => println!("    Used range: {range}"),
            None => println!("    Used range: empty"),
        }
        if let Some(filter) = sheet.auto_filter() {
            println!("    AutoFilter: {filter}");
        }
        if !sheet.merged_regions().is_empty() {
            let merged: Vec<_> = sheet.merged_regions().iter().map(|r| r.to_string()).collect();
            println!("    Merged: {}", merged.join(", "));
        }
        if sheet.outline_level_row() > 0 {
            println!("    Outline levels: {}", sheet.outline_level_row());
        }
        if let Some(breaks) = sheet.row_breaks() {
            println!("    Row breaks: {}", breaks.breaks.len());
        }

        for chart in sheet.charts() {
            let a = chart.anchor;
            charts.push(ChartRow {
                sheet: sheet.name().to_string(),
                name: chart.name.clone().unwrap_or_default(),
                kind: chart.kind.to_string(),
                anchor: CellRange::from_indices(a.from_row, a.from_col, a.to_row, a.to_col)
                    .to_string(),
                legend: chart
                    .legend
                    .and_then(|l| l.position)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                series: chart.series.len(),
            });
        }
    }

    if !charts.is_empty() {
        println!();
        println!("{}", Table::new(&charts).with(Style::modern()));
    }
    Ok(())
}
