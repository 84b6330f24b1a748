use crate::cli::{ComputeArgs, DisplayArgs, HeavyArgs, ReviewArgs, TemplateArgs};
use crate::infra::{apply_sort, read_workbook, StoredResultSolver};
use holiday_review::config::AppConfig;
use holiday_review::error::AppError;
use holiday_review::telemetry;
use holiday_review::workflows::holidays::domain::{
    format_calendar_date, parse_calendar_date, weekday_label,
};
use holiday_review::workflows::holidays::views::RESULTS_TITLE;
use holiday_review::workflows::holidays::{
    AssignmentRowView, AssignmentSolver, ComputeForm, ComputeOutcome, HeavySet, HttpSolver,
    InputFile, ReviewError, ReviewService, ReviewView, SolveMode, SortDirection,
    SummaryCellView, SummaryTableView, ValidationError,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;
    Ok(config)
}

pub(crate) async fn run_template(args: TemplateArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let service = ReviewService::new(
        Arc::new(HttpSolver::new(&config.solver)?),
        ComputeForm::from_defaults(&config.defaults),
    );

    let bytes = service.template().await?;
    std::fs::write(&args.output, &bytes)?;
    println!(
        "Template saved to {} ({} bytes)",
        args.output.display(),
        bytes.len()
    );
    Ok(())
}

pub(crate) fn run_heavy(args: HeavyArgs) -> Result<(), AppError> {
    let (name, bytes) = read_workbook(&args.input)?;
    let input = InputFile::new(name, bytes);
    if !input.is_xlsx() {
        return Err(ValidationError::UnsupportedInput(input.name().to_string()).into());
    }

    let heavy = HeavySet::load(input.bytes());
    render_heavy_reference(input.name(), &heavy);
    Ok(())
}

pub(crate) async fn run_compute(args: ComputeArgs) -> Result<(), AppError> {
    let config = load_config()?;

    let mut form = ComputeForm::from_defaults(&config.defaults);
    if let Some(start_date) = args.start_date {
        form.start_date = format_calendar_date(start_date);
    }
    if let Some(end_date) = args.end_date {
        form.end_date = format_calendar_date(end_date);
    }
    if let Some(days) = args.min_proximity_days {
        form.min_proximity_days = days.to_string();
    }

    let service = ReviewService::new(Arc::new(HttpSolver::new(&config.solver)?), form);
    let (name, bytes) = read_workbook(&args.input)?;
    service.select_input(&name, bytes)?;

    let outcome = service.compute(args.mode).await?;
    report_outcome(&service, &outcome, &args.display)?;

    if let Some(dir) = args.save_dir.as_deref() {
        let path = save_download(&service, dir)?;
        println!("\nResult saved to {}", path.display());
    }
    Ok(())
}

pub(crate) async fn run_review(args: ReviewArgs) -> Result<(), AppError> {
    let config = load_config()?;
    let (_, result) = read_workbook(&args.result)?;

    let service = ReviewService::new(
        Arc::new(StoredResultSolver::new(result)),
        ComputeForm::from_defaults(&config.defaults),
    );
    let (name, bytes) = read_workbook(&args.input)?;
    service.select_input(&name, bytes)?;

    let outcome = service.compute(SolveMode::Greedy).await?;
    report_outcome(&service, &outcome, &args.display)
}

fn report_outcome<S>(
    service: &ReviewService<S>,
    outcome: &ComputeOutcome,
    display: &DisplayArgs,
) -> Result<(), AppError>
where
    S: AssignmentSolver + 'static,
{
    if let ComputeOutcome::Applied {
        decode_error: Some(reason),
        ..
    } = outcome
    {
        println!("Result could not be decoded: {reason}");
    }

    apply_sort(service, display.sort, display.descending);
    render_review(&service.view());

    if let Some(path) = display.csv.as_deref() {
        let written = service.export_csv(File::create(path)?)?;
        println!("\n{written} rows written to {}", path.display());
    }
    Ok(())
}

/// Writes the current result next to other results in `dir`, under the
/// timestamped download name.
pub(crate) fn save_download<S>(service: &ReviewService<S>, dir: &Path) -> Result<PathBuf, AppError>
where
    S: AssignmentSolver + 'static,
{
    let download = service.download().ok_or(ReviewError::NoResult)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&download.file_name);
    std::fs::write(&path, &download.bytes)?;
    Ok(path)
}

fn render_heavy_reference(input_name: &str, heavy: &HeavySet) {
    println!("Heavy holiday reference: {input_name}");
    if heavy.is_empty() {
        println!("No heavy shifts declared");
        return;
    }

    for key in heavy.sorted_keys() {
        let (date, shift) = key.as_str().split_once('|').unwrap_or((key.as_str(), ""));
        let weekday = parse_calendar_date(date).map(weekday_label).unwrap_or("-");
        println!("- {date} {weekday} {shift}");
    }
}

pub(crate) fn render_review(view: &ReviewView) {
    println!("Holiday assignment review");
    if let Some(name) = &view.input_name {
        println!("Input: {name} ({} heavy shifts)", view.heavy_keys);
    }
    println!(
        "Window: {} -> {} | minimum proximity {} days",
        view.form.start_date, view.form.end_date, view.form.min_proximity_days
    );
    if let Some(error) = &view.error {
        println!("Error: {error}");
    }
    if let Some(name) = &view.download_name {
        println!("Download name: {name}");
    }

    let direction = match view.sort.direction {
        SortDirection::Asc => "ascending",
        SortDirection::Desc => "descending",
    };
    println!("\n{RESULTS_TITLE} (by {}, {direction})", view.sort.key);
    if view.rows.is_empty() {
        println!("No assignments");
    } else {
        println!(
            "  {:<10}  {:<3}  {:<6}  {:>5}  {:>7}",
            "data", "gg", "turno", "peso", "squadra"
        );
        for row in &view.rows {
            println!("{}", row_line(row));
        }
    }

    if view.heavy_team_months.is_empty() {
        println!("\nHeavy team months: none");
    } else {
        println!("\nHeavy team months");
        for key in &view.heavy_team_months {
            println!(
                "- squadra {}: {}",
                key.team,
                key.month_label().unwrap_or("?")
            );
        }
    }

    for table in [&view.weights, &view.events].into_iter().flatten() {
        render_summary(table);
    }
}

fn render_summary(table: &SummaryTableView) {
    println!("\n{} ({})", table.title, table.sheet);
    println!("  {}", table.columns.join(" | "));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(cell_label).collect();
        println!("- {}", cells.join(" | "));
    }
}

fn row_line(row: &AssignmentRowView) -> String {
    format!(
        "- {:<10}  {:<3}  {:<6}  {:>5}  {:>7}",
        row.date,
        row.weekday.unwrap_or("-"),
        row.shift_label,
        row.weight.to_string(),
        row.team.to_string()
    )
}

/// Highlighted cells are bracketed.
fn cell_label(cell: &SummaryCellView) -> String {
    if cell.highlighted {
        format!("[{}]", cell.value)
    } else {
        cell.value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holiday_review::workbook::CellValue;

    fn service_with(result: &[u8]) -> ReviewService<StoredResultSolver> {
        ReviewService::new(
            Arc::new(StoredResultSolver::new(result.to_vec())),
            ComputeForm {
                start_date: "2025-01-01".to_string(),
                end_date: "2025-12-31".to_string(),
                min_proximity_days: "2".to_string(),
            },
        )
    }

    #[test]
    fn highlighted_cells_are_bracketed() {
        let highlighted = SummaryCellView {
            value: CellValue::Number(5.0),
            highlighted: true,
        };
        let plain = SummaryCellView {
            value: CellValue::Number(1.5),
            highlighted: false,
        };
        assert_eq!(cell_label(&highlighted), "[5]");
        assert_eq!(cell_label(&plain), "1.5");
    }

    #[test]
    fn row_line_shows_weekday_and_heavy_marker() {
        let row = AssignmentRowView {
            date: "2025-06-01".to_string(),
            weekday: Some("Dom"),
            shift: "MP".to_string(),
            shift_label: "MP ★".to_string(),
            weight: CellValue::Empty,
            team: CellValue::Number(3.0),
            heavy: true,
        };
        let line = row_line(&row);
        assert!(line.starts_with("- 2025-06-01  Dom  MP ★"));
        assert!(line.ends_with("      3"));
    }

    #[test]
    fn save_download_requires_a_result() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = save_download(&service_with(b"bytes"), dir.path()).expect_err("no result");
        assert!(matches!(error, AppError::Review(ReviewError::NoResult)));
    }

    #[tokio::test]
    async fn save_download_writes_timestamped_file() {
        let service = service_with(b"result bytes");
        service
            .select_input("Turni.xlsx", b"input".to_vec())
            .expect("input accepted");
        service.compute(SolveMode::Milp).await.expect("applied");

        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("risultati");
        let path = save_download(&service, &target).expect("saved");

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("file name");
        assert!(file_name.starts_with("Turni-"));
        assert!(file_name.ends_with(".xlsx"));
        assert_eq!(std::fs::read(&path).expect("read back"), b"result bytes");
    }
}
