use crate::report::{run_compute, run_heavy, run_review, run_template};
use crate::server;
use clap::{Args, Parser, Subcommand};
use holiday_review::error::AppError;
use holiday_review::workflows::holidays::{SolveMode, SortKey, TEMPLATE_FILE_NAME};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "Holiday Assignment Review",
    about = "Compute and review holiday shift assignments from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Download the blank input template from the solver
    Template(TemplateArgs),
    /// List the heavy holiday shifts declared in an input workbook
    Heavy(HeavyArgs),
    /// Send an input workbook to the solver and review the returned assignment
    Compute(ComputeArgs),
    /// Review an assignment workbook that was computed earlier
    Review(ReviewArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Preload an input workbook into the review session
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct TemplateArgs {
    /// Where to write the template
    #[arg(long, default_value = TEMPLATE_FILE_NAME)]
    pub(crate) output: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct HeavyArgs {
    /// Input workbook (.xlsx)
    #[arg(long)]
    pub(crate) input: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct ComputeArgs {
    /// Input workbook (.xlsx)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Solver strategy: greedy or milp
    #[arg(long, default_value = "greedy", value_parser = SolveMode::from_str)]
    pub(crate) mode: SolveMode,
    /// First day of the assignment window (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start_date: Option<chrono::NaiveDate>,
    /// Last day of the assignment window (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end_date: Option<chrono::NaiveDate>,
    /// Minimum days between two holidays assigned to the same team
    #[arg(long)]
    pub(crate) min_proximity_days: Option<u32>,
    #[command(flatten)]
    pub(crate) display: DisplayArgs,
    /// Directory where the result workbook is saved
    #[arg(long)]
    pub(crate) save_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ReviewArgs {
    /// Input workbook (.xlsx) holding the heavy holiday reference
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Result workbook previously returned by the solver
    #[arg(long)]
    pub(crate) result: PathBuf,
    #[command(flatten)]
    pub(crate) display: DisplayArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DisplayArgs {
    /// Column used to order the assignment rows: date, shift, weight, team
    #[arg(long, value_parser = SortKey::from_str)]
    pub(crate) sort: Option<SortKey>,
    /// Order rows descending
    #[arg(long)]
    pub(crate) descending: bool,
    /// Also write the ordered rows to this CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Template(args) => run_template(args).await,
        Command::Heavy(args) => run_heavy(args),
        Command::Compute(args) => run_compute(args).await,
        Command::Review(args) => run_review(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compute_arguments_parse_with_column_aliases() {
        let cli = Cli::try_parse_from([
            "holiday-review-api",
            "compute",
            "--input",
            "turni.xlsx",
            "--mode",
            "MILP",
            "--start-date",
            "2025-01-01",
            "--sort",
            "peso",
            "--descending",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Compute(args)) => {
                assert_eq!(args.mode, SolveMode::Milp);
                assert_eq!(
                    args.start_date,
                    chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                );
                assert!(args.end_date.is_none());
                assert_eq!(args.display.sort, Some(SortKey::Weight));
                assert!(args.display.descending);
            }
            other => panic!("expected compute command, got {other:?}"),
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result = Cli::try_parse_from([
            "holiday-review-api",
            "compute",
            "--input",
            "turni.xlsx",
            "--mode",
            "exact",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["holiday-review-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
