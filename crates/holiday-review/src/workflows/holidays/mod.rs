//! Holiday assignment review: heavy-shift reference, result decoding,
//! team/month highlighting and the review session around a remote solver.

pub mod aggregator;
pub mod domain;
pub mod export;
pub mod form;
pub mod heavy;
pub mod normalizer;
pub mod router;
pub mod service;
pub mod session;
pub mod solver;
pub mod sorter;
pub mod summary;
pub mod tables;
pub mod views;

#[cfg(test)]
mod tests;

pub use aggregator::heavy_team_months;
pub use domain::{
    AssignmentRow, HeavyKey, HeavySet, InputFile, TeamMonthKey, TeamMonthSet, ASSIGNMENT_SHEET,
    EVENTS_SHEET, HEAVY_SHEET, WEIGHTS_SHEET,
};
pub use export::{download_file_name, write_rows_csv};
pub use form::{ComputeForm, ValidationError};
pub use normalizer::normalize_assignments;
pub use router::review_router;
pub use service::{ComputeOutcome, ReviewError, ReviewService};
pub use session::{Completion, DecodedResult, ResultDownload, ReviewSession};
pub use solver::{
    AssignmentSolver, ComputeRequest, HttpSolver, SolveMode, TransportError, TEMPLATE_FILE_NAME,
};
pub use sorter::{sort_rows, SortDirection, SortKey, SortState};
pub use summary::is_highlighted;
pub use tables::ReviewTables;
pub use views::{AssignmentRowView, ReviewView, SummaryCellView, SummaryTableView};
