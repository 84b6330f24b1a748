use chrono::NaiveDate;
use holiday_review::error::AppError;
use holiday_review::workflows::holidays::{
    AssignmentSolver, ComputeRequest, InputFile, ReviewService, SortDirection, SortKey, SortState,
    TransportError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Solver stand-in that answers every computation with a workbook read from
/// disk, used to review a result offline.
pub(crate) struct StoredResultSolver {
    result: Vec<u8>,
}

impl StoredResultSolver {
    pub(crate) fn new(result: Vec<u8>) -> Self {
        Self { result }
    }
}

impl AssignmentSolver for StoredResultSolver {
    async fn compute(
        &self,
        _request: &ComputeRequest,
        _input: &InputFile,
    ) -> Result<Vec<u8>, TransportError> {
        Ok(self.result.clone())
    }

    async fn template(&self) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Request(
            "no solver configured for offline review".to_string(),
        ))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Reads a workbook from disk, keeping its file name for the session.
pub(crate) fn read_workbook(path: &Path) -> Result<(String, Vec<u8>), AppError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((name, bytes))
}

/// Drives the session's toggle-style sorting until it matches the requested
/// key and direction.
pub(crate) fn apply_sort<S>(
    service: &ReviewService<S>,
    key: Option<SortKey>,
    descending: bool,
) -> SortState
where
    S: AssignmentSolver + 'static,
{
    let target = SortState {
        key: key.unwrap_or_default(),
        direction: if descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    };

    let mut state = service.snapshot().sort();
    while state != target {
        state = service.sort_by(target.key);
    }
    state
}
