//! Review session state.
//!
//! The session is a plain value; every transition consumes it and returns the
//! next one. Result-derived state lives in a single [`ReviewResult`] so a new
//! result replaces rows, team months and summaries together.

use chrono::NaiveDateTime;
use std::sync::Arc;

use super::domain::{AssignmentRow, HeavySet, InputFile};
use super::export::download_file_name;
use super::form::{ComputeForm, ValidationError};
use super::solver::{ComputeRequest, SolveMode, TransportError};
use super::sorter::{sort_rows, SortKey, SortState};
use super::tables::ReviewTables;
use super::views::{
    AssignmentRowView, ReviewView, SummaryTableView, EVENTS_TITLE, WEIGHTS_TITLE,
};

/// Identifier of one dispatched computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A computation ready to be sent to the solver.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: RequestId,
    pub request: ComputeRequest,
    pub input: InputFile,
    /// Heavy reference of `input`, used to decode the response.
    pub heavy: Arc<HeavySet>,
}

/// Solver output decoded against the heavy reference of its request.
#[derive(Debug, Clone, Default)]
pub struct DecodedResult {
    bytes: Vec<u8>,
    tables: ReviewTables,
}

impl DecodedResult {
    /// Never fails; undecodable bytes keep empty tables and the cause.
    pub fn decode(bytes: Vec<u8>, heavy: &HeavySet) -> Self {
        let tables = ReviewTables::from_result_bytes(&bytes, heavy);
        Self { bytes, tables }
    }

    pub fn tables(&self) -> &ReviewTables {
        &self.tables
    }
}

/// Output of the latest applied computation.
#[derive(Debug, Clone, Default)]
pub struct ReviewResult {
    generation: u64,
    bytes: Option<Arc<Vec<u8>>>,
    tables: Arc<ReviewTables>,
}

impl ReviewResult {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref().map(Vec::as_slice)
    }

    pub fn tables(&self) -> &ReviewTables {
        &self.tables
    }
}

/// How a solver response was folded into the session.
#[derive(Debug)]
pub enum Completion {
    Applied { generation: u64 },
    Failed(TransportError),
    /// The response belongs to a request that is no longer current.
    Stale,
}

/// Result bytes ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    input: Option<InputFile>,
    heavy: Arc<HeavySet>,
    form: ComputeForm,
    result: ReviewResult,
    sort: SortState,
    pending: Option<RequestId>,
    last_request: u64,
    error: Option<String>,
}

impl ReviewSession {
    pub fn new(form: ComputeForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn input(&self) -> Option<&InputFile> {
        self.input.as_ref()
    }

    pub fn heavy(&self) -> &HeavySet {
        &self.heavy
    }

    pub fn form(&self) -> &ComputeForm {
        &self.form
    }

    pub fn result(&self) -> &ReviewResult {
        &self.result
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn is_computing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Adopts a new input file and its heavy reference. Any in-flight
    /// computation becomes stale.
    pub fn with_input(self, input: InputFile, heavy: HeavySet) -> Self {
        Self {
            input: Some(input),
            heavy: Arc::new(heavy),
            pending: None,
            error: None,
            ..self
        }
    }

    /// Drops the current input after a refused selection.
    pub fn without_input(self, error: &ValidationError) -> Self {
        Self {
            input: None,
            heavy: Arc::default(),
            pending: None,
            error: Some(error.to_string()),
            ..self
        }
    }

    pub fn with_form(self, form: ComputeForm) -> Self {
        Self { form, ..self }
    }

    pub fn with_error(self, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..self
        }
    }

    /// Checks that a computation may start, without changing the session.
    pub fn prepare_compute(&self, mode: SolveMode) -> Result<PendingRequest, ValidationError> {
        if self.pending.is_some() {
            return Err(ValidationError::ComputationPending);
        }
        let input = self.input.clone().ok_or(ValidationError::MissingInput)?;
        if !input.is_xlsx() {
            return Err(ValidationError::UnsupportedInput(input.name().to_string()));
        }
        let request = self.form.validate(mode)?;

        Ok(PendingRequest {
            id: RequestId(self.last_request + 1),
            request,
            input,
            heavy: Arc::clone(&self.heavy),
        })
    }

    /// Marks `pending` as the current request. Previous tables are cleared
    /// until a response arrives.
    pub fn begin(self, pending: &PendingRequest) -> Self {
        let result = ReviewResult {
            generation: self.result.generation,
            bytes: None,
            tables: Arc::default(),
        };

        Self {
            pending: Some(pending.id),
            last_request: pending.id.0,
            error: None,
            result,
            ..self
        }
    }

    /// Folds a solver response in, unless it answers a superseded request.
    pub fn complete(
        self,
        id: RequestId,
        outcome: Result<DecodedResult, TransportError>,
    ) -> (Self, Completion) {
        if self.pending != Some(id) {
            return (self, Completion::Stale);
        }

        match outcome {
            Ok(decoded) => {
                let generation = self.result.generation + 1;
                let result = ReviewResult {
                    generation,
                    bytes: Some(Arc::new(decoded.bytes)),
                    tables: Arc::new(decoded.tables),
                };
                let session = Self {
                    pending: None,
                    result,
                    ..self
                };
                (session, Completion::Applied { generation })
            }
            Err(error) => {
                let session = Self {
                    pending: None,
                    error: Some(error.to_string()),
                    ..self
                };
                (session, Completion::Failed(error))
            }
        }
    }

    pub fn sort_by(self, key: SortKey) -> Self {
        Self {
            sort: self.sort.select(key),
            ..self
        }
    }

    /// Current rows in the selected order.
    pub fn sorted_rows(&self) -> Vec<&AssignmentRow> {
        sort_rows(&self.result.tables.assignments, self.sort)
    }

    fn download_base(&self) -> String {
        self.input
            .as_ref()
            .map(InputFile::base_name)
            .unwrap_or_else(|| "output".to_string())
    }

    pub fn download(&self, at: NaiveDateTime) -> Option<ResultDownload> {
        let bytes = self.result.bytes()?;
        Some(ResultDownload {
            file_name: download_file_name(&self.download_base(), at),
            bytes: bytes.to_vec(),
        })
    }

    pub fn view(&self, at: NaiveDateTime) -> ReviewView {
        let tables = self.result.tables();
        let has_result = self.result.bytes.is_some();

        ReviewView {
            input_name: self.input.as_ref().map(|input| input.name().to_string()),
            heavy_keys: self.heavy.len(),
            form: self.form.clone(),
            computing: self.is_computing(),
            error: self.error.clone(),
            generation: self.result.generation,
            has_result,
            download_name: has_result
                .then(|| download_file_name(&self.download_base(), at)),
            decode_error: tables.decode_error.clone(),
            sort: self.sort,
            rows: self
                .sorted_rows()
                .into_iter()
                .map(AssignmentRowView::from)
                .collect(),
            heavy_team_months: tables.team_months.iter().copied().collect(),
            weights: tables
                .weights
                .as_ref()
                .map(|table| SummaryTableView::plain(WEIGHTS_TITLE, table)),
            events: tables.events.as_ref().map(|table| {
                SummaryTableView::highlighted(EVENTS_TITLE, table, &tables.team_months)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::holidays::domain::HeavyKey;

    fn ready_session() -> ReviewSession {
        let form = ComputeForm {
            start_date: "2025-01-01".to_string(),
            end_date: "2025-12-31".to_string(),
            min_proximity_days: "2".to_string(),
        };
        let heavy: HeavySet = [HeavyKey::new("2025-06-07", "MP")].into_iter().collect();
        ReviewSession::new(form).with_input(InputFile::new("turni.xlsx", vec![1, 2, 3]), heavy)
    }

    #[test]
    fn compute_requires_an_input_file() {
        let session = ReviewSession::new(ComputeForm::default());
        assert_eq!(
            session.prepare_compute(SolveMode::Greedy).expect_err("no input"),
            ValidationError::MissingInput
        );
    }

    #[test]
    fn compute_rejects_non_xlsx_input() {
        let session = ReviewSession::default()
            .with_input(InputFile::new("turni.csv", Vec::new()), HeavySet::default());
        assert!(matches!(
            session.prepare_compute(SolveMode::Greedy),
            Err(ValidationError::UnsupportedInput(name)) if name == "turni.csv"
        ));
    }

    #[test]
    fn second_compute_is_rejected_while_pending() {
        let session = ready_session();
        let pending = session.prepare_compute(SolveMode::Greedy).expect("valid");
        let session = session.begin(&pending);
        assert!(session.is_computing());
        assert_eq!(
            session.prepare_compute(SolveMode::Milp).expect_err("pending"),
            ValidationError::ComputationPending
        );
    }

    #[test]
    fn transport_failure_records_error_and_keeps_tables_empty() {
        let session = ready_session();
        let pending = session.prepare_compute(SolveMode::Milp).expect("valid");
        let (session, completion) = session.begin(&pending).complete(
            pending.id,
            Err(TransportError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
        );

        assert!(matches!(completion, Completion::Failed(_)));
        assert!(!session.is_computing());
        assert_eq!(session.error(), Some("solver responded with status 500: boom"));
        assert!(session.result().tables().assignments.is_empty());
        assert!(session.result().bytes().is_none());
    }

    #[test]
    fn new_input_makes_in_flight_response_stale() {
        let session = ready_session();
        let pending = session.prepare_compute(SolveMode::Greedy).expect("valid");
        let session = session
            .begin(&pending)
            .with_input(InputFile::new("altro.xlsx", Vec::new()), HeavySet::default());

        let decoded = DecodedResult::decode(vec![0; 4], &pending.heavy);
        let (session, completion) = session.complete(pending.id, Ok(decoded));
        assert!(matches!(completion, Completion::Stale));
        assert!(session.result().bytes().is_none());
        assert_eq!(session.result().generation(), 0);

        let next = session.prepare_compute(SolveMode::Greedy).expect("valid");
        assert!(next.id > pending.id);
    }

    #[test]
    fn undecodable_result_is_kept_for_download() {
        let session = ready_session();
        let pending = session.prepare_compute(SolveMode::Greedy).expect("valid");
        let decoded = DecodedResult::decode(b"not a workbook".to_vec(), &pending.heavy);
        let (session, completion) = session.begin(&pending).complete(pending.id, Ok(decoded));

        assert!(matches!(completion, Completion::Applied { generation: 1 }));
        assert!(session.error().is_none());
        assert!(session.result().tables().decode_error.is_some());

        let at = chrono::NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let download = session.download(at).expect("bytes retained");
        assert_eq!(download.file_name, "turni-20250102030405.xlsx");
        assert_eq!(download.bytes, b"not a workbook");
    }

    #[test]
    fn pending_request_carries_the_heavy_reference_of_its_input() {
        let session = ready_session();
        let pending = session.prepare_compute(SolveMode::Greedy).expect("valid");
        assert!(pending.heavy.contains("2025-06-07", "MP"));

        let session = session
            .begin(&pending)
            .with_input(InputFile::new("altro.xlsx", Vec::new()), HeavySet::default());
        assert!(session.heavy().is_empty());
        assert_eq!(pending.heavy.len(), 1);
    }
}
