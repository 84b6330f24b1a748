use chrono::{Local, NaiveDateTime};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use super::domain::{HeavySet, InputFile};
use super::export::write_rows_csv;
use super::form::{ComputeForm, ValidationError};
use super::session::{Completion, DecodedResult, ResultDownload, ReviewSession};
use super::solver::{AssignmentSolver, SolveMode, TransportError};
use super::sorter::{SortKey, SortState};
use super::views::ReviewView;
use crate::workbook::DecodeError;

/// What a compute call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeOutcome {
    Applied {
        generation: u64,
        rows: usize,
        heavy_rows: usize,
        decode_error: Option<String>,
    },
    /// A newer request or input superseded this one; its response was dropped.
    Discarded,
}

/// Session holder shared by the HTTP handlers and the CLI.
pub struct ReviewService<S> {
    session: Mutex<ReviewSession>,
    solver: Arc<S>,
}

impl<S> ReviewService<S>
where
    S: AssignmentSolver + 'static,
{
    pub fn new(solver: Arc<S>, form: ComputeForm) -> Self {
        Self {
            session: Mutex::new(ReviewSession::new(form)),
            solver,
        }
    }

    /// Applies one transition. The lock is never held across an await.
    fn transition<T>(&self, apply: impl FnOnce(ReviewSession) -> (ReviewSession, T)) -> T {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let (next, output) = apply(std::mem::take(&mut *guard));
        *guard = next;
        output
    }

    pub fn snapshot(&self) -> ReviewSession {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Selects a new input workbook and reloads its heavy reference.
    pub fn select_input(&self, name: &str, bytes: Vec<u8>) -> Result<usize, ReviewError> {
        let input = InputFile::new(name, bytes);
        if !input.is_xlsx() {
            let error = ValidationError::UnsupportedInput(name.to_string());
            self.transition(|session| (session.without_input(&error), ()));
            return Err(error.into());
        }

        let heavy = HeavySet::load(input.bytes());
        let keys = heavy.len();
        info!(input = name, heavy_keys = keys, "selected input workbook");
        self.transition(|session| (session.with_input(input, heavy), ()));
        Ok(keys)
    }

    pub fn update_form(&self, form: ComputeForm) {
        self.transition(|session| (session.with_form(form), ()));
    }

    pub fn sort_by(&self, key: SortKey) -> SortState {
        self.transition(|session| {
            let session = session.sort_by(key);
            let state = session.sort();
            (session, state)
        })
    }

    /// Validates the form, calls the solver, and applies the response unless
    /// a newer request has superseded it meanwhile.
    pub async fn compute(&self, mode: SolveMode) -> Result<ComputeOutcome, ReviewError> {
        let pending = self.transition(|session| match session.prepare_compute(mode) {
            Ok(pending) => (session.begin(&pending), Ok(pending)),
            Err(error) => (session.with_error(error.to_string()), Err(error)),
        })?;

        info!(
            request = pending.id.value(),
            %mode,
            input = pending.input.name(),
            "dispatching assignment computation"
        );
        let response = self.solver.compute(&pending.request, &pending.input).await;

        // Decoding happens before the session lock is taken.
        let decoded = response.map(|bytes| DecodedResult::decode(bytes, &pending.heavy));

        let (completion, applied) = self.transition(|session| {
            let (session, completion) = session.complete(pending.id, decoded);
            let result = session.result();
            let applied = ComputeOutcome::Applied {
                generation: result.generation(),
                rows: result.tables().assignments.len(),
                heavy_rows: result.tables().heavy_rows(),
                decode_error: result.tables().decode_error.clone(),
            };
            (session, (completion, applied))
        });

        match completion {
            Completion::Applied { generation } => {
                info!(generation, "applied assignment result");
                Ok(applied)
            }
            Completion::Stale => {
                warn!(request = pending.id.value(), "discarding superseded solver response");
                Ok(ComputeOutcome::Discarded)
            }
            Completion::Failed(error) => {
                warn!(request = pending.id.value(), %error, "assignment computation failed");
                Err(error.into())
            }
        }
    }

    pub async fn template(&self) -> Result<Vec<u8>, ReviewError> {
        Ok(self.solver.template().await?)
    }

    pub fn download_at(&self, at: NaiveDateTime) -> Option<ResultDownload> {
        self.snapshot().download(at)
    }

    pub fn download(&self) -> Option<ResultDownload> {
        self.download_at(Local::now().naive_local())
    }

    /// Writes the current rows, in display order, as CSV.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, ReviewError> {
        let session = self.snapshot();
        if session.result().bytes().is_none() {
            return Err(ReviewError::NoResult);
        }
        let rows = session.sorted_rows();
        write_rows_csv(&rows, writer)?;
        Ok(rows.len())
    }

    pub fn view(&self) -> ReviewView {
        self.snapshot().view(Local::now().naive_local())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("no computed result available")]
    NoResult,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
