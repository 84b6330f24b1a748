//! Seam to the remote assignment solver.

mod http;

pub use http::HttpSolver;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

use super::domain::InputFile;

/// Name under which the blank template is saved.
pub const TEMPLATE_FILE_NAME: &str = "festivi-template.xlsx";

/// Strategy the solver uses to build the assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveMode {
    Greedy,
    Milp,
}

impl SolveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveMode::Greedy => "greedy",
            SolveMode::Milp => "milp",
        }
    }
}

impl fmt::Display for SolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolveMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(SolveMode::Greedy),
            "milp" => Ok(SolveMode::Milp),
            other => Err(format!("unknown solve mode '{other}' (expected greedy or milp)")),
        }
    }
}

/// Validated parameters of one computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeRequest {
    pub mode: SolveMode,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_proximity_days: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("solver responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("solver request failed: {0}")]
    Request(String),
}

/// Remote computation of holiday assignments.
pub trait AssignmentSolver: Send + Sync {
    /// Runs one computation and returns the result workbook bytes.
    fn compute(
        &self,
        request: &ComputeRequest,
        input: &InputFile,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Fetches the blank input template.
    fn template(&self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}
