use tracing::{info, warn};

use super::aggregator::heavy_team_months;
use super::domain::{
    AssignmentRow, HeavySet, TeamMonthSet, ASSIGNMENT_SHEET, EVENTS_SHEET, WEIGHTS_SHEET,
};
use super::normalizer::normalize_assignments;
use crate::workbook::{DecodeError, SheetTable, WorkbookReader};

/// Everything derived from one result workbook. Replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewTables {
    pub assignments: Vec<AssignmentRow>,
    pub team_months: TeamMonthSet,
    pub weights: Option<SheetTable>,
    pub events: Option<SheetTable>,
    /// Set when the result bytes could not be decoded.
    pub decode_error: Option<String>,
}

impl ReviewTables {
    /// Decodes a result workbook against the heavy reference.
    pub fn decode(bytes: &[u8], heavy: &HeavySet) -> Result<Self, DecodeError> {
        let mut reader = WorkbookReader::from_bytes(bytes)?;

        // Results without the canonical sheet fall back to the first one.
        let assignment_sheet = reader.sheet_or_first(ASSIGNMENT_SHEET)?;
        let assignments = normalize_assignments(&assignment_sheet, heavy);
        let team_months = heavy_team_months(&assignments);
        let weights = reader.try_sheet(WEIGHTS_SHEET)?;
        let events = reader.try_sheet(EVENTS_SHEET)?;

        info!(
            sheet = assignment_sheet.name(),
            rows = assignments.len(),
            heavy_rows = assignments.iter().filter(|row| row.is_heavy).count(),
            team_months = team_months.len(),
            "decoded assignment result"
        );

        Ok(Self {
            assignments,
            team_months,
            weights,
            events,
            decode_error: None,
        })
    }

    /// Like [`ReviewTables::decode`], but a failure leaves every table empty
    /// and only records the cause.
    pub fn from_result_bytes(bytes: &[u8], heavy: &HeavySet) -> Self {
        match Self::decode(bytes, heavy) {
            Ok(tables) => tables,
            Err(error) => {
                warn!(%error, "unable to decode assignment result");
                Self {
                    decode_error: Some(error.to_string()),
                    ..Self::default()
                }
            }
        }
    }

    pub fn heavy_rows(&self) -> usize {
        self.assignments.iter().filter(|row| row.is_heavy).count()
    }
}
