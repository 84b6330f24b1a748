use serde::Serialize;

use super::domain::{weekday_label, AssignmentRow, TeamMonthKey, TeamMonthSet};
use super::form::ComputeForm;
use super::sorter::SortState;
use super::summary::highlight_matrix;
use crate::workbook::{CellValue, SheetTable};

pub const HEAVY_MARKER: &str = "★";
pub const WEIGHTS_TITLE: &str = "Riepilogo Pesi";
pub const EVENTS_TITLE: &str = "Riepilogo Eventi";
pub const RESULTS_TITLE: &str = "Risultati calcolo";

/// Display form of one assignment row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRowView {
    pub date: String,
    pub weekday: Option<&'static str>,
    pub shift: String,
    pub shift_label: String,
    pub weight: CellValue,
    pub team: CellValue,
    pub heavy: bool,
}

impl From<&AssignmentRow> for AssignmentRowView {
    fn from(row: &AssignmentRow) -> Self {
        let shift_label = if row.is_heavy {
            format!("{} {HEAVY_MARKER}", row.shift)
        } else {
            row.shift.clone()
        };

        Self {
            date: row.date.clone(),
            weekday: row.calendar_date().map(weekday_label),
            shift: row.shift.clone(),
            shift_label,
            weight: row.weight.clone(),
            team: row.team.clone(),
            heavy: row.is_heavy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCellView {
    pub value: CellValue,
    pub highlighted: bool,
}

/// Schema-less summary sheet with per-cell highlight flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTableView {
    pub title: &'static str,
    pub sheet: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SummaryCellView>>,
}

impl SummaryTableView {
    /// Table without highlighting.
    pub fn plain(title: &'static str, table: &SheetTable) -> Self {
        Self::build(title, table, |_, _| false)
    }

    /// Table with heavy team/month cells flagged.
    pub fn highlighted(title: &'static str, table: &SheetTable, team_months: &TeamMonthSet) -> Self {
        let flags = highlight_matrix(table, team_months);
        Self::build(title, table, |row, column| flags[row][column])
    }

    fn build(title: &'static str, table: &SheetTable, flag: impl Fn(usize, usize) -> bool) -> Self {
        let rows = table
            .rows()
            .iter()
            .enumerate()
            .map(|(row_index, record)| {
                table
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(column_index, column)| SummaryCellView {
                        value: record.get(column).cloned().unwrap_or(CellValue::Empty),
                        highlighted: flag(row_index, column_index),
                    })
                    .collect()
            })
            .collect();

        Self {
            title,
            sheet: table.name().to_string(),
            columns: table.columns().to_vec(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Snapshot of the whole review session, as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub input_name: Option<String>,
    pub heavy_keys: usize,
    pub form: ComputeForm,
    pub computing: bool,
    pub error: Option<String>,
    pub generation: u64,
    pub has_result: bool,
    pub download_name: Option<String>,
    pub decode_error: Option<String>,
    pub sort: SortState,
    pub rows: Vec<AssignmentRowView>,
    pub heavy_team_months: Vec<TeamMonthKey>,
    pub weights: Option<SummaryTableView>,
    pub events: Option<SummaryTableView>,
}
