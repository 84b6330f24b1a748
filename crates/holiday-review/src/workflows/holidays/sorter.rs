use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::domain::AssignmentRow;
use crate::workbook::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    #[serde(alias = "data")]
    Date,
    #[serde(alias = "turno")]
    Shift,
    #[serde(alias = "peso")]
    Weight,
    #[serde(alias = "squadra")]
    Team,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Shift => "shift",
            SortKey::Weight => "weight",
            SortKey::Team => "team",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortKey {
    type Err = String;

    /// Accepts the English keys as well as the sheet column names.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" | "data" => Ok(SortKey::Date),
            "shift" | "turno" => Ok(SortKey::Shift),
            "weight" | "peso" => Ok(SortKey::Weight),
            "team" | "squadra" => Ok(SortKey::Team),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    /// Same key toggles the direction; a new key starts ascending.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                key,
                direction: SortDirection::Asc,
            }
        }
    }
}

/// Ordered view of `rows`. The input is untouched and ties keep their
/// original relative order.
pub fn sort_rows(rows: &[AssignmentRow], state: SortState) -> Vec<&AssignmentRow> {
    let mut ordered: Vec<&AssignmentRow> = rows.iter().collect();
    ordered.sort_by(|left, right| {
        let ordering = compare(left, right, state.key);
        match state.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    ordered
}

fn compare(left: &AssignmentRow, right: &AssignmentRow, key: SortKey) -> Ordering {
    match key {
        // Unparseable dates order before every calendar date.
        SortKey::Date => left.calendar_date().cmp(&right.calendar_date()),
        SortKey::Shift => collate(&left.shift, &right.shift),
        SortKey::Weight => numeric(&left.weight).total_cmp(&numeric(&right.weight)),
        SortKey::Team => numeric(&left.team).total_cmp(&numeric(&right.team)),
    }
}

fn numeric(value: &CellValue) -> f64 {
    value.as_number().unwrap_or(0.0)
}

/// Case-insensitive comparison with the raw text as tie breaker.
pub(crate) fn collate(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}
