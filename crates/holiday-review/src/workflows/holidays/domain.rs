use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::workbook::CellValue;

/// Sheet of the input workbook listing heavy holiday shifts.
pub const HEAVY_SHEET: &str = "festivi-pesanti";
/// Canonical assignment sheet of the result workbook.
pub const ASSIGNMENT_SHEET: &str = "lista-festivi";
/// Weights-per-category summary sheet of the result workbook.
pub const WEIGHTS_SHEET: &str = "riepilogo-pesi";
/// Events-per-team-per-month summary sheet of the result workbook.
pub const EVENTS_SHEET: &str = "riepilogo-eventi";

pub const DATE_FIELD: &str = "data";
pub const SHIFT_FIELD: &str = "turno";
pub const WEIGHT_FIELD: &str = "peso";
pub const ASSIGNED_TEAM_FIELD: &str = "squadra assegnata";

/// Accepted spellings of the team column in the events summary, tried in order.
pub const TEAM_FIELD_CANDIDATES: [&str; 3] = ["squadra", "Squadra", "squadra "];

/// Month column labels of the events summary; the position is the month index.
pub const MONTH_LABELS: [&str; 12] = [
    "Gen", "Feb", "Mar", "Apr", "Mag", "Giu", "Lug", "Ago", "Set", "Ott", "Nov", "Dic",
];

/// Weekday labels indexed by days from Sunday.
pub const WEEKDAY_LABELS: [&str; 7] = ["Dom", "Lun", "Mar", "Mer", "Gio", "Ven", "Sab"];

/// Two-person weekend shift whose Saturday and Sunday legs share the heavy flag.
pub const WEEKEND_PAIR_SHIFT: &str = "MP";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn weekday_label(date: NaiveDate) -> &'static str {
    WEEKDAY_LABELS[date.weekday().num_days_from_sunday() as usize]
}

pub fn month_index_for_label(label: &str) -> Option<u32> {
    MONTH_LABELS
        .iter()
        .position(|candidate| *candidate == label)
        .map(|index| index as u32)
}

pub fn normalize_shift(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Integral team identifier read from a cell; anything else is not a team.
pub fn team_number(value: &CellValue) -> Option<i64> {
    let number = value.as_number()?;
    if number.fract() != 0.0 || number.abs() > i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}

/// Lookup key composed of a trimmed date string and an upper-cased shift code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeavyKey(String);

impl HeavyKey {
    pub fn new(date: &str, shift: &str) -> Self {
        Self(format!("{}|{}", date.trim(), normalize_shift(shift)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeavyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Heavy holiday shifts of the current input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeavySet {
    keys: HashSet<HeavyKey>,
}

impl HeavySet {
    pub fn contains(&self, date: &str, shift: &str) -> bool {
        self.keys.contains(&HeavyKey::new(date, shift))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in lexical order.
    pub fn sorted_keys(&self) -> Vec<&HeavyKey> {
        let mut keys: Vec<&HeavyKey> = self.keys.iter().collect();
        keys.sort();
        keys
    }
}

impl FromIterator<HeavyKey> for HeavySet {
    fn from_iter<I: IntoIterator<Item = HeavyKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// One computed shift assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRow {
    pub date: String,
    pub shift: String,
    pub weight: CellValue,
    pub team: CellValue,
    pub is_heavy: bool,
}

impl AssignmentRow {
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }

    pub fn team_number(&self) -> Option<i64> {
        team_number(&self.team)
    }

    pub fn is_weekend_pair(&self) -> bool {
        self.shift == WEEKEND_PAIR_SHIFT
    }
}

/// A team together with a zero-based month index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TeamMonthKey {
    pub team: i64,
    pub month: u32,
}

impl TeamMonthKey {
    pub fn month_label(&self) -> Option<&'static str> {
        MONTH_LABELS.get(self.month as usize).copied()
    }
}

/// Team/month pairs holding at least one heavy assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMonthSet {
    keys: BTreeSet<TeamMonthKey>,
}

impl TeamMonthSet {
    pub fn contains(&self, team: i64, month: u32) -> bool {
        self.keys.contains(&TeamMonthKey { team, month })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamMonthKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<TeamMonthKey> for TeamMonthSet {
    fn from_iter<I: IntoIterator<Item = TeamMonthKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Input workbook chosen by the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    bytes: Arc<Vec<u8>>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_xlsx(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".xlsx")
    }

    /// File name without the `.xlsx` extension, or `output` when nothing remains.
    pub fn base_name(&self) -> String {
        base_name(&self.name)
    }
}

pub fn base_name(file_name: &str) -> String {
    let stem = if file_name.to_ascii_lowercase().ends_with(".xlsx") {
        &file_name[..file_name.len() - ".xlsx".len()]
    } else {
        file_name
    };

    if stem.is_empty() {
        "output".to_string()
    } else {
        stem.to_string()
    }
}
