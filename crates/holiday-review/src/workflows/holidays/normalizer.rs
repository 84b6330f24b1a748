use chrono::{Datelike, NaiveDate, Weekday};

use super::domain::{
    format_calendar_date, normalize_shift, parse_calendar_date, AssignmentRow, HeavySet,
    ASSIGNED_TEAM_FIELD, DATE_FIELD, SHIFT_FIELD, WEEKEND_PAIR_SHIFT, WEIGHT_FIELD,
};
use crate::workbook::{CellValue, SheetTable};

/// Converts the assignment sheet into annotated rows. Records with a blank
/// date or shift are dropped.
pub fn normalize_assignments(table: &SheetTable, heavy: &HeavySet) -> Vec<AssignmentRow> {
    table
        .rows()
        .iter()
        .filter_map(|record| {
            let date = record.get(DATE_FIELD).filter(|value| !value.is_blank())?;
            let shift = record.get(SHIFT_FIELD).filter(|value| !value.is_blank())?;

            let date = date.to_string().trim().to_string();
            let shift = normalize_shift(&shift.to_string());
            let is_heavy = is_heavy(&date, &shift, heavy);

            Some(AssignmentRow {
                date,
                shift,
                weight: field(record.get(WEIGHT_FIELD)),
                team: field(record.get(ASSIGNED_TEAM_FIELD)),
                is_heavy,
            })
        })
        .collect()
}

fn field(value: Option<&CellValue>) -> CellValue {
    value.cloned().unwrap_or(CellValue::Empty)
}

/// Direct membership, or for the weekend pair shift, membership of the other
/// weekend day.
pub fn is_heavy(date: &str, shift: &str, heavy: &HeavySet) -> bool {
    if heavy.contains(date, shift) {
        return true;
    }

    if shift != WEEKEND_PAIR_SHIFT {
        return false;
    }

    parse_calendar_date(date)
        .and_then(weekend_partner)
        .is_some_and(|partner| heavy.contains(&format_calendar_date(partner), WEEKEND_PAIR_SHIFT))
}

/// Saturday pairs with the following Sunday and Sunday with the preceding
/// Saturday; weekdays have no partner.
pub fn weekend_partner(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => date.succ_opt(),
        Weekday::Sun => date.pred_opt(),
        _ => None,
    }
}
