use chrono::{Datelike, Weekday};

use super::domain::{AssignmentRow, TeamMonthKey, TeamMonthSet};

/// Team/month pairs with at least one heavy assignment. Rows without an
/// integral team or a parseable date contribute nothing.
pub fn heavy_team_months(rows: &[AssignmentRow]) -> TeamMonthSet {
    rows.iter()
        .filter(|row| row.is_heavy)
        .filter_map(|row| {
            let team = row.team_number()?;
            let month = attributed_month(row)?;
            Some(TeamMonthKey { team, month })
        })
        .collect()
}

/// Zero-based month a row counts towards. The Sunday leg of the weekend pair
/// belongs to the month of its Saturday.
pub fn attributed_month(row: &AssignmentRow) -> Option<u32> {
    let date = row.calendar_date()?;
    let anchor = if row.is_weekend_pair() && date.weekday() == Weekday::Sun {
        date.pred_opt()?
    } else {
        date
    };
    Some(anchor.month0())
}
