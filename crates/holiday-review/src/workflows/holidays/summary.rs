use super::domain::{month_index_for_label, team_number, TeamMonthSet, TEAM_FIELD_CANDIDATES};
use crate::workbook::{Record, SheetTable};

/// Team of a summary row, read from the first team column spelling present.
pub fn summary_team(record: &Record) -> Option<i64> {
    TEAM_FIELD_CANDIDATES
        .iter()
        .find_map(|field| record.get(*field))
        .and_then(team_number)
}

/// True when `column` is a month label, the row's team had a heavy
/// assignment in that month, and the cell holds a positive count.
pub fn is_highlighted(record: &Record, column: &str, team_months: &TeamMonthSet) -> bool {
    let Some(month) = month_index_for_label(column) else {
        return false;
    };
    let Some(team) = summary_team(record) else {
        return false;
    };
    if !team_months.contains(team, month) {
        return false;
    }

    record
        .get(column)
        .and_then(|value| value.as_number())
        .is_some_and(|count| count > 0.0)
}

/// Highlight flags for every cell, row-major, following the table's column order.
pub fn highlight_matrix(table: &SheetTable, team_months: &TeamMonthSet) -> Vec<Vec<bool>> {
    table
        .rows()
        .iter()
        .map(|record| {
            table
                .columns()
                .iter()
                .map(|column| is_highlighted(record, column, team_months))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::CellValue;
    use crate::workflows::holidays::domain::{TeamMonthKey, EVENTS_SHEET};

    fn months(keys: &[(i64, u32)]) -> TeamMonthSet {
        keys.iter()
            .map(|(team, month)| TeamMonthKey {
                team: *team,
                month: *month,
            })
            .collect()
    }

    fn events(team_column: &str, team: CellValue, giu: CellValue) -> SheetTable {
        SheetTable::from_rows(
            EVENTS_SHEET,
            [team_column, "Mag", "Giu", "totale"],
            vec![[team, CellValue::Number(1.0), giu, CellValue::Number(9.0)]],
        )
    }

    #[test]
    fn flags_positive_cells_of_heavy_months() {
        let table = events("squadra", CellValue::Number(3.0), CellValue::Number(5.0));
        let flags = highlight_matrix(&table, &months(&[(3, 5)]));
        assert_eq!(flags, vec![vec![false, false, true, false]]);
    }

    #[test]
    fn zero_counts_are_not_flagged() {
        let table = events("squadra", CellValue::Number(3.0), CellValue::Number(0.0));
        assert!(!is_highlighted(&table.rows()[0], "Giu", &months(&[(3, 5)])));
    }

    #[test]
    fn alternative_team_spellings_are_recognised() {
        for column in ["Squadra", "squadra "] {
            let table = events(column, CellValue::text("3"), CellValue::text("2"));
            assert!(
                is_highlighted(&table.rows()[0], "Giu", &months(&[(3, 5)])),
                "column {column:?}"
            );
        }
    }

    #[test]
    fn first_present_spelling_wins() {
        let table = SheetTable::from_rows(
            EVENTS_SHEET,
            ["squadra", "Squadra", "Giu"],
            vec![[
                CellValue::text("n/a"),
                CellValue::Number(3.0),
                CellValue::Number(1.0),
            ]],
        );
        assert_eq!(summary_team(&table.rows()[0]), None);
        assert!(!is_highlighted(&table.rows()[0], "Giu", &months(&[(3, 5)])));
    }

    #[test]
    fn non_month_columns_are_never_flagged() {
        let table = events("squadra", CellValue::Number(3.0), CellValue::Number(5.0));
        assert!(!is_highlighted(&table.rows()[0], "totale", &months(&[(3, 5)])));
        assert!(!is_highlighted(&table.rows()[0], "squadra", &months(&[(3, 5)])));
    }
}
