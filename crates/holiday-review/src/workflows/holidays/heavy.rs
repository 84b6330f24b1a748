use tracing::{debug, warn};

use super::domain::{HeavyKey, HeavySet, DATE_FIELD, HEAVY_SHEET, SHIFT_FIELD};
use crate::workbook::{SheetTable, WorkbookReader};

impl HeavySet {
    /// Builds the set from a decoded heavy-holiday sheet. Records without a
    /// date or a shift are skipped.
    pub fn from_table(table: &SheetTable) -> Self {
        table
            .rows()
            .iter()
            .filter_map(|record| {
                let date = record.get(DATE_FIELD).filter(|value| !value.is_blank())?;
                let shift = record.get(SHIFT_FIELD).filter(|value| !value.is_blank())?;
                Some(HeavyKey::new(&date.to_string(), &shift.to_string()))
            })
            .collect()
    }

    /// Loads the heavy set of an input workbook. An unreadable workbook or a
    /// missing sheet yields an empty set; the cause is only logged.
    pub fn load(bytes: &[u8]) -> Self {
        let table = WorkbookReader::from_bytes(bytes)
            .and_then(|mut reader| reader.try_sheet(HEAVY_SHEET));

        match table {
            Ok(Some(table)) => {
                let set = Self::from_table(&table);
                debug!(keys = set.len(), "loaded heavy holiday reference");
                set
            }
            Ok(None) => {
                warn!(sheet = HEAVY_SHEET, "input workbook has no heavy holiday sheet");
                Self::default()
            }
            Err(error) => {
                warn!(%error, "unable to read heavy holiday reference");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::CellValue;

    fn heavy_table() -> SheetTable {
        SheetTable::from_rows(
            HEAVY_SHEET,
            ["data", "turno", "note"],
            vec![
                [
                    CellValue::text(" 2025-06-07 "),
                    CellValue::text("mp"),
                    CellValue::Empty,
                ],
                [
                    CellValue::text("2025-12-25"),
                    CellValue::text("N"),
                    CellValue::text("Natale"),
                ],
                [CellValue::Empty, CellValue::text("M"), CellValue::Empty],
                [
                    CellValue::text("2025-08-15"),
                    CellValue::text("  "),
                    CellValue::Empty,
                ],
            ],
        )
    }

    #[test]
    fn skips_records_missing_date_or_shift() {
        let set = HeavySet::from_table(&heavy_table());
        assert_eq!(set.len(), 2);
        assert!(set.contains("2025-06-07", "MP"));
        assert!(set.contains("2025-12-25", "n"));
        assert!(!set.contains("2025-08-15", ""));
    }

    #[test]
    fn rebuilding_from_the_same_sheet_is_idempotent() {
        let table = heavy_table();
        assert_eq!(HeavySet::from_table(&table), HeavySet::from_table(&table));
    }

    #[test]
    fn unreadable_bytes_yield_an_empty_set() {
        assert!(HeavySet::load(b"not a workbook").is_empty());
    }
}
