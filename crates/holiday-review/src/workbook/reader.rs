use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::NaiveTime;
use std::io::{Cursor, Read};

use super::{header_names, CellValue, DecodeError, Record, SheetTable};

/// Thin wrapper around calamine that yields [`SheetTable`]s by name.
pub struct WorkbookReader {
    workbook: Sheets<Cursor<Vec<u8>>>,
    sheet_names: Vec<String>,
}

impl WorkbookReader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_vec(bytes.to_vec())
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, DecodeError> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|err| DecodeError::Workbook(calamine::Error::Io(err)))?;
        Self::from_vec(buffer)
    }

    fn from_vec(buffer: Vec<u8>) -> Result<Self, DecodeError> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        let sheet_names = workbook.sheet_names().to_vec();
        Ok(Self {
            workbook,
            sheet_names,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names.iter().any(|sheet| sheet == name)
    }

    /// Decodes the named sheet; `Ok(None)` when the workbook has no such sheet.
    pub fn try_sheet(&mut self, name: &str) -> Result<Option<SheetTable>, DecodeError> {
        if !self.has_sheet(name) {
            return Ok(None);
        }
        self.sheet(name).map(Some)
    }

    pub fn sheet(&mut self, name: &str) -> Result<SheetTable, DecodeError> {
        if !self.has_sheet(name) {
            return Err(DecodeError::MissingSheet(name.to_string()));
        }

        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|err| DecodeError::Sheet {
                sheet: name.to_string(),
                message: err.to_string(),
            })?;

        let mut rows = range.rows();
        let columns = match rows.next() {
            Some(header) => {
                let cells: Vec<CellValue> = header.iter().map(convert_cell).collect();
                header_names(cells.iter())
            }
            None => return Ok(SheetTable::new(name, Vec::new(), Vec::new())),
        };

        let records = rows
            .filter_map(|row| {
                let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
                if cells.iter().all(CellValue::is_blank) {
                    return None;
                }

                let mut record = Record::with_capacity(columns.len());
                let mut cells = cells.into_iter();
                for column in &columns {
                    record.insert(column.clone(), cells.next().unwrap_or(CellValue::Empty));
                }
                Some(record)
            })
            .collect();

        Ok(SheetTable::new(name, columns, records))
    }

    /// The named sheet when present, otherwise the first sheet of the workbook.
    pub fn sheet_or_first(&mut self, preferred: &str) -> Result<SheetTable, DecodeError> {
        let name = if self.has_sheet(preferred) {
            preferred.to_string()
        } else {
            self.sheet_names
                .first()
                .cloned()
                .ok_or(DecodeError::NoSheets)?
        };
        self.sheet(&name)
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(value) => CellValue::Text(value.clone()),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) if datetime.time() == NaiveTime::MIN => {
                CellValue::Text(datetime.date().format("%Y-%m-%d").to_string())
            }
            Some(datetime) => CellValue::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Number(value.as_f64()),
        },
        Data::DateTimeIso(value) => CellValue::Text(
            value
                .strip_suffix("T00:00:00")
                .unwrap_or(value.as_str())
                .to_string(),
        ),
        Data::DurationIso(value) => CellValue::Text(value.clone()),
        Data::Error(err) => CellValue::Text(err.to_string()),
    }
}
