use chrono::NaiveDateTime;
use std::io::Write;

use super::domain::AssignmentRow;
use super::views::AssignmentRowView;

/// `<base>-<YYYYMMDDHHMMSS>.xlsx`, stamped with the given local time.
pub fn download_file_name(base: &str, at: NaiveDateTime) -> String {
    format!("{base}-{}.xlsx", at.format("%Y%m%d%H%M%S"))
}

/// Writes rows, in the order given, as CSV with a header line.
pub fn write_rows_csv<W: Write>(rows: &[&AssignmentRow], writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["data", "giorno", "turno", "peso", "squadra", "pesante"])?;

    for row in rows {
        let view = AssignmentRowView::from(*row);
        writer.write_record([
            view.date,
            view.weekday.unwrap_or_default().to_string(),
            view.shift,
            view.weight.to_string(),
            view.team.to_string(),
            if view.heavy { "si" } else { "no" }.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
