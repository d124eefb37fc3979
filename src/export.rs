use std::io;

use thiserror::Error;

use crate::core::ScheduleEntry;

const HEADERS: [&str; 6] = ["Month", "Balance", "Principal", "Interest", "Payment", "Lump Sum"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] io::Error),
    #[error("CSV output was not valid UTF-8")]
    Encoding,
}

/// Writes one row per month; months are shown one-indexed and money to two decimals.
pub fn write_schedule_csv<W: io::Write>(
    schedule: &[ScheduleEntry],
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    wtr.write_record(HEADERS)?;

    for entry in schedule {
        wtr.write_record([
            (u64::from(entry.month) + 1).to_string(),
            format!("{:.2}", entry.balance),
            format!("{:.2}", entry.principal),
            format!("{:.2}", entry.interest),
            format!("{:.2}", entry.payment),
            format!("{:.2}", entry.lump_sum),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn schedule_to_csv(schedule: &[ScheduleEntry]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_schedule_csv(schedule, &mut buf)?;
    String::from_utf8(buf).map_err(|_| ExportError::Encoding)
}

pub fn default_file_name(timestamp_ms: i64) -> String {
    format!("loan-amortization-{timestamp_ms}.csv")
}
