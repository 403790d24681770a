//! CSV export of the filtered dashboard rows

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use thiserror::Error;

use crate::models::AdminBooking;

/// Header of every export, in column order
pub const CSV_COLUMNS: [&str; 10] = [
    "id",
    "customer",
    "email",
    "unit_id",
    "unit_name",
    "access_code",
    "created_at",
    "valid_until",
    "status",
    "price",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: no bookings match the current filter")]
    NoRows,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8")]
    Encoding,
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Render rows as CSV text. Empty input is rejected.
pub fn export_csv(rows: &[&AdminBooking], now: DateTime<Utc>) -> ExportResult<String> {
    if rows.is_empty() {
        return Err(ExportError::NoRows);
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(CSV_COLUMNS)?;
    for booking in rows {
        writer.write_record(record(booking, now))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    let text = String::from_utf8(bytes).map_err(|_| ExportError::Encoding)?;

    tracing::debug!(rows = rows.len(), "Exported bookings to CSV");
    Ok(text)
}

/// Write the export to `path`, returning the number of rows written
pub fn write_csv_file(path: &Path, rows: &[&AdminBooking], now: DateTime<Utc>) -> ExportResult<usize> {
    let text = export_csv(rows, now)?;
    std::fs::write(path, text)?;
    Ok(rows.len())
}

/// Suggested file name, e.g. `bookings-20240510-1200.csv`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("bookings-{}.csv", now.format("%Y%m%d-%H%M"))
}

fn record(booking: &AdminBooking, now: DateTime<Utc>) -> [String; 10] {
    let b = &booking.booking;
    [
        b.id.clone(),
        b.user_name.clone(),
        booking.user_email.clone().unwrap_or_default(),
        b.box_id.clone(),
        b.box_name.clone().unwrap_or_default(),
        b.access_code.clone().unwrap_or_default(),
        b.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        b.valid_until.to_rfc3339_opts(SecondsFormat::Secs, true),
        booking.status_at(now).to_string(),
        b.price_for_period
            .map(|p| format!("{:.2}", p))
            .unwrap_or_default(),
    ]
}
