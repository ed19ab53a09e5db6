//! ==============================================================================
//! export.rs - csv export of the current record set
//! ==============================================================================
//!
//! purpose:
//!     serializes records into the fixed 12-column export layout and names the
//!     download file after the export date.
//!
//! format:
//!     - every field is double quoted, including the header
//!     - a literal `"` inside a field is doubled
//!     - commas and line breaks stay raw inside the quotes (rfc 4180)
//!     - rows end with `\n`
//!
//! relationships:
//!     - used by: server.rs (GET /export.csv sets the download headers)
//!
//! ==============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::SensorRecord;

/// export column order, also used to map sheet headers to fields
pub const EXPORT_HEADERS: [&str; 12] = [
    "Customer Name",
    "Sensor Assigned",
    "Deployment Date",
    "Status",
    "Latest Updates",
    "Reason for Trouble",
    "Resolution Status",
    "Deployment",
    "Unit",
    "Application",
    "Parameter",
    "Measurement Range",
];

pub const DEFAULT_BASE_NAME: &str = "sensor-deployment-status";

/// a ready-to-download csv artifact
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

fn export_row(record: &SensorRecord) -> [&str; 12] {
    [
        record.customer_name.as_str(),
        record.sensor_assigned.as_str(),
        record.deployment_date.as_str(),
        record.status.as_str(),
        record.latest_updates.as_str(),
        record.reason_for_trouble.as_str(),
        record.resolution_status.as_str(),
        record.deployment.as_str(),
        record.unit.as_str(),
        record.application.as_str(),
        record.parameter.as_str(),
        record.measurement_range.as_str(),
    ]
}

/// serialize records in input order behind the header row
pub fn to_csv(records: &[SensorRecord]) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;
    for record in records {
        writer.write_record(export_row(record))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    // every field came from a String, so the buffer is valid utf-8
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `{base}-{YYYY-MM-DD}.csv`
pub fn export_filename(base: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", base, date.format("%Y-%m-%d"))
}

/// build the download using the export instant for the filename date
pub fn export_at(
    records: &[SensorRecord],
    base: &str,
    now: DateTime<Utc>,
) -> Result<CsvExport, csv::Error> {
    Ok(CsvExport {
        filename: export_filename(base, now.date_naive()),
        content: to_csv(records)?,
    })
}

pub fn export(records: &[SensorRecord], base: &str) -> Result<CsvExport, csv::Error> {
    export_at(records, base, Utc::now())
}
