//! ==============================================================================
//! source.rs - spreadsheet-backed data source adapters
//! ==============================================================================
//!
//! purpose:
//!     turns one poll of the deployment sheet into an ordered list of
//!     SensorRecords, or a SourceError the coordinator can show.
//!
//! adapters (picked by [source] kind in dashboard.toml):
//!     - sheet_csv:  a published "export as csv" url
//!     - sheets_api: google sheets api v4 values range (json)
//!     - file:       a local csv file, for demos and offline runs
//!
//! row mapping:
//!     columns are matched to fields by header text (trimmed, case-insensitive)
//!     using the same names as the export. unknown columns are ignored, missing
//!     columns and short rows become empty text, blank rows are skipped.
//!     nothing in a row can reject the whole sheet.
//!
//! relationships:
//!     - used by: refresh.rs (RecordSource is what the coordinator polls)
//!     - uses: export.rs (EXPORT_HEADERS is the column vocabulary)
//!
//! ==============================================================================

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::domain::{SensorRecord, SensorStatus};
use crate::error::SourceError;
use crate::export::EXPORT_HEADERS;

/// anything the coordinator can poll for a fresh record set
pub trait RecordSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<SensorRecord>, SourceError>> + Send;

    /// short human label for logs and the connection banner
    fn describe(&self) -> String;
}

// ==============================================================================
// column mapping
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    CustomerName,
    SensorAssigned,
    DeploymentDate,
    Status,
    LatestUpdates,
    ReasonForTrouble,
    ResolutionStatus,
    Deployment,
    Unit,
    Application,
    Parameter,
    MeasurementRange,
}

// same order as EXPORT_HEADERS
const FIELDS: [Field; 12] = [
    Field::CustomerName,
    Field::SensorAssigned,
    Field::DeploymentDate,
    Field::Status,
    Field::LatestUpdates,
    Field::ReasonForTrouble,
    Field::ResolutionStatus,
    Field::Deployment,
    Field::Unit,
    Field::Application,
    Field::Parameter,
    Field::MeasurementRange,
];

fn field_for_header(header: &str) -> Option<Field> {
    let header = header.trim();
    EXPORT_HEADERS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(header))
        .map(|i| FIELDS[i])
}

fn assign(record: &mut SensorRecord, field: Field, value: &str) {
    let slot = match field {
        Field::Status => {
            record.status = SensorStatus::parse(value);
            return;
        }
        Field::CustomerName => &mut record.customer_name,
        Field::SensorAssigned => &mut record.sensor_assigned,
        Field::DeploymentDate => &mut record.deployment_date,
        Field::LatestUpdates => &mut record.latest_updates,
        Field::ReasonForTrouble => &mut record.reason_for_trouble,
        Field::ResolutionStatus => &mut record.resolution_status,
        Field::Deployment => &mut record.deployment,
        Field::Unit => &mut record.unit,
        Field::Application => &mut record.application,
        Field::Parameter => &mut record.parameter,
        Field::MeasurementRange => &mut record.measurement_range,
    };
    *slot = value.to_string();
}

/// map a header row plus data rows onto records
pub fn records_from_rows<H, R, C>(header: H, rows: R) -> Vec<SensorRecord>
where
    H: IntoIterator,
    H::Item: AsRef<str>,
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: AsRef<str>,
{
    let columns: Vec<Option<Field>> = header
        .into_iter()
        .map(|h| field_for_header(h.as_ref()))
        .collect();

    let mut records = Vec::new();
    for row in rows {
        let mut record = SensorRecord::default();
        let mut blank = true;
        for (cell, field) in row.into_iter().zip(&columns) {
            let cell = cell.as_ref();
            if !cell.trim().is_empty() {
                blank = false;
            }
            if let Some(field) = field {
                assign(&mut record, *field, cell);
            }
        }
        if !blank {
            records.push(record);
        }
    }
    records
}

// ==============================================================================
// payload parsing
// ==============================================================================

/// parse a sheet exported as csv (first row is the header)
pub fn parse_csv(text: &str) -> Result<Vec<SensorRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = reader.headers()?.clone();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(SourceError::MissingHeader);
    }

    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok(records_from_rows(header.iter(), rows.iter()))
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// parse a sheets api v4 `values.get` response body
pub fn parse_values(body: &str) -> Result<Vec<SensorRecord>, SourceError> {
    let range: ValueRange = serde_json::from_str(body)?;
    let mut rows = range
        .values
        .iter()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

    let header = rows.next().ok_or(SourceError::MissingHeader)?;
    Ok(records_from_rows(header, rows))
}

// ==============================================================================
// the configured adapter
// ==============================================================================

/// `{api_base}/v4/spreadsheets/{id}/values/{range}` with each segment
/// percent-encoded, so sheet names may contain `/`, `?` or `#`
pub fn values_url(api_base: &str, spreadsheet_id: &str, range: &str) -> Result<Url, SourceError> {
    let invalid = |reason: String| SourceError::InvalidUrl { url: api_base.to_string(), reason };

    let mut url = Url::parse(api_base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

pub struct SheetSource {
    client: reqwest::Client,
    config: SourceConfig,
}

impl SheetSource {
    pub fn new(config: SourceConfig, timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(
                    "[SOURCE] ⚠ http client setup failed, using defaults without the {}s timeout: {}",
                    timeout.as_secs(),
                    e
                );
                reqwest::Client::default()
            }
        };

        Self { client, config }
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| SourceError::Http { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { url: url.to_string(), status });
        }

        response
            .text()
            .await
            .map_err(|source| SourceError::Http { url: url.to_string(), source })
    }

    async fn read_file(path: &Path) -> Result<String, SourceError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Io { path: path.display().to_string(), source })
    }
}

impl RecordSource for SheetSource {
    async fn fetch(&self) -> Result<Vec<SensorRecord>, SourceError> {
        let records = match &self.config {
            SourceConfig::SheetCsv { url } => parse_csv(&self.get_text(url, &[]).await?)?,
            SourceConfig::SheetsApi { api_base, spreadsheet_id, range, api_key } => {
                let url = values_url(api_base, spreadsheet_id, range)?;
                parse_values(&self.get_text(url.as_str(), &[("key", api_key.as_str())]).await?)?
            }
            SourceConfig::File { path } => parse_csv(&Self::read_file(path).await?)?,
        };
        debug!(source = %self.describe(), count = records.len(), "fetched sheet");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.config.to_string()
    }
}
