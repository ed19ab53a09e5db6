//! sensor deployment status dashboard.
//!
//! a refresh coordinator polls a spreadsheet-backed source on a timer and
//! keeps the last good record set; axum serves the gauge, the table, per-row
//! details, a json api and a csv export rendered from coordinator snapshots.

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod export;
pub mod refresh;
pub mod render;
pub mod server;
pub mod source;
pub mod table;

pub use domain::{SensorRecord, SensorStatus, SensorSummary};
pub use error::SourceError;
pub use refresh::{DashboardView, RefreshCoordinator, RefreshHandle, RefreshState};
pub use source::{RecordSource, SheetSource};
