//! status aggregation for the gauge and the status cards.
//!
//! runs on every render from the current snapshot; nothing is cached.

use crate::domain::{SensorRecord, SensorStatus, SensorSummary};

/// count records per status category in one pass
pub fn summarize(records: &[SensorRecord]) -> SensorSummary {
    records.iter().fold(SensorSummary::default(), |mut acc, record| {
        acc.total += 1;
        match record.status {
            SensorStatus::Live => acc.live += 1,
            SensorStatus::Trouble => acc.trouble += 1,
            SensorStatus::NotDeployed => acc.not_deployed += 1,
            SensorStatus::Other(_) | SensorStatus::Empty => {}
        }
        acc
    })
}
