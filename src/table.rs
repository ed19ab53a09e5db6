//! row selection for the sensor table and `/api/sensors`.
//!
//! rows keep their position in the snapshot so links to `/sensors/{index}`
//! stay valid after filtering or sorting.

use std::cmp::Reverse;

use serde::Deserialize;

use crate::dates::parse_deployment_date;
use crate::domain::SensorRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// newest deployment first; unreadable dates go last
    DeploymentDate,
    CustomerName,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    /// exact status text, e.g. `Trouble`
    pub status: Option<String>,
    pub sort: Option<SortKey>,
}

pub fn select_rows<'a>(records: &'a [SensorRecord], query: &TableQuery) -> Vec<(usize, &'a SensorRecord)> {
    let mut rows: Vec<(usize, &SensorRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| match &query.status {
            Some(status) if !status.is_empty() => r.status.as_str() == status,
            _ => true,
        })
        .collect();

    match query.sort {
        Some(SortKey::DeploymentDate) => {
            rows.sort_by_cached_key(|(_, r)| {
                let parsed = parse_deployment_date(&r.deployment_date);
                (parsed.is_none(), Reverse(parsed))
            });
        }
        Some(SortKey::CustomerName) => {
            rows.sort_by_cached_key(|(_, r)| r.customer_name.to_lowercase());
        }
        None => {}
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorStatus;

    fn record(name: &str, date: &str, status: &str) -> SensorRecord {
        SensorRecord {
            customer_name: name.to_string(),
            deployment_date: date.to_string(),
            status: SensorStatus::parse(status),
            ..Default::default()
        }
    }

    fn names(rows: &[(usize, &SensorRecord)]) -> Vec<String> {
        rows.iter().map(|(_, r)| r.customer_name.clone()).collect()
    }

    fn sample() -> Vec<SensorRecord> {
        vec![
            record("beta", "28 Sep 23", "Live"),
            record("alpha", "", "NA"),
            record("gamma", "TBD", "Trouble"),
            record("delta", "2024-02-01", "Live"),
        ]
    }

    #[test]
    fn no_query_keeps_input_order() {
        let records = sample();
        let rows = select_rows(&records, &TableQuery::default());
        assert_eq!(names(&rows), ["beta", "alpha", "gamma", "delta"]);
    }

    #[test]
    fn status_filter_keeps_snapshot_index() {
        let records = sample();
        let query = TableQuery { status: Some("Live".into()), sort: None };
        let rows = select_rows(&records, &query);
        assert_eq!(rows.iter().map(|(i, _)| *i).collect::<Vec<_>>(), [0, 3]);
    }

    #[test]
    fn deployment_date_sort_newest_first() {
        let records = sample();
        let query = TableQuery { status: None, sort: Some(SortKey::DeploymentDate) };
        let rows = select_rows(&records, &query);
        // empty date is the epoch, "TBD" does not parse
        assert_eq!(names(&rows), ["delta", "beta", "alpha", "gamma"]);
    }

    #[test]
    fn customer_sort_ignores_case() {
        let mut records = sample();
        records.push(record("Alpha2", "", "Live"));
        let query = TableQuery { status: None, sort: Some(SortKey::CustomerName) };
        let rows = select_rows(&records, &query);
        assert_eq!(names(&rows)[..2], ["alpha", "Alpha2"]);
    }
}
