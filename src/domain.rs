use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// deployment status as written in the sheet
///
/// only the three exact, case-sensitive literals are recognized. anything else
/// is kept verbatim so it can be displayed as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SensorStatus {
    Live,
    Trouble,
    /// "NA" in the sheet: the sensor is assigned but not deployed
    NotDeployed,
    Other(String),
    #[default]
    Empty,
}

impl SensorStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Live" => Self::Live,
            "Trouble" => Self::Trouble,
            "NA" => Self::NotDeployed,
            "" => Self::Empty,
            other => Self::Other(other.to_string()),
        }
    }

    /// the text exactly as it appeared in the source
    pub fn as_str(&self) -> &str {
        match self {
            Self::Live => "Live",
            Self::Trouble => "Trouble",
            Self::NotDeployed => "NA",
            Self::Other(s) => s,
            Self::Empty => "",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SensorStatus {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for SensorStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SensorStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// one row of the deployment sheet
///
/// there is no primary key. records are value snapshots that get replaced
/// wholesale on every successful poll.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorRecord {
    pub customer_name: String,
    pub sensor_assigned: String,
    /// loosely formatted, possibly empty (e.g. "28 Sep 23")
    pub deployment_date: String,
    pub status: SensorStatus,
    /// free-text description of the deployment state
    pub deployment: String,
    pub unit: String,
    pub application: String,
    pub parameter: String,
    pub measurement_range: String,
    /// newline-delimited log entries
    pub latest_updates: String,
    pub reason_for_trouble: String,
    pub resolution_status: String,
}

/// counts by status category, recomputed from the current record set
///
/// `live + trouble + not_deployed <= total`. records with an unrecognized
/// status count toward `total` only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSummary {
    pub total: usize,
    pub live: usize,
    pub trouble: usize,
    pub not_deployed: usize,
}

impl SensorSummary {
    pub fn live_percent(&self) -> f64 {
        percent(self.live, self.total)
    }

    pub fn trouble_percent(&self) -> f64 {
        percent(self.trouble, self.total)
    }

    pub fn not_deployed_percent(&self) -> f64 {
        percent(self.not_deployed, self.total)
    }
}

/// share of `part` in `total` as 0..=100; an empty total is 0%
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_matching_is_exact_and_case_sensitive() {
        assert_eq!(SensorStatus::parse("Live"), SensorStatus::Live);
        assert_eq!(SensorStatus::parse("NA"), SensorStatus::NotDeployed);
        assert_eq!(SensorStatus::parse("live"), SensorStatus::Other("live".into()));
        assert_eq!(SensorStatus::parse("Trouble "), SensorStatus::Other("Trouble ".into()));
        assert_eq!(SensorStatus::parse("").as_str(), "");
    }

    #[test]
    fn status_serializes_as_sheet_text() {
        let json = serde_json::to_string(&SensorStatus::NotDeployed).unwrap();
        assert_eq!(json, "\"NA\"");
        let back: SensorStatus = serde_json::from_str("\"Decommissioned\"").unwrap();
        assert_eq!(back.as_str(), "Decommissioned");
    }

    #[test]
    fn record_tolerates_missing_fields() {
        let record: SensorRecord =
            serde_json::from_str(r#"{"customerName":"Acme Paper","status":"Live"}"#).unwrap();
        assert_eq!(record.customer_name, "Acme Paper");
        assert_eq!(record.status, SensorStatus::Live);
        assert!(record.latest_updates.is_empty());
    }

    #[test]
    fn percent_of_empty_total_is_zero() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(SensorSummary::default().live_percent(), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
