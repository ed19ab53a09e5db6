use thiserror::Error;

/// why a poll of the data source produced no records
///
/// none of these are fatal: the coordinator keeps the previous record set and
/// shows the message in the connection banner.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid sheets api base url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sheets api payload invalid: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("sheet has no header row")]
    MissingHeader,
}
