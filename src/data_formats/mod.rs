mod request;
mod response;

pub use request::*;
pub use response::*;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::errors::RequestError;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub search_terms: String,
}

/// Parses an ISO-8601 date-time. Local date-times are taken as-is, with the
/// seconds optional; values with an offset are converted to UTC.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, RequestError> {
    let value = value.trim();
    if let Ok(timestamp) = value.parse::<NaiveDateTime>() {
        return Ok(timestamp);
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Ok(timestamp);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.naive_utc())
        .map_err(|e| RequestError::MalformedInput(format!("invalid timestamp `{value}`: {e}")))
}
