// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Protocol layer for observation-record parsing.
//!
//! This module defines the observation record produced by every source and a
//! trait-based abstraction for extensible row formats. Currently implements
//! the tracking-portal table format, with future support possible for JSON
//! webhook payloads and other formats.

mod portal;

pub use portal::PortalRowParser;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors that can occur during observation parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid row format: {0}")]
    InvalidFormat(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for field '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// One aircraft sighting: where a tail number was last pinged, and when.
///
/// Observations are immutable once created. Timestamps are UTC; the producer
/// is responsible for any timezone conversion before constructing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Aircraft registration identifier (e.g., "C-GABC").
    pub tail_number: String,
    /// Location label where the aircraft was observed (e.g., "Palmer Hanger 2").
    pub hangar: String,
    /// When the sighting was recorded, in UTC.
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    /// Create a new observation record.
    #[must_use]
    pub fn new(
        tail_number: impl Into<String>,
        hangar: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tail_number: tail_number.into(),
            hangar: hangar.into(),
            observed_at,
        }
    }
}

/// Accepted timestamp renderings, tried in order.
///
/// The portal has served both dash- and slash-dated forms; RFC 3339 covers
/// webhook-style payloads.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a UTC timestamp from a portal field.
///
/// Returns `ParseError::InvalidValue` when no known format matches. There is
/// deliberately no fallback value: a timestamp that cannot be parsed is an
/// error the caller must surface, never a substitute date.
pub fn parse_utc_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = value.trim().trim_end_matches(" UTC");

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(ParseError::InvalidValue {
        field: "observed_at",
        value: value.to_string(),
    })
}

/// Trait for observation row parsers.
///
/// Implement this trait to add support for new source row formats.
pub trait RowFormat {
    /// Parse one extracted row (as text cells) into an observation.
    ///
    /// Returns `Ok(Some(observation))` if parsing succeeded,
    /// `Ok(None)` if the row is valid but carries no observation
    /// (e.g., a header or spacer row), or `Err(error)` if it is malformed.
    fn parse_row(&self, cells: &[String]) -> Result<Option<Observation>, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_dashed_timestamp() {
        let ts = parse_utc_timestamp("2025-06-01 14:30:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_slashed_timestamp() {
        let ts = parse_utc_timestamp("2025/06/01 14:30:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_us_style_timestamp_without_seconds() {
        let ts = parse_utc_timestamp("06/01/2025 14:30").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let ts = parse_utc_timestamp("2025-06-01T14:30:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_with_utc_suffix() {
        let ts = parse_utc_timestamp("2025-06-01 14:30:00 UTC").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_unparseable_timestamp_is_an_error_not_a_fallback() {
        let result = parse_utc_timestamp("five minutes ago");
        assert!(matches!(
            result,
            Err(ParseError::InvalidValue { field: "observed_at", .. })
        ));
    }
}
