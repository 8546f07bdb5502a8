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

//! Tracking-portal table row parser.
//!
//! Parses the three-column positions table served by the portal:
//!
//! ```text
//! <tail number> | <hangar / location label> | <last seen timestamp>
//! ```
//!
//! Extra trailing columns are tolerated and ignored; the portal has appended
//! status columns before without notice.

use super::{parse_utc_timestamp, Observation, ParseError, RowFormat};

// Column indices in the portal positions table.
const COL_TAIL: usize = 0;
const COL_HANGAR: usize = 1;
const COL_LAST_SEEN: usize = 2;

/// Parser for tracking-portal positions table rows.
#[derive(Debug, Default)]
pub struct PortalRowParser;

impl PortalRowParser {
    /// Create a new portal row parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RowFormat for PortalRowParser {
    fn parse_row(&self, cells: &[String]) -> Result<Option<Observation>, ParseError> {
        if cells.is_empty() {
            return Ok(None);
        }

        if cells.len() <= COL_LAST_SEEN {
            return Err(ParseError::InvalidFormat(format!(
                "expected at least 3 columns, got {}",
                cells.len()
            )));
        }

        let tail = cells[COL_TAIL].trim();
        if tail.is_empty() {
            return Err(ParseError::MissingField("tail number"));
        }

        let hangar = cells[COL_HANGAR].trim();
        if hangar.is_empty() {
            return Err(ParseError::MissingField("hangar"));
        }

        let observed_at = parse_utc_timestamp(&cells[COL_LAST_SEEN])?;

        Ok(Some(Observation::new(tail, hangar, observed_at)))
    }
}
