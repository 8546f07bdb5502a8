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

//! Observation sources.
//!
//! A source produces zero or more observations per fetch cycle. The fleet
//! state never knows how observations were obtained; it only sees the
//! records. Failures are typed and propagated, never papered over with
//! substitute data: a row the source cannot parse is reported as a failure
//! alongside the rows it could, and a cycle that fails outright leaves the
//! fleet state untouched.

mod portal;
mod sim;
mod table;

pub use portal::{PortalConfig, PortalSource};
pub use sim::SimulatedSource;
pub use table::extract_table_rows;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{Observation, ParseError};

/// Errors that can occur during a source fetch cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached or did not respond in time.
    #[error("source unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The source rejected our credentials or the session expired.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The source responded, but its payload was not in the expected shape.
    #[error("malformed source payload: {0}")]
    Parse(#[from] ParseError),
}

/// One row the source could not turn into an observation.
#[derive(Debug)]
pub struct RowFailure {
    /// The raw row content, for logging and diagnostics.
    pub raw: String,
    /// Why it was rejected.
    pub error: ParseError,
}

/// The result of one successful fetch cycle.
///
/// Malformed rows are carried as explicit failures rather than silently
/// dropped or back-dated; the caller decides whether to log, surface, or
/// count them.
#[derive(Debug, Default)]
pub struct SourceBatch {
    /// Observations extracted this cycle.
    pub observations: Vec<Observation>,
    /// Rows that were present but unparseable.
    pub failures: Vec<RowFailure>,
}

/// A producer of aircraft observations.
///
/// Implementations perform whatever I/O they need (HTTP, scraping, a queue of
/// simulated pings) inside `fetch` and must honor cancellation via their own
/// timeout configuration; the fleet core never blocks on a source.
#[async_trait]
pub trait ObservationSource: Send {
    /// Human-readable source name, for logging.
    fn name(&self) -> &str;

    /// Run one fetch cycle.
    async fn fetch(&mut self) -> Result<SourceBatch, SourceError>;
}
