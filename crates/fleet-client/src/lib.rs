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

//! Fleet-status client library for aircraft last-seen tracking.
//!
//! This library turns a stream of (tail number, hangar, timestamp) sightings
//! into a ranked, freshness-classified fleet view. It is organized in layers
//! that can be used independently or composed together:
//!
//! - **Protocol layer**: Observation records and row parsing with typed
//!   errors (a timestamp that cannot be parsed is a failure, never a
//!   substitute date)
//! - **Fleet layer**: Last-write-wins state per tail number, the freshness
//!   classifier, and display-ordered rendering
//! - **Source layer**: Pluggable observation producers — an authenticated
//!   tracking-portal scraper and a simulated ping queue
//!
//! # Quick Start
//!
//! Use the [`Client`] type for full-stack operation:
//!
//! ```no_run
//! use fleet_client::{Client, ClientConfig, PortalConfig, PortalSource};
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = PortalSource::new(PortalConfig {
//!         base_url: "https://tracking.example.com".to_string(),
//!         username: "ops".to_string(),
//!         password: std::env::var("PORTAL_PASSWORD").unwrap_or_default(),
//!         ..Default::default()
//!     })
//!     .expect("http client");
//!
//!     let client = Client::spawn(source, ClientConfig::default());
//!
//!     loop {
//!         for row in client.status_rows(Utc::now()) {
//!             println!("{} @ {} ({})", row.tail_number, row.hangar, row.last_seen_display);
//!         }
//!         tokio::time::sleep(Duration::from_secs(30)).await;
//!     }
//! }
//! ```
//!
//! # Using the Fleet Layer Only
//!
//! The core is a plain synchronous type with no I/O:
//!
//! ```
//! use fleet_client::{FleetConfig, FleetState};
//! use chrono::Utc;
//!
//! let mut state = FleetState::new(FleetConfig::default());
//! let now = Utc::now();
//!
//! state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();
//!
//! let rows = state.render(now);
//! assert_eq!(rows[0].last_seen_display, "NOW");
//! ```

pub mod fleet;
pub mod protocol;
pub mod source;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub use fleet::{
    FleetConfig, FleetEvent, FleetState, FleetStatusRow, IngestError, LastSighting,
};
pub use protocol::{Observation, ParseError, PortalRowParser, RowFormat};
pub use source::{
    ObservationSource, PortalConfig, PortalSource, RowFailure, SimulatedSource, SourceBatch,
    SourceError,
};

/// Configuration for the full-stack client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Fleet state configuration.
    pub fleet: FleetConfig,
    /// How often to run a source fetch cycle.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            fleet: FleetConfig::default(),
            poll_interval: Duration::from_secs(30),
        }
    }
}

/// Full-stack client that polls a source into shared fleet state.
///
/// The client runs the fetch cycle on a background task and guards the fleet
/// state with a lock, so rendering never observes a half-applied batch. A
/// failed cycle leaves the state exactly as it was.
pub struct Client {
    state: Arc<RwLock<FleetState>>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Spawn a client polling the given source.
    ///
    /// Starts a background task that fetches on every poll interval and
    /// ingests the resulting observations. Must be called inside a tokio
    /// runtime.
    #[must_use]
    pub fn spawn<S>(source: S, config: ClientConfig) -> Self
    where
        S: ObservationSource + 'static,
    {
        let state = Arc::new(RwLock::new(FleetState::new(config.fleet)));
        let cancel_token = CancellationToken::new();

        let task_state = Arc::clone(&state);
        let task_cancel = cancel_token.clone();
        let poll_interval = config.poll_interval;

        tokio::spawn(async move {
            poll_loop(source, task_state, task_cancel, poll_interval).await;
        });

        Self {
            state,
            cancel_token,
        }
    }

    /// Render the current fleet view relative to `now`.
    ///
    /// Fresh rows first, ascending tail number within each group.
    #[must_use]
    pub fn status_rows(&self, now: DateTime<Utc>) -> Vec<FleetStatusRow> {
        self.state
            .read()
            .map(|state| state.render(now))
            .unwrap_or_default()
    }

    /// Record a sighting directly, bypassing the source.
    ///
    /// Used for webhook-style delivery and manual pings.
    pub fn ingest(
        &self,
        tail_number: &str,
        hangar: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<(), IngestError> {
        match self.state.write() {
            Ok(mut state) => state.ingest(tail_number, hangar, observed_at),
            Err(_) => Ok(()),
        }
    }

    /// Get the number of known aircraft.
    #[must_use]
    pub fn aircraft_count(&self) -> usize {
        self.state.read().map(|state| state.len()).unwrap_or(0)
    }

    /// Subscribe to fleet change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.state
            .read()
            .map(|state| state.subscribe())
            .unwrap_or_else(|_| {
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                rx
            })
    }

    /// Shut down the background poll task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop<S>(
    mut source: S,
    state: Arc<RwLock<FleetState>>,
    cancel_token: CancellationToken,
    poll_interval: Duration,
) where
    S: ObservationSource,
{
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = cancel_token.cancelled() => {
                info!("poll loop cancelled");
                return;
            }
        }

        match source.fetch().await {
            Ok(batch) => {
                if !batch.failures.is_empty() {
                    warn!(
                        "{}: {} rows could not be parsed this cycle",
                        source.name(),
                        batch.failures.len()
                    );
                }

                if let Ok(mut state) = state.write() {
                    for obs in batch.observations {
                        if let Err(e) = state.ingest(&obs.tail_number, &obs.hangar, obs.observed_at)
                        {
                            warn!("{}: dropping observation: {}", source.name(), e);
                        }
                    }
                }
            }
            Err(e) => {
                // State stays as-is until the next successful cycle.
                warn!("{}: fetch cycle failed: {}", source.name(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_client_polls_simulated_source() {
        let now = Utc::now();
        let mut source = SimulatedSource::new();
        source.ping(Observation::new("C-GABC", "Palmer Hanger 2", now));

        let client = Client::spawn(
            source,
            ClientConfig {
                poll_interval: Duration::from_millis(10),
                ..Default::default()
            },
        );

        // First tick fires immediately; give the task a moment to run it.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(client.aircraft_count(), 1);
        let rows = client.status_rows(now);
        assert_eq!(rows[0].tail_number, "C-GABC");
        assert!(rows[0].is_fresh);

        client.shutdown();
    }

    #[tokio::test]
    async fn test_direct_ingest_bypasses_source() {
        let client = Client::spawn(SimulatedSource::new(), ClientConfig::default());
        let now = Utc::now();

        client
            .ingest("C-GXYZ", "McCall Hanger (663847)", now - TimeDelta::minutes(10))
            .unwrap();

        let rows = client.status_rows(now);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_fresh);
    }
}
