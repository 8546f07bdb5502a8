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

//! Fleet state and freshness ranking.
//!
//! This module maintains the last-known sighting per tail number and projects
//! it into a display-ordered, freshness-classified status view. It is the
//! only place fleet state is mutated; everything else in the crate either
//! produces observations or consumes status rows.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

/// Canonical display format for non-fresh sightings. Always dated so a ping
/// from yesterday at 14:30 cannot be mistaken for one from today.
const LAST_SEEN_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Display value for sightings inside the freshness window.
const FRESH_DISPLAY: &str = "NOW";

/// Errors rejected by strict ingest validation.
///
/// Empty tail numbers and hangar labels are rejected so a blank portal cell
/// cannot create a phantom fleet entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("invalid observation: empty {0}")]
    InvalidObservation(&'static str),
}

/// The latest known sighting for one aircraft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSighting {
    /// Location label from the most recent observation.
    pub hangar: String,
    /// Timestamp of the most recent observation, in UTC.
    pub observed_at: DateTime<Utc>,
}

/// One row of the rendered fleet-status view.
///
/// Derived data only; recomputed from [`FleetState`] on every render and
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetStatusRow {
    /// Aircraft registration identifier.
    pub tail_number: String,
    /// Last known location label.
    pub hangar: String,
    /// Human-readable last-seen value: `"NOW"` when fresh, otherwise a dated
    /// UTC timestamp.
    pub last_seen_display: String,
    /// Whether the sighting falls inside the freshness window.
    pub is_fresh: bool,
}

/// Events emitted when fleet state changes.
#[derive(Debug, Clone)]
pub enum FleetEvent {
    /// A tail number was seen for the first time this session.
    AircraftAdded(String),
    /// An already-known tail number received a new sighting.
    SightingUpdated(String),
}

/// Configuration for the fleet state.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Window within which a sighting is displayed as `"NOW"`, in seconds.
    pub freshness_window_secs: i64,
    /// Broadcast channel capacity for events.
    pub event_channel_capacity: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: 300,
            event_channel_capacity: 256,
        }
    }
}

/// Last-known location per tail number, with freshness-ranked rendering.
///
/// State only grows or is overwritten: a new observation for a known tail
/// replaces the entry unconditionally, even when its timestamp is older
/// (last-write-wins, matching upstream source behavior), and no entry is
/// ever removed automatically.
pub struct FleetState {
    sightings: HashMap<String, LastSighting>,
    freshness_window_secs: i64,
    event_tx: broadcast::Sender<FleetEvent>,
}

impl std::fmt::Debug for FleetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetState")
            .field("aircraft_count", &self.sightings.len())
            .field("freshness_window_secs", &self.freshness_window_secs)
            .finish()
    }
}

impl FleetState {
    /// Create an empty fleet state with the given configuration.
    #[must_use]
    pub fn new(config: FleetConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Self {
            sightings: HashMap::new(),
            freshness_window_secs: config.freshness_window_secs,
            event_tx,
        }
    }

    /// Record a sighting, replacing any prior entry for the tail number.
    ///
    /// Replacement is unconditional: an observation with an older timestamp
    /// than the stored one still wins. Rejects empty tail numbers and hangar
    /// labels.
    pub fn ingest(
        &mut self,
        tail_number: &str,
        hangar: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<(), IngestError> {
        let tail = tail_number.trim();
        if tail.is_empty() {
            return Err(IngestError::InvalidObservation("tail number"));
        }
        let hangar = hangar.trim();
        if hangar.is_empty() {
            return Err(IngestError::InvalidObservation("hangar"));
        }

        let is_new = !self.sightings.contains_key(tail);

        self.sightings.insert(
            tail.to_string(),
            LastSighting {
                hangar: hangar.to_string(),
                observed_at,
            },
        );

        let event = if is_new {
            FleetEvent::AircraftAdded(tail.to_string())
        } else {
            FleetEvent::SightingUpdated(tail.to_string())
        };
        let _ = self.event_tx.send(event);

        Ok(())
    }

    /// Project the current state into a display-ordered status view.
    ///
    /// Fresh rows (sighted within the freshness window of `now`, boundary
    /// inclusive) sort before stale rows; ties in each group break by
    /// ascending tail number. Pure read: calling it twice with the same state
    /// and `now` yields identical output, and an empty state yields an empty
    /// vector.
    #[must_use]
    pub fn render(&self, now: DateTime<Utc>) -> Vec<FleetStatusRow> {
        let window = TimeDelta::seconds(self.freshness_window_secs);

        let mut rows: Vec<FleetStatusRow> = self
            .sightings
            .iter()
            .map(|(tail, sighting)| {
                let is_fresh = now.signed_duration_since(sighting.observed_at) <= window;
                let last_seen_display = if is_fresh {
                    FRESH_DISPLAY.to_string()
                } else {
                    sighting.observed_at.format(LAST_SEEN_FORMAT).to_string()
                };

                FleetStatusRow {
                    tail_number: tail.clone(),
                    hangar: sighting.hangar.clone(),
                    last_seen_display,
                    is_fresh,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.is_fresh
                .cmp(&a.is_fresh)
                .then_with(|| a.tail_number.cmp(&b.tail_number))
        });

        rows
    }

    /// Get the latest sighting for a tail number.
    #[must_use]
    pub fn get(&self, tail_number: &str) -> Option<&LastSighting> {
        self.sightings.get(tail_number)
    }

    /// Get the number of known aircraft.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    /// Check if no aircraft have been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }

    /// Subscribe to fleet change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_ingest_keeps_one_entry_per_tail() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();
        state
            .ingest("C-GABC", "McCall Hanger (663847)", now + TimeDelta::minutes(1))
            .unwrap();

        assert_eq!(state.len(), 1);
        let sighting = state.get("C-GABC").unwrap();
        assert_eq!(sighting.hangar, "McCall Hanger (663847)");
        assert_eq!(sighting.observed_at, now + TimeDelta::minutes(1));
    }

    #[test]
    fn test_ingest_last_write_wins_even_when_older() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();
        state
            .ingest("C-GABC", "McCall Hanger (663847)", now - TimeDelta::hours(2))
            .unwrap();

        let sighting = state.get("C-GABC").unwrap();
        assert_eq!(sighting.hangar, "McCall Hanger (663847)");
        assert_eq!(sighting.observed_at, now - TimeDelta::hours(2));
    }

    #[test]
    fn test_ingest_rejects_empty_tail_number() {
        let mut state = FleetState::new(FleetConfig::default());
        let result = state.ingest("  ", "Palmer Hanger 2", t0());
        assert_eq!(result, Err(IngestError::InvalidObservation("tail number")));
        assert!(state.is_empty());
    }

    #[test]
    fn test_ingest_rejects_empty_hangar() {
        let mut state = FleetState::new(FleetConfig::default());
        let result = state.ingest("C-GABC", "", t0());
        assert_eq!(result, Err(IngestError::InvalidObservation("hangar")));
        assert!(state.is_empty());
    }

    #[test]
    fn test_fresh_sighting_renders_as_now() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();

        let rows = state.render(now);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_fresh);
        assert_eq!(rows[0].last_seen_display, "NOW");
    }

    #[test]
    fn test_stale_sighting_renders_dated_timestamp() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        state
            .ingest("C-GABC", "Palmer Hanger 2", now - TimeDelta::minutes(10))
            .unwrap();

        let rows = state.render(now);
        assert!(!rows[0].is_fresh);
        assert_eq!(rows[0].last_seen_display, "2025-06-01 11:50:00 UTC");
    }

    #[test]
    fn test_freshness_boundary_is_inclusive() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        state
            .ingest("C-GABC", "Palmer Hanger 2", now - TimeDelta::seconds(300))
            .unwrap();
        state
            .ingest("C-GXYZ", "Palmer Hanger 2", now - TimeDelta::seconds(301))
            .unwrap();

        let rows = state.render(now);
        let by_tail = |tail: &str| rows.iter().find(|r| r.tail_number == tail).unwrap();
        assert!(by_tail("C-GABC").is_fresh);
        assert!(!by_tail("C-GXYZ").is_fresh);
    }

    #[test]
    fn test_render_orders_fresh_first_then_by_tail() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        state
            .ingest("C-GZZZ", "Palmer Hanger 2", now - TimeDelta::minutes(10))
            .unwrap();
        state
            .ingest("C-GDEF", "Palmer Hanger 2", now - TimeDelta::minutes(1))
            .unwrap();
        state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();

        let rows = state.render(now);
        let tails: Vec<&str> = rows.iter().map(|r| r.tail_number.as_str()).collect();
        assert_eq!(tails, ["C-GABC", "C-GDEF", "C-GZZZ"]);
        assert!(rows[0].is_fresh && rows[1].is_fresh && !rows[2].is_fresh);
    }

    #[test]
    fn test_no_fresh_row_after_stale_row() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        for (i, age_mins) in [0_i64, 12, 3, 45, 1, 9].iter().enumerate() {
            state
                .ingest(
                    &format!("C-GA{i:02}"),
                    "Palmer Hanger 2",
                    now - TimeDelta::minutes(*age_mins),
                )
                .unwrap();
        }

        let rows = state.render(now);
        let first_stale = rows.iter().position(|r| !r.is_fresh).unwrap();
        assert!(rows[first_stale..].iter().all(|r| !r.is_fresh));
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut state = FleetState::new(FleetConfig::default());
        let now = t0();

        state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();
        state
            .ingest("C-GXYZ", "McCall Hanger (663847)", now - TimeDelta::minutes(30))
            .unwrap();

        assert_eq!(state.render(now), state.render(now));
    }

    #[test]
    fn test_render_empty_state_is_empty() {
        let state = FleetState::new(FleetConfig::default());
        assert!(state.render(t0()).is_empty());
    }

    #[test]
    fn test_configurable_freshness_window() {
        let mut state = FleetState::new(FleetConfig {
            freshness_window_secs: 60,
            ..Default::default()
        });
        let now = t0();

        state
            .ingest("C-GABC", "Palmer Hanger 2", now - TimeDelta::seconds(90))
            .unwrap();

        assert!(!state.render(now)[0].is_fresh);
    }

    #[test]
    fn test_events_distinguish_new_and_updated() {
        let mut state = FleetState::new(FleetConfig::default());
        let mut rx = state.subscribe();
        let now = t0();

        state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();
        state.ingest("C-GABC", "Palmer Hanger 2", now).unwrap();

        assert!(matches!(
            rx.try_recv(),
            Ok(FleetEvent::AircraftAdded(tail)) if tail == "C-GABC"
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(FleetEvent::SightingUpdated(tail)) if tail == "C-GABC"
        ));
    }
}
