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

//! Simulated observation source.
//!
//! Replaces the portal during development and demos: pings queued on it are
//! drained on the next fetch cycle, as if a webhook had delivered them.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

use super::{ObservationSource, SourceBatch, SourceError};
use crate::protocol::Observation;

/// In-memory source fed by manually queued pings.
#[derive(Debug, Default)]
pub struct SimulatedSource {
    pending: VecDeque<Observation>,
}

impl SimulatedSource {
    /// Create an empty simulated source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-seeded with a small demo fleet.
    ///
    /// Ages are staggered around the default freshness window so the
    /// fresh/stale split is visible immediately.
    #[must_use]
    pub fn with_demo_fleet(now: DateTime<Utc>) -> Self {
        let mut source = Self::new();
        let demo: &[(&str, &str, i64)] = &[
            ("C-GABC", "Palmer Hanger 2", 0),
            ("C-GDEF", "Palmer Hanger 2", 2),
            ("C-GHIJ", "McCall Hanger (663847)", 4),
            ("C-GKLM", "McCall Hanger (663847)", 12),
            ("C-GNOP", "Palmer Hanger 2", 75),
        ];
        for (tail, hangar, age_mins) in demo {
            source.ping(Observation::new(
                *tail,
                *hangar,
                now - TimeDelta::minutes(*age_mins),
            ));
        }
        source
    }

    /// Queue a simulated ping for the next fetch cycle.
    pub fn ping(&mut self, observation: Observation) {
        self.pending.push_back(observation);
    }

    /// Number of pings waiting to be fetched.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait::async_trait]
impl ObservationSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch(&mut self) -> Result<SourceBatch, SourceError> {
        Ok(SourceBatch {
            observations: self.pending.drain(..).collect(),
            failures: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_drains_queued_pings() {
        let mut source = SimulatedSource::new();
        source.ping(Observation::new("C-GABC", "Palmer Hanger 2", Utc::now()));
        source.ping(Observation::new("C-GXYZ", "Palmer Hanger 2", Utc::now()));

        let batch = source.fetch().await.unwrap();
        assert_eq!(batch.observations.len(), 2);
        assert!(batch.failures.is_empty());

        let batch = source.fetch().await.unwrap();
        assert!(batch.observations.is_empty());
    }

    #[tokio::test]
    async fn test_demo_fleet_spans_the_freshness_boundary() {
        let now = Utc::now();
        let mut source = SimulatedSource::with_demo_fleet(now);
        let batch = source.fetch().await.unwrap();

        let window = TimeDelta::seconds(300);
        let fresh = batch
            .observations
            .iter()
            .filter(|o| now - o.observed_at <= window)
            .count();
        assert!(fresh > 0);
        assert!(fresh < batch.observations.len());
    }
}
