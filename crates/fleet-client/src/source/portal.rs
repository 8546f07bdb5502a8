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

//! Tracking-portal observation source.
//!
//! One fetch cycle is a linear login → fetch → extract → parse sequence
//! against the third-party portal: POST the credentials to the login form,
//! GET the positions page on the resulting session cookie, pull the rows out
//! of the positions table, and parse each into an observation. No retry, no
//! pagination; the whole cycle is bounded by the request timeout.
//!
//! Credentials pass through to the portal and are never logged or stored in
//! fleet state.

use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;

use super::{table, RowFailure, SourceBatch, SourceError};
use crate::protocol::{ParseError, PortalRowParser, RowFormat};

/// Configuration for the portal source.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal base URL, e.g. `https://tracking.example.com`.
    pub base_url: String,
    /// Login form path, POSTed with `username`/`password` fields.
    pub login_path: String,
    /// Positions page path.
    pub positions_path: String,
    /// Login username.
    pub username: String,
    /// Login password, supplied externally (e.g. from an environment
    /// variable resolved by the caller).
    pub password: String,
    /// Id/class fragment identifying the positions table. `None` takes the
    /// first table on the page.
    pub table_marker: Option<String>,
    /// Per-request timeout; bounds the whole fetch cycle at twice this.
    pub request_timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            login_path: "/login".to_string(),
            positions_path: "/positions".to_string(),
            username: String::new(),
            password: String::new(),
            table_marker: Some("positions".to_string()),
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl PortalConfig {
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Observation source that scrapes the tracking portal over HTTP.
pub struct PortalSource {
    config: PortalConfig,
    http: reqwest::Client,
    name: String,
}

impl std::fmt::Debug for PortalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalSource")
            .field("base_url", &self.config.base_url)
            .field("username", &self.config.username)
            .finish_non_exhaustive()
    }
}

impl PortalSource {
    /// Create a portal source with a cookie-holding HTTP client.
    pub fn new(config: PortalConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        let name = format!("portal {}", config.base_url);

        Ok(Self { config, http, name })
    }

    /// Log in, establishing the session cookie.
    async fn login(&self) -> Result<(), SourceError> {
        let response = self
            .http
            .post(self.config.url(&self.config.login_path))
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SourceError::AuthenticationFailed(format!(
                    "login rejected with status {}",
                    response.status()
                )));
            }
            status if !status.is_success() => {
                return Err(SourceError::AuthenticationFailed(format!(
                    "login returned unexpected status {status}"
                )));
            }
            _ => {}
        }

        // Portals routinely re-serve the login form with a 200 on bad
        // credentials; a password field in the response body means we are
        // not logged in.
        let body = response.text().await?;
        if looks_like_login_form(&body) {
            return Err(SourceError::AuthenticationFailed(
                "login form re-served; credentials rejected".to_string(),
            ));
        }

        debug!("logged in to {}", self.config.base_url);
        Ok(())
    }

    /// Fetch the positions page body.
    async fn fetch_positions_page(&self) -> Result<String, SourceError> {
        let response = self
            .http
            .get(self.config.url(&self.config.positions_path))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::FORBIDDEN
        {
            return Err(SourceError::AuthenticationFailed(format!(
                "positions page rejected with status {}",
                response.status()
            )));
        }

        let body = response.error_for_status()?.text().await?;
        if looks_like_login_form(&body) {
            return Err(SourceError::AuthenticationFailed(
                "session expired; positions page redirected to login".to_string(),
            ));
        }

        Ok(body)
    }
}

fn looks_like_login_form(body: &str) -> bool {
    body.contains("type=\"password\"") || body.contains("type='password'")
}

/// Parse extracted table rows into a batch, keeping per-row failures typed.
pub(crate) fn rows_to_batch(rows: Vec<Vec<String>>) -> SourceBatch {
    let parser = PortalRowParser::new();
    let mut batch = SourceBatch::default();

    for cells in rows {
        match parser.parse_row(&cells) {
            Ok(Some(observation)) => batch.observations.push(observation),
            Ok(None) => {}
            Err(error) => {
                let raw = cells.join(" | ");
                warn!("skipping unparseable portal row '{raw}': {error}");
                batch.failures.push(RowFailure { raw, error });
            }
        }
    }

    batch
}

#[async_trait::async_trait]
impl super::ObservationSource for PortalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&mut self) -> Result<SourceBatch, SourceError> {
        self.login().await?;
        let body = self.fetch_positions_page().await?;

        let rows = table::extract_table_rows(&body, self.config.table_marker.as_deref())
            .ok_or_else(|| {
                SourceError::Parse(ParseError::InvalidFormat(
                    "positions table not found on page".to_string(),
                ))
            })?;

        let batch = rows_to_batch(rows);
        debug!(
            "portal cycle: {} observations, {} unparseable rows",
            batch.observations.len(),
            batch.failures.len()
        );

        Ok(batch)
    }
}
