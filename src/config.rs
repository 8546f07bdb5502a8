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

//! Application configuration management.
//!
//! Persistent TOML configuration via confy. Holds portal entries and the
//! dashboard timing knobs. Passwords are never stored here; each portal
//! entry names the environment variable that carries its password.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Environment variable consulted when a portal entry does not name one.
pub const DEFAULT_PASSWORD_ENV: &str = "HANGARBOARD_PORTAL_PASSWORD";

/// Configuration for a single tracking-portal account.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PortalEntry {
    /// Unique identifier for this portal (stable across renames).
    pub id: String,

    /// User-friendly display name.
    pub name: String,

    /// Portal base URL, e.g. `https://tracking.example.com`.
    pub base_url: String,

    /// Login form path.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Positions page path.
    #[serde(default = "default_positions_path")]
    pub positions_path: String,

    /// Login username.
    pub username: String,

    /// Environment variable holding the login password.
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Id/class fragment identifying the positions table on the page.
    #[serde(default = "default_table_marker")]
    pub table_marker: Option<String>,

    /// Whether this portal may be selected for scraping.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl PortalEntry {
    /// Create a new portal entry with a generated UUID.
    pub fn new(name: String, base_url: String, username: String, password_env: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            base_url,
            login_path: default_login_path(),
            positions_path: default_positions_path(),
            username,
            password_env,
            table_marker: default_table_marker(),
            enabled: true,
        }
    }
}

/// Application configuration stored in TOML format.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configured tracking portals.
    #[serde(default)]
    pub portals: Vec<PortalEntry>,

    /// Freshness window in seconds; sightings within it display as NOW.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: i64,

    /// Dashboard refresh (and portal poll) interval in seconds.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            portals: Vec::new(),
            freshness_window_secs: default_freshness_window_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

// Default value functions for serde
fn default_login_path() -> String {
    "/login".to_string()
}

fn default_positions_path() -> String {
    "/positions".to_string()
}

fn default_password_env() -> String {
    DEFAULT_PASSWORD_ENV.to_string()
}

fn default_table_marker() -> Option<String> {
    Some("positions".to_string())
}

fn default_true() -> bool {
    true
}

fn default_freshness_window_secs() -> i64 {
    300
}

fn default_refresh_interval_secs() -> u64 {
    30
}

impl AppConfig {
    /// Load configuration from disk, creating defaults on first run.
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load("hangarboard", "config")
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store("hangarboard", "config", self)
    }

    /// Get the config file path for display to user.
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path("hangarboard", "config")
    }

    /// Find an enabled portal by name or id.
    pub fn find_portal(&self, key: &str) -> Option<&PortalEntry> {
        self.portals
            .iter()
            .filter(|p| p.enabled)
            .find(|p| p.name == key || p.id == key)
    }

    /// Add a new portal entry.
    pub fn add_portal(&mut self, portal: PortalEntry) {
        self.portals.push(portal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.freshness_window_secs, 300);
        assert_eq!(config.refresh_interval_secs, 30);
        assert!(config.portals.is_empty());
    }

    #[test]
    fn test_find_portal_by_name_or_id() {
        let mut config = AppConfig::default();
        let entry = PortalEntry::new(
            "main".to_string(),
            "https://tracking.example.com".to_string(),
            "ops".to_string(),
            DEFAULT_PASSWORD_ENV.to_string(),
        );
        let id = entry.id.clone();
        config.add_portal(entry);

        assert!(config.find_portal("main").is_some());
        assert!(config.find_portal(&id).is_some());
        assert!(config.find_portal("other").is_none());
    }

    #[test]
    fn test_disabled_portal_is_not_found() {
        let mut config = AppConfig::default();
        let mut entry = PortalEntry::new(
            "main".to_string(),
            "https://tracking.example.com".to_string(),
            "ops".to_string(),
            DEFAULT_PASSWORD_ENV.to_string(),
        );
        entry.enabled = false;
        config.add_portal(entry);

        assert!(config.find_portal("main").is_none());
    }
}
