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

//! Terminal dashboard showing the last ping location for each aircraft.
//!
//! Displays the fleet-status table on a periodic refresh. Observations come
//! either from a configured tracking portal (scraped each cycle) or from the
//! simulated source, which supports seeded demo data and manual pings.

mod config;
mod display;

use std::error::Error;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use fleet_client::{
    Client, ClientConfig, FleetConfig, FleetState, Observation, ObservationSource, PortalConfig,
    PortalSource, SimulatedSource,
};
use log::{info, warn};

use config::{AppConfig, PortalEntry};

#[derive(Debug, Parser)]
#[command(
    name = "hangarboard",
    about = "Dashboard showing the last ping location for each aircraft"
)]
struct Cli {
    /// Scrape the named portal from the config instead of running simulated.
    #[arg(long)]
    portal: Option<String>,

    /// Seed a demo fleet (simulated mode only).
    #[arg(long)]
    demo: bool,

    /// Queue a simulated ping, formatted TAIL@HANGAR (repeatable).
    #[arg(long = "ping", value_name = "TAIL@HANGAR")]
    pings: Vec<String>,

    /// Override the refresh interval in seconds.
    #[arg(long)]
    interval: Option<u64>,

    /// Override the freshness window in seconds.
    #[arg(long)]
    window: Option<i64>,

    /// Run one fetch cycle, render, and exit.
    #[arg(long)]
    once: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the config file path.
    ConfigPath,
    /// Add a portal entry to the config.
    AddPortal {
        name: String,
        base_url: String,
        username: String,
        /// Environment variable holding the portal password.
        #[arg(long)]
        password_env: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = AppConfig::load()?;

    if let Some(command) = cli.command {
        return handle_command(command, &mut app_config);
    }

    let client_config = ClientConfig {
        fleet: FleetConfig {
            freshness_window_secs: cli.window.unwrap_or(app_config.freshness_window_secs),
            ..Default::default()
        },
        poll_interval: Duration::from_secs(
            cli.interval.unwrap_or(app_config.refresh_interval_secs),
        ),
    };

    match cli.portal.as_deref() {
        Some(key) => {
            let entry = app_config
                .find_portal(key)
                .ok_or_else(|| format!("no enabled portal named '{key}' in config"))?;
            let source = portal_source(entry)?;
            run(source, client_config, cli.once).await
        }
        None => {
            let now = Utc::now();
            let mut source = if cli.demo {
                SimulatedSource::with_demo_fleet(now)
            } else {
                SimulatedSource::new()
            };
            for ping in &cli.pings {
                let (tail, hangar) = parse_ping(ping)?;
                source.ping(Observation::new(tail, hangar, now));
            }
            run(source, client_config, cli.once).await
        }
    }
}

fn handle_command(command: Command, app_config: &mut AppConfig) -> Result<(), Box<dyn Error>> {
    match command {
        Command::ConfigPath => {
            println!("{}", AppConfig::get_config_path()?.display());
        }
        Command::AddPortal {
            name,
            base_url,
            username,
            password_env,
        } => {
            let entry = PortalEntry::new(
                name,
                base_url,
                username,
                password_env.unwrap_or_else(|| config::DEFAULT_PASSWORD_ENV.to_string()),
            );
            let id = entry.id.clone();
            app_config.add_portal(entry);
            app_config.save()?;
            println!("added portal {id}");
        }
    }
    Ok(())
}

/// Build the portal source for a config entry, resolving the password from
/// its environment variable. The password goes straight into the source and
/// is never logged.
fn portal_source(entry: &PortalEntry) -> Result<PortalSource, Box<dyn Error>> {
    let password = std::env::var(&entry.password_env)
        .map_err(|_| format!("portal password not set; export {}", entry.password_env))?;

    let source = PortalSource::new(PortalConfig {
        base_url: entry.base_url.clone(),
        login_path: entry.login_path.clone(),
        positions_path: entry.positions_path.clone(),
        username: entry.username.clone(),
        password,
        table_marker: entry.table_marker.clone(),
        request_timeout: Duration::from_secs(20),
    })?;

    Ok(source)
}

/// Parse a `TAIL@HANGAR` ping argument.
fn parse_ping(value: &str) -> Result<(String, String), String> {
    match value.split_once('@') {
        Some((tail, hangar)) if !tail.trim().is_empty() && !hangar.trim().is_empty() => {
            Ok((tail.trim().to_string(), hangar.trim().to_string()))
        }
        _ => Err(format!("invalid ping '{value}', expected TAIL@HANGAR")),
    }
}

async fn run<S>(mut source: S, config: ClientConfig, once: bool) -> Result<(), Box<dyn Error>>
where
    S: ObservationSource + 'static,
{
    if once {
        let batch = source.fetch().await?;
        let mut state = FleetState::new(config.fleet);
        for obs in batch.observations {
            if let Err(e) = state.ingest(&obs.tail_number, &obs.hangar, obs.observed_at) {
                warn!("dropping observation: {e}");
            }
        }
        println!("{}", display::format_table(&state.render(Utc::now())));
        return Ok(());
    }

    let poll_interval = config.poll_interval;
    let client = Client::spawn(source, config);

    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                println!("\nFleet Status at {}", now.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("{}", display::format_table(&client.status_rows(now)));
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("shutting down");
                client.shutdown();
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ping() {
        let (tail, hangar) = parse_ping("C-GABC@Palmer Hanger 2").unwrap();
        assert_eq!(tail, "C-GABC");
        assert_eq!(hangar, "Palmer Hanger 2");
    }

    #[test]
    fn test_parse_ping_rejects_missing_parts() {
        assert!(parse_ping("C-GABC").is_err());
        assert!(parse_ping("@Palmer Hanger 2").is_err());
        assert!(parse_ping("C-GABC@").is_err());
    }
}
