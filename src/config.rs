//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

use crate::state::clock::MAX_QUARTER_DURATION;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCOREBOARD_CONFIG_PATH";
/// Quarter length used when neither the request nor the match record provides one.
const DEFAULT_QUARTER_DURATION: Duration = Duration::from_secs(10);
const DEFAULT_QUARTERS_PER_MATCH: u8 = 4;
const DEFAULT_MATCH_STREAM_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Quarter length applied to matches created without an explicit one.
    pub quarter_duration: Duration,
    /// Number of quarters after which advancing finishes the match.
    pub quarters_per_match: u8,
    /// Buffered events per match SSE channel.
    pub match_stream_capacity: usize,
    /// Whether a `timer.expired` event is pushed when a running countdown reaches zero.
    pub notify_expiry: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        quarter_secs = app_config.quarter_duration.as_secs(),
                        quarters = app_config.quarters_per_match,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, filling absent keys with defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quarter_duration: DEFAULT_QUARTER_DURATION,
            quarters_per_match: DEFAULT_QUARTERS_PER_MATCH,
            match_stream_capacity: DEFAULT_MATCH_STREAM_CAPACITY,
            notify_expiry: false,
        }
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    quarter_duration_seconds: Option<Duration>,
    quarters_per_match: Option<u8>,
    match_stream_capacity: Option<usize>,
    notify_expiry: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            quarter_duration: value
                .quarter_duration_seconds
                .filter(|duration| !duration.is_zero())
                .map(|duration| {
                    if duration > MAX_QUARTER_DURATION {
                        warn!(
                            requested_secs = duration.as_secs(),
                            max_secs = MAX_QUARTER_DURATION.as_secs(),
                            "quarter duration too long; capping"
                        );
                    }
                    duration.min(MAX_QUARTER_DURATION)
                })
                .unwrap_or(defaults.quarter_duration),
            quarters_per_match: value
                .quarters_per_match
                .filter(|quarters| *quarters > 0)
                .unwrap_or(defaults.quarters_per_match),
            match_stream_capacity: value
                .match_stream_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.match_stream_capacity),
            notify_expiry: value.notify_expiry.unwrap_or(defaults.notify_expiry),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
