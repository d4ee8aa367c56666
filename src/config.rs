//! Presence configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

use crate::transport::{PersistenceSpec, TransportConfig};

pub const DEFAULT_ENDPOINT: &str = "/ping";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_GAME_ID: &str = "game";
pub const DEFAULT_WRAP_WIDTH: usize = 18;
pub const DEFAULT_ZOOM: f64 = 2.0;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 50;
pub const DEFAULT_DEMO_FRAMES: u64 = 1200;
pub const DEFAULT_DEMO_PARTICIPANTS: usize = 4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be greater than zero")]
    NotPositive { var: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresenceConfig {
    /// Master switch. When off, the session neither starts the transport nor
    /// reacts to updates or ticks.
    pub enabled: bool,
    pub endpoint: String,
    pub poll_interval: Duration,
    /// Prefix of the published room key (`"<game_id>:<room>"`).
    pub game_id: String,
    /// Characters per message balloon line.
    pub wrap_width: usize,
    /// Screen zoom applied when placing balloons.
    pub zoom: f64,
    pub persistence: PersistenceSpec,
    /// Host frame cadence for the demo driver.
    pub frame_interval: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            game_id: DEFAULT_GAME_ID.to_owned(),
            wrap_width: DEFAULT_WRAP_WIDTH,
            zoom: DEFAULT_ZOOM,
            persistence: PersistenceSpec::default(),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
        }
    }
}

impl PresenceConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `PRESENCE_ENABLED`: default `true`
    /// - `PRESENCE_ENDPOINT`: default `/ping`
    /// - `PRESENCE_POLL_INTERVAL_MS`: default 1000
    /// - `PRESENCE_GAME_ID`: default `game`
    /// - `PRESENCE_WRAP_WIDTH`: default 18
    /// - `PRESENCE_ZOOM`: default 2
    /// - `PRESENCE_FRAME_INTERVAL_MS`: default 50
    ///
    /// Unparsable values fall back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] when an interval, the wrap width or
    /// the zoom is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`PresenceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let poll_ms = parse_or(&lookup, "PRESENCE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);
        let frame_ms = parse_or(&lookup, "PRESENCE_FRAME_INTERVAL_MS", DEFAULT_FRAME_INTERVAL_MS);
        let wrap_width = parse_or(&lookup, "PRESENCE_WRAP_WIDTH", DEFAULT_WRAP_WIDTH);
        let zoom = parse_or(&lookup, "PRESENCE_ZOOM", DEFAULT_ZOOM);

        if poll_ms == 0 {
            return Err(ConfigError::NotPositive { var: "PRESENCE_POLL_INTERVAL_MS" });
        }
        if frame_ms == 0 {
            return Err(ConfigError::NotPositive { var: "PRESENCE_FRAME_INTERVAL_MS" });
        }
        if wrap_width == 0 {
            return Err(ConfigError::NotPositive { var: "PRESENCE_WRAP_WIDTH" });
        }
        if zoom.is_nan() || zoom <= 0.0 {
            return Err(ConfigError::NotPositive { var: "PRESENCE_ZOOM" });
        }

        Ok(Self {
            enabled: parse_or(&lookup, "PRESENCE_ENABLED", true),
            endpoint: lookup("PRESENCE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            poll_interval: Duration::from_millis(poll_ms),
            game_id: lookup("PRESENCE_GAME_ID").unwrap_or_else(|| DEFAULT_GAME_ID.to_owned()),
            wrap_width,
            zoom,
            persistence: PersistenceSpec::default(),
            frame_interval: Duration::from_millis(frame_ms),
        })
    }

    #[must_use]
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            endpoint: self.endpoint.clone(),
            poll_interval: self.poll_interval,
            persistence: self.persistence.clone(),
        }
    }
}

/// Settings for the headless demo driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoConfig {
    /// Frames to run before tearing down.
    pub frames: u64,
    /// Simulated remote participants.
    pub participants: usize,
}

impl DemoConfig {
    /// Optional: `PRESENCE_DEMO_FRAMES` (default 1200),
    /// `PRESENCE_DEMO_PARTICIPANTS` (default 4).
    #[must_use]
    pub fn from_env() -> Self {
        let lookup = |key: &str| std::env::var(key).ok();
        Self {
            frames: parse_or(&lookup, "PRESENCE_DEMO_FRAMES", DEFAULT_DEMO_FRAMES),
            participants: parse_or(&lookup, "PRESENCE_DEMO_PARTICIPANTS", DEFAULT_DEMO_PARTICIPANTS),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
