use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Roughly 30 frames per second.
pub const DEFAULT_STREAM_INTERVAL: Duration = Duration::from_millis(33);

/// Serving-layer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,

    /// Pause between two parts of the MJPEG stream.
    pub stream_interval: Duration,

    /// Start recognition as soon as the server is up.
    pub autostart: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            stream_interval: DEFAULT_STREAM_INTERVAL,
            autostart: false,
        }
    }
}

impl ServerConfig {
    /// Read `SMARTPARK_BIND`, `SMARTPARK_STREAM_INTERVAL_MS` and
    /// `SMARTPARK_AUTOSTART`. Unset variables keep their defaults; an
    /// unparsable bind address is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(bind) = std::env::var("SMARTPARK_BIND") {
            config.bind = bind
                .parse()
                .with_context(|| format!("invalid SMARTPARK_BIND {bind:?}"))?;
        }
        if let Some(ms) = std::env::var("SMARTPARK_STREAM_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.stream_interval = Duration::from_millis(ms);
        }
        if let Ok(flag) = std::env::var("SMARTPARK_AUTOSTART") {
            config.autostart = parse_flag(&flag);
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
