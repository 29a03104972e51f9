//! Device configuration.
//!
//! Each `from_env` constructor returns `None` when the device is not
//! configured at all, so a station can run with any subset of devices.
//!
//! | Variable | Device |
//! |----------|--------|
//! | `SMARTPARK_SERIAL_PORT` | controller link (required to enable) |
//! | `SMARTPARK_SERIAL_BAUD` | controller baud rate |
//! | `SMARTPARK_CAMERA_URL` | snapshot camera (required to enable) |
//! | `SMARTPARK_CAMERA_TIMEOUT_MS` | snapshot request timeout |
//! | `SMARTPARK_OCR_URL` | plate reader service (required to enable) |
//! | `SMARTPARK_OCR_TIMEOUT_MS` | plate reader request timeout |

use smartpark_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_SERIAL_SETTLE_MS};
use std::time::Duration;

const DEFAULT_SERIAL_READ_TIMEOUT_MS: u64 = 100;
const DEFAULT_CAMERA_TIMEOUT_MS: u64 = 2000;
const DEFAULT_OCR_TIMEOUT_MS: u64 = 5000;

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Serial link to the gate/sensor microcontroller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port path (e.g., `/dev/ttyACM0`, `COM7`).
    pub port: String,
    pub baud_rate: u32,
    /// Read poll interval of the reader thread.
    pub read_timeout: Duration,
    /// Wait after opening while the board resets.
    pub settle_delay: Duration,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(DEFAULT_SERIAL_READ_TIMEOUT_MS),
            settle_delay: Duration::from_millis(DEFAULT_SERIAL_SETTLE_MS),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn from_env() -> Option<Self> {
        let port = env_string("SMARTPARK_SERIAL_PORT")?;
        let baud_rate = std::env::var("SMARTPARK_SERIAL_BAUD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BAUD_RATE);
        Some(Self::new(port).with_baud_rate(baud_rate))
    }
}

/// HTTP snapshot camera (`GET url` returns one JPEG).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotCameraConfig {
    pub url: String,
    pub timeout: Duration,
}

impl SnapshotCameraConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_millis(DEFAULT_CAMERA_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Option<Self> {
        let url = env_string("SMARTPARK_CAMERA_URL")?;
        let mut config = Self::new(url);
        if let Some(timeout) = env_millis("SMARTPARK_CAMERA_TIMEOUT_MS") {
            config.timeout = timeout;
        }
        Some(config)
    }
}

/// HTTP OCR service (`POST url` with a JPEG body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOcrConfig {
    pub url: String,
    pub timeout: Duration,
}

impl HttpOcrConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_millis(DEFAULT_OCR_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Option<Self> {
        let url = env_string("SMARTPARK_OCR_URL")?;
        let mut config = Self::new(url);
        if let Some(timeout) = env_millis("SMARTPARK_OCR_TIMEOUT_MS") {
            config.timeout = timeout;
        }
        Some(config)
    }
}
