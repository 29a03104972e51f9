use smartpark_core::constants::{
    DEFAULT_FRAME_INTERVAL_MS, DEFAULT_JOIN_TIMEOUT_MS, DEFAULT_LOG_CAPACITY,
    DEFAULT_MAX_BACKGROUND_TASKS, DEFAULT_MIN_CONFIDENCE, DEFAULT_NUM_SENSORS,
    DEFAULT_OPEN_COOLDOWN_MS, DEFAULT_RESERVATION_POLL_MS, DEFAULT_STABILIZATION_DELAY_MS,
    DEFAULT_STORE_ROOT,
};
use std::time::Duration;

/// Station tuning.
///
/// # Example
///
/// ```
/// use smartpark_engine::StationConfig;
/// use std::time::Duration;
///
/// let config = StationConfig::default()
///     .with_num_sensors(6)
///     .with_open_cooldown(Duration::from_secs(5));
/// assert_eq!(config.num_sensors, 6);
/// assert_eq!(config.log_capacity, 500);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    /// Number of physical slots reported by the sensor controller.
    pub num_sensors: usize,

    /// Minimum OCR confidence for a candidate to be checked (inclusive).
    pub min_confidence: f32,

    /// Minimum interval between two open commands.
    pub open_cooldown: Duration,

    /// Wait between a detection and the frame used for recognition.
    pub stabilization_delay: Duration,

    /// Pause between loop iterations.
    pub frame_interval: Duration,

    /// Period of the remote slot poll feeding the local cache.
    pub reservation_poll_interval: Duration,

    /// Upper bound on waiting for the loop task at stop.
    pub join_timeout: Duration,

    /// Entries kept in the operator log.
    pub log_capacity: usize,

    /// Detached jobs allowed to run at the same time.
    pub max_background_tasks: usize,

    /// Authorization root document in the remote store.
    pub store_root: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            num_sensors: DEFAULT_NUM_SENSORS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            open_cooldown: Duration::from_millis(DEFAULT_OPEN_COOLDOWN_MS),
            stabilization_delay: Duration::from_millis(DEFAULT_STABILIZATION_DELAY_MS),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
            reservation_poll_interval: Duration::from_millis(DEFAULT_RESERVATION_POLL_MS),
            join_timeout: Duration::from_millis(DEFAULT_JOIN_TIMEOUT_MS),
            log_capacity: DEFAULT_LOG_CAPACITY,
            max_background_tasks: DEFAULT_MAX_BACKGROUND_TASKS,
            store_root: DEFAULT_STORE_ROOT.to_string(),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl StationConfig {
    pub fn with_num_sensors(mut self, num_sensors: usize) -> Self {
        self.num_sensors = num_sensors;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_open_cooldown(mut self, cooldown: Duration) -> Self {
        self.open_cooldown = cooldown;
        self
    }

    pub fn with_stabilization_delay(mut self, delay: Duration) -> Self {
        self.stabilization_delay = delay;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_reservation_poll_interval(mut self, interval: Duration) -> Self {
        self.reservation_poll_interval = interval;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_max_background_tasks(mut self, max: usize) -> Self {
        self.max_background_tasks = max;
        self
    }

    pub fn with_store_root(mut self, root: impl Into<String>) -> Self {
        self.store_root = root.into();
        self
    }

    /// Defaults overridden by `SMARTPARK_*` variables.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_parse::<usize>("SMARTPARK_NUM_SENSORS") {
            config.num_sensors = n;
        }
        if let Some(c) = env_parse::<f32>("SMARTPARK_MIN_CONFIDENCE") {
            config.min_confidence = c;
        }
        if let Some(d) = env_millis("SMARTPARK_OPEN_COOLDOWN_MS") {
            config.open_cooldown = d;
        }
        if let Some(d) = env_millis("SMARTPARK_STABILIZATION_MS") {
            config.stabilization_delay = d;
        }
        if let Some(d) = env_millis("SMARTPARK_FRAME_INTERVAL_MS") {
            config.frame_interval = d;
        }
        if let Some(d) = env_millis("SMARTPARK_RESERVATION_POLL_MS") {
            config.reservation_poll_interval = d;
        }
        if let Some(d) = env_millis("SMARTPARK_JOIN_TIMEOUT_MS") {
            config.join_timeout = d;
        }
        if let Some(n) = env_parse::<usize>("SMARTPARK_LOG_CAPACITY") {
            config.log_capacity = n;
        }
        if let Some(n) = env_parse::<usize>("SMARTPARK_MAX_BACKGROUND_TASKS") {
            config.max_background_tasks = n;
        }
        if let Ok(root) = std::env::var("SMARTPARK_STORE_ROOT") {
            config.store_root = root;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StationConfig::default();
        assert_eq!(config.num_sensors, 4);
        assert_eq!(config.open_cooldown, Duration::from_millis(3000));
        assert_eq!(config.log_capacity, 500);
        assert!((config.min_confidence - 0.60).abs() < f32::EPSILON);
        assert_eq!(config.store_root, "Estacionamiento_inteligente");
    }

    #[test]
    fn test_setters_chain() {
        let config = StationConfig::default()
            .with_min_confidence(0.9)
            .with_log_capacity(10)
            .with_store_root("demo");
        assert_eq!(config.log_capacity, 10);
        assert_eq!(config.store_root, "demo");
    }
}
