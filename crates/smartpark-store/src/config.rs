use smartpark_core::constants::{DEFAULT_STORE_ROOT, DEFAULT_STORE_TIMEOUT_MS};
use std::time::Duration;

/// Remote store connection settings.
///
/// # Example
///
/// ```
/// use smartpark_store::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::new("https://smartpark.example.firebaseio.com")
///     .with_auth_token("secret")
///     .with_timeout(Duration::from_secs(3));
/// assert_eq!(config.root, "Estacionamiento_inteligente");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database base URL, without a trailing `.json`.
    pub base_url: String,

    /// Authorization root document.
    pub root: String,

    /// Optional database secret or ID token, sent as `?auth=`.
    pub auth_token: Option<String>,

    /// Timeout for every request.
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            root: DEFAULT_STORE_ROOT.to_string(),
            auth_token: None,
            timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `SMARTPARK_STORE_URL` (required), `SMARTPARK_STORE_ROOT`,
    /// `SMARTPARK_STORE_AUTH` and `SMARTPARK_STORE_TIMEOUT_MS`.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SMARTPARK_STORE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        let mut config = Self::new(base_url);

        if let Ok(root) = std::env::var("SMARTPARK_STORE_ROOT") {
            if !root.trim().is_empty() {
                config.root = root;
            }
        }
        config.auth_token = std::env::var("SMARTPARK_STORE_AUTH")
            .ok()
            .filter(|v| !v.is_empty());
        if let Some(ms) = std::env::var("SMARTPARK_STORE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_millis(ms);
        }

        Some(config)
    }
}
