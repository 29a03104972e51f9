use smartpark_core::FaultCategory;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by the remote store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store unreachable or connection dropped.
    #[error("Transport error on {path}: {message}")]
    Transport { path: String, message: String },

    /// Request exceeded the configured timeout.
    #[error("Timeout after {timeout_ms}ms on {path}")]
    Timeout { path: String, timeout_ms: u64 },

    /// Store answered with a non-success status.
    #[error("HTTP {code} on {path}")]
    Status { path: String, code: u16 },

    /// Document did not have the expected shape.
    #[error("Malformed document at {path}: {message}")]
    Malformed { path: String, message: String },

    /// Request body could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn transport(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Operator-facing category of this failure.
    pub fn category(&self) -> FaultCategory {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } | Self::Status { .. } => {
                FaultCategory::Transport
            }
            Self::Malformed { .. } | Self::Encode(_) => FaultCategory::MalformedData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_transport() {
        let err = StoreError::Status {
            path: "Estacionamiento_inteligente".into(),
            code: 401,
        };
        assert_eq!(err.category(), FaultCategory::Transport);
        assert_eq!(err.to_string(), "HTTP 401 on Estacionamiento_inteligente");
    }

    #[test]
    fn test_malformed_category() {
        let err = StoreError::malformed("estado/lugares", "expected object");
        assert_eq!(err.category(), FaultCategory::MalformedData);
    }
}
