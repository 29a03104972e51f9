//! Device failures.
//!
//! Every variant belongs to one of two operator-facing categories:
//! *hardware-unavailable* (controller link or camera absent or closed) and
//! *recognition-unavailable* (plate reader missing or failing). Garbage
//! coming back from a device is reported as malformed data.

use smartpark_core::FaultCategory;

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Serial port, camera or HTTP endpoint is gone.
    #[error("{device} is not connected")]
    Disconnected { device: String },

    #[error("device did not answer within {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The device answered, but not successfully.
    #[error("device request failed: {message}")]
    CommunicationError { message: String },

    /// Undecodable frame or OCR payload.
    #[error("unreadable device data: {message}")]
    InvalidData { message: String },

    #[error("device setup failed: {message}")]
    InitializationFailed { message: String },

    /// Required setting missing, e.g. no serial port configured.
    #[error("device not configured: {message}")]
    ConfigurationError { message: String },

    /// Plate reader is not attached or returned an unusable answer.
    #[error("plate reader unavailable: {message}")]
    RecognitionUnavailable { message: String },

    #[error("serial I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn recognition(message: impl Into<String>) -> Self {
        Self::RecognitionUnavailable {
            message: message.into(),
        }
    }

    /// Map a reqwest failure from one of the HTTP-attached devices.
    pub(crate) fn from_http(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::timeout(timeout_ms)
        } else if err.is_connect() {
            Self::disconnected(
                err.url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "http device".to_string()),
            )
        } else if err.is_decode() {
            Self::invalid_data(err.to_string())
        } else {
            Self::communication(err.to_string())
        }
    }

    /// Operator-facing category of this failure.
    pub fn category(&self) -> FaultCategory {
        match self {
            Self::RecognitionUnavailable { .. } => FaultCategory::RecognitionUnavailable,
            Self::InvalidData { .. } => FaultCategory::MalformedData,
            _ => FaultCategory::HardwareUnavailable,
        }
    }

    /// Returns `true` when the device is gone and must be reacquired.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("/dev/ttyUSB0");
        assert!(error.is_disconnected());
        assert_eq!(error.to_string(), "/dev/ttyUSB0 is not connected");
        assert_eq!(error.category(), FaultCategory::HardwareUnavailable);
    }

    #[test]
    fn test_timeout_error() {
        let error = HardwareError::timeout(3000);
        assert!(matches!(error, HardwareError::Timeout { .. }));
        assert_eq!(error.to_string(), "device did not answer within 3000ms");
    }

    #[test]
    fn test_recognition_error() {
        let error = HardwareError::recognition("no plate reader attached");
        assert!(!error.is_disconnected());
        assert_eq!(error.category(), FaultCategory::RecognitionUnavailable);
        assert_eq!(
            error.to_string(),
            "plate reader unavailable: no plate reader attached"
        );
    }

    #[test]
    fn test_serial_write_failure_is_hardware_fault() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port closed");
        let error: HardwareError = io.into();
        assert!(matches!(error, HardwareError::Io(_)));
        assert_eq!(error.category(), FaultCategory::HardwareUnavailable);
    }

    #[test]
    fn test_bad_payload_is_malformed_data() {
        let error = HardwareError::invalid_data("OCR response: expected array");
        assert_eq!(error.category(), FaultCategory::MalformedData);
    }
}
