//! License plate canonicalization.
//!
//! OCR output and user-entered plates arrive with arbitrary case, spaces,
//! dashes and dots. Every comparison in the system happens on the canonical
//! form: uppercase ASCII letters and digits only.
//!
//! ```
//! use smartpark_core::normalize;
//!
//! assert_eq!(normalize("xy-999 zz").as_str(), "XY999ZZ");
//! assert!(normalize(" - ").is_empty());
//! ```

use crate::constants::{LEGACY_PLATE_FIELD, PLATE_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use subtle::ConstantTimeEq;

/// Canonical license plate over `[A-Z0-9]*`.
///
/// An empty plate means "no plate" and never matches a reservation.
///
/// # Security
/// Comparison is constant-time, like every credential comparison in the
/// access path.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plate(String);

impl Plate {
    /// Canonicalize raw text into a plate. Never fails.
    #[must_use]
    pub fn normalize(text: &str) -> Self {
        Plate(
            text.chars()
                .flat_map(char::to_uppercase)
                .filter(char::is_ascii_alphanumeric)
                .collect(),
        )
    }

    /// Get the canonical plate as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the text contained no plate characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Canonicalize raw OCR or user text into a [`Plate`].
#[must_use]
pub fn normalize(text: &str) -> Plate {
    Plate::normalize(text)
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Plate {
    fn from(text: &str) -> Self {
        Plate::normalize(text)
    }
}

impl PartialEq for Plate {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for Plate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Extract the plate from a reservation holder's record.
///
/// Accepted shapes:
/// - an object with a `Plate` (or legacy `Patente`) string field
/// - an array whose second element is the plate
/// - a string containing the JSON encoding of either of the above
///
/// Anything else yields an empty plate.
///
/// ```
/// use serde_json::json;
/// use smartpark_core::extract_plate_from_document;
///
/// assert_eq!(extract_plate_from_document(&json!({"Plate": "ab 123"})).as_str(), "AB123");
/// assert_eq!(extract_plate_from_document(&json!(r#"["ana","cd-456"]"#)).as_str(), "CD456");
/// assert!(extract_plate_from_document(&json!(42)).is_empty());
/// ```
#[must_use]
pub fn extract_plate_from_document(doc: &Value) -> Plate {
    match doc {
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            // One level of encoding only; a string inside a string is not a record.
            Ok(inner @ (Value::Object(_) | Value::Array(_))) => extract_plate_from_document(&inner),
            _ => Plate::default(),
        },
        Value::Object(record) => record
            .get(PLATE_FIELD)
            .or_else(|| record.get(LEGACY_PLATE_FIELD))
            .and_then(Value::as_str)
            .map(Plate::normalize)
            .unwrap_or_default(),
        Value::Array(items) => items
            .get(1)
            .and_then(Value::as_str)
            .map(Plate::normalize)
            .unwrap_or_default(),
        _ => Plate::default(),
    }
}
