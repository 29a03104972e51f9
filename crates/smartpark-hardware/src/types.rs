//! Common types shared across device implementations.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::OnceLock;

/// MIME type of every frame handled by the crate.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Size and shade of the frame served while no camera image exists.
const PLACEHOLDER_WIDTH: u32 = 640;
const PLACEHOLDER_HEIGHT: u32 = 480;
const PLACEHOLDER_GRAY: u8 = 128;

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "/dev/ttyACM0", "Mock Camera").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional endpoint (serial path or URL) the device was opened on.
    pub endpoint: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            endpoint: None,
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// One encoded camera frame.
///
/// The payload is reference-counted and immutable, so cloning a frame hands
/// out an independent value without copying the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    jpeg: Bytes,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap JPEG bytes captured now.
    pub fn from_jpeg(jpeg: impl Into<Bytes>) -> Self {
        Self {
            jpeg: jpeg.into(),
            captured_at: Utc::now(),
        }
    }

    /// Uniform gray frame used when nothing has been captured.
    pub fn placeholder() -> Self {
        Self::from_jpeg(placeholder_jpeg())
    }

    pub fn jpeg(&self) -> &Bytes {
        &self.jpeg
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }
}

/// Encoded gray placeholder image, built once per process.
pub fn placeholder_jpeg() -> Bytes {
    static PLACEHOLDER: OnceLock<Bytes> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| match encode_gray_jpeg() {
            Ok(jpeg) => Bytes::from(jpeg),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode placeholder frame");
                Bytes::new()
            }
        })
        .clone()
}

fn encode_gray_jpeg() -> image::ImageResult<Vec<u8>> {
    let gray = RgbImage::from_pixel(
        PLACEHOLDER_WIDTH,
        PLACEHOLDER_HEIGHT,
        Rgb([PLACEHOLDER_GRAY; 3]),
    );
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gray).write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(buf.into_inner())
}

/// One OCR reading: raw text and the engine's confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCandidate {
    pub text: String,
    pub confidence: f32,
}

impl TextCandidate {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// Returns `true` when the reading clears the given threshold (inclusive).
    pub fn meets(&self, min_confidence: f32) -> bool {
        self.confidence >= min_confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("ttyACM0", "Serial Controller").with_endpoint("/dev/ttyACM0");
        assert_eq!(info.endpoint.as_deref(), Some("/dev/ttyACM0"));
    }

    #[test]
    fn test_placeholder_is_jpeg() {
        let frame = Frame::placeholder();
        assert!(!frame.is_empty());
        // SOI marker
        assert_eq!(&frame.jpeg()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_placeholder_is_cached() {
        let a = placeholder_jpeg();
        let b = placeholder_jpeg();
        assert_eq!(a.as_ptr(), b.as_ptr());
    }

    #[rstest]
    #[case(0.60, 0.60, true)]
    #[case(0.60, 0.61, false)]
    #[case(0.95, 0.60, true)]
    #[case(0.0, 0.0, true)]
    fn test_candidate_threshold_is_inclusive(
        #[case] confidence: f32,
        #[case] min: f32,
        #[case] expected: bool,
    ) {
        assert_eq!(TextCandidate::new("AB123CD", confidence).meets(min), expected);
    }
}
