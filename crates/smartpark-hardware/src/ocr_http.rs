//! Plate reader backed by an HTTP OCR service.
//!
//! The service receives the frame as an `image/jpeg` request body and
//! answers with a JSON list of readings. Three item shapes are accepted,
//! covering the common OCR server wrappers:
//!
//! ```text
//! [{"text": "AB123CD", "confidence": 0.91}]
//! [["AB123CD", 0.91]]
//! [[[[0,0],[10,0],[10,5],[0,5]], "AB123CD", 0.91]]
//! ```
//!
//! The list may also be wrapped as `{"results": [...]}`.

use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;

use crate::{
    HardwareError, Result,
    config::HttpOcrConfig,
    traits::PlateReader,
    types::{DeviceInfo, Frame, JPEG_CONTENT_TYPE, TextCandidate},
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawReading {
    Object { text: String, confidence: f32 },
    Pair(String, f32),
    WithBox(serde_json::Value, String, f32),
}

impl From<RawReading> for TextCandidate {
    fn from(raw: RawReading) -> Self {
        match raw {
            RawReading::Object { text, confidence }
            | RawReading::Pair(text, confidence)
            | RawReading::WithBox(_, text, confidence) => TextCandidate::new(text, confidence),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OcrResponse {
    List(Vec<RawReading>),
    Wrapped { results: Vec<RawReading> },
}

impl OcrResponse {
    fn into_candidates(self) -> Vec<TextCandidate> {
        let (OcrResponse::List(readings) | OcrResponse::Wrapped { results: readings }) = self;
        readings.into_iter().map(TextCandidate::from).collect()
    }
}

/// OCR engine reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlateReader {
    client: Client,
    config: HttpOcrConfig,
}

impl HttpPlateReader {
    pub fn new(config: HttpOcrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HardwareError::initialization_failed(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }
}

impl PlateReader for HttpPlateReader {
    async fn read_text(&self, frame: &Frame) -> Result<Vec<TextCandidate>> {
        let response = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, JPEG_CONTENT_TYPE)
            .body(frame.jpeg().clone())
            .send()
            .await
            .map_err(|e| HardwareError::from_http(e, self.timeout_ms()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HardwareError::recognition(format!(
                "OCR service returned HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: OcrResponse = response
            .json()
            .await
            .map_err(|e| HardwareError::invalid_data(format!("OCR response: {}", e)))?;
        Ok(parsed.into_candidates())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("HTTP Plate Reader", "OCR Service").with_endpoint(self.config.url.clone())
    }
}
