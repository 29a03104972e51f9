use reqwest::Client;

use crate::{
    HardwareError, Result,
    config::SnapshotCameraConfig,
    traits::Camera,
    types::{DeviceInfo, Frame},
};

/// Camera that serves one JPEG per `GET` request.
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    client: Client,
    config: SnapshotCameraConfig,
}

impl SnapshotCamera {
    /// Build the HTTP client. No request is made until the first capture.
    pub fn new(config: SnapshotCameraConfig) -> Result<Self> {
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

impl Camera for SnapshotCamera {
    async fn capture(&mut self) -> Result<Frame> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| HardwareError::from_http(e, self.timeout_ms()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HardwareError::communication(format!(
                "camera returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HardwareError::from_http(e, self.timeout_ms()))?;
        if body.is_empty() {
            return Err(HardwareError::invalid_data("camera returned an empty frame"));
        }

        Ok(Frame::from_jpeg(body))
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new("Snapshot Camera", "HTTP JPEG").with_endpoint(self.config.url.clone())
    }
}
