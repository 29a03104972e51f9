//! Device acquisition at station start-up.
//!
//! A [`DeviceSource`] opens each device independently so one missing device
//! never prevents the others from being used. Opening may block (serial
//! ports need a settle delay), so the engine calls these methods from the
//! blocking pool.

use tracing::debug;

use crate::{
    HardwareError, Result,
    config::{HttpOcrConfig, SerialConfig, SnapshotCameraConfig},
    controller::ControllerLink,
    devices::{AnyCamera, AnyPlateReader},
    mock::{MockCameraHandle, MockControllerHandle, MockPlateReaderHandle},
    ocr_http::HttpPlateReader,
    snapshot::SnapshotCamera,
};

/// Opens the devices a station runs with.
pub trait DeviceSource: Send + Sync {
    fn open_controller(&self) -> Result<ControllerLink>;

    fn open_camera(&self) -> Result<AnyCamera>;

    fn open_plate_reader(&self) -> Result<AnyPlateReader>;
}

/// Devices described by configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredDevices {
    pub serial: Option<SerialConfig>,
    pub camera: Option<SnapshotCameraConfig>,
    pub ocr: Option<HttpOcrConfig>,
}

impl ConfiguredDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serial(mut self, config: SerialConfig) -> Self {
        self.serial = Some(config);
        self
    }

    pub fn with_camera(mut self, config: SnapshotCameraConfig) -> Self {
        self.camera = Some(config);
        self
    }

    pub fn with_ocr(mut self, config: HttpOcrConfig) -> Self {
        self.ocr = Some(config);
        self
    }

    /// Read every device section from `SMARTPARK_*` variables.
    pub fn from_env() -> Self {
        Self {
            serial: SerialConfig::from_env(),
            camera: SnapshotCameraConfig::from_env(),
            ocr: HttpOcrConfig::from_env(),
        }
    }
}

impl DeviceSource for ConfiguredDevices {
    fn open_controller(&self) -> Result<ControllerLink> {
        let config = self
            .serial
            .as_ref()
            .ok_or_else(|| HardwareError::configuration("no serial port configured"))?;
        debug!(port = %config.port, "opening controller link");

        #[cfg(feature = "serial")]
        {
            crate::serial::open_serial(config)
        }
        #[cfg(not(feature = "serial"))]
        {
            Err(HardwareError::configuration(format!(
                "serial support not compiled in, cannot open {}",
                config.port
            )))
        }
    }

    fn open_camera(&self) -> Result<AnyCamera> {
        let config = self
            .camera
            .clone()
            .ok_or_else(|| HardwareError::configuration("no camera configured"))?;
        Ok(AnyCamera::Snapshot(SnapshotCamera::new(config)?))
    }

    fn open_plate_reader(&self) -> Result<AnyPlateReader> {
        let config = self
            .ocr
            .clone()
            .ok_or_else(|| HardwareError::recognition("no OCR service configured"))?;
        Ok(AnyPlateReader::Http(HttpPlateReader::new(config)?))
    }
}

/// Mock devices driven from tests through their handles.
///
/// A device without a handle behaves as absent.
#[derive(Debug, Clone, Default)]
pub struct MockDevices {
    controller: Option<MockControllerHandle>,
    camera: Option<MockCameraHandle>,
    plate_reader: Option<MockPlateReaderHandle>,
}

impl MockDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_controller(mut self, handle: MockControllerHandle) -> Self {
        self.controller = Some(handle);
        self
    }

    pub fn with_camera(mut self, handle: MockCameraHandle) -> Self {
        self.camera = Some(handle);
        self
    }

    pub fn with_plate_reader(mut self, handle: MockPlateReaderHandle) -> Self {
        self.plate_reader = Some(handle);
        self
    }
}

impl DeviceSource for MockDevices {
    fn open_controller(&self) -> Result<ControllerLink> {
        self.controller
            .as_ref()
            .map(MockControllerHandle::open_link)
            .ok_or_else(|| HardwareError::disconnected("Mock Controller"))
    }

    fn open_camera(&self) -> Result<AnyCamera> {
        self.camera
            .as_ref()
            .map(|handle| AnyCamera::Mock(handle.open()))
            .ok_or_else(|| HardwareError::disconnected("Mock Camera"))
    }

    fn open_plate_reader(&self) -> Result<AnyPlateReader> {
        self.plate_reader
            .as_ref()
            .map(|handle| AnyPlateReader::Mock(handle.open()))
            .ok_or_else(|| HardwareError::recognition("no mock plate reader"))
    }
}
