//! Enum wrappers for device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn Camera>` is
//! not available. These enums give the engine one concrete type per device
//! role while still letting real and mock implementations be swapped at
//! start-up.
//!
//! # Examples
//!
//! ```
//! use smartpark_hardware::devices::AnyCamera;
//! use smartpark_hardware::mock::MockCameraHandle;
//! use smartpark_hardware::traits::Camera;
//!
//! #[tokio::main]
//! async fn main() -> smartpark_hardware::Result<()> {
//!     let handle = MockCameraHandle::new();
//!     let mut camera = AnyCamera::Mock(handle.open());
//!
//!     let frame = camera.capture().await?;
//!     assert!(!frame.is_empty());
//!     Ok(())
//! }
//! ```

use smartpark_protocol::GateCommand;

use crate::mock::{MockCamera, MockCommandWriter, MockPlateReader};
#[cfg(feature = "serial")]
use crate::serial::SerialCommandWriter;
use crate::snapshot::SnapshotCamera;
use crate::ocr_http::HttpPlateReader;
use crate::traits::{Camera, CommandWriter, PlateReader};
use crate::{DeviceInfo, Frame, Result, TextCandidate};

/// Write half of a controller link.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCommandWriter {
    /// Physical serial port.
    #[cfg(feature = "serial")]
    Serial(SerialCommandWriter),
    /// Mock writer for development and testing.
    Mock(MockCommandWriter),
}

impl CommandWriter for AnyCommandWriter {
    async fn write_command(&mut self, command: &GateCommand) -> Result<()> {
        match self {
            #[cfg(feature = "serial")]
            Self::Serial(device) => device.write_command(command).await,
            Self::Mock(device) => device.write_command(command).await,
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            #[cfg(feature = "serial")]
            Self::Serial(device) => device.info(),
            Self::Mock(device) => device.info(),
        }
    }
}

/// Camera device.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCamera {
    /// HTTP snapshot endpoint (IP camera or capture sidecar).
    Snapshot(SnapshotCamera),
    /// Mock camera for development and testing.
    Mock(MockCamera),
}

impl Camera for AnyCamera {
    async fn capture(&mut self) -> Result<Frame> {
        match self {
            Self::Snapshot(device) => device.capture().await,
            Self::Mock(device) => device.capture().await,
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Snapshot(device) => device.info(),
            Self::Mock(device) => device.info(),
        }
    }
}

/// OCR engine.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyPlateReader {
    /// HTTP OCR service.
    Http(HttpPlateReader),
    /// Mock reader for development and testing.
    Mock(MockPlateReader),
}

impl PlateReader for AnyPlateReader {
    async fn read_text(&self, frame: &Frame) -> Result<Vec<TextCandidate>> {
        match self {
            Self::Http(device) => device.read_text(frame).await,
            Self::Mock(device) => device.read_text(frame).await,
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Http(device) => device.info(),
            Self::Mock(device) => device.info(),
        }
    }
}
