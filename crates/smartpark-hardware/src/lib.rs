//! Device abstraction layer for the SmartPark gate controller.
//!
//! Three device roles feed the recognition loop:
//!
//! - the **controller link** to the gate/sensor microcontroller (serial or
//!   mock), split into a [`CommandWriter`] and an inbound message stream
//! - a **camera** producing JPEG frames
//! - a **plate reader** (OCR engine) turning a frame into text candidates
//!
//! Traits use native `async fn` and are dispatched through the enums in
//! [`devices`]. [`DeviceSource`] opens each role independently at start-up.
//!
//! # Example
//!
//! ```
//! use smartpark_hardware::mock::{MockControllerHandle, MockPlateReaderHandle};
//! use smartpark_hardware::{DeviceSource, MockDevices, PlateReader, Frame};
//!
//! #[tokio::main]
//! async fn main() -> smartpark_hardware::Result<()> {
//!     let ocr = MockPlateReaderHandle::new();
//!     ocr.set_candidates([("xy-999zz", 0.7)]);
//!
//!     let devices = MockDevices::new()
//!         .with_controller(MockControllerHandle::new())
//!         .with_plate_reader(ocr);
//!
//!     let reader = devices.open_plate_reader()?;
//!     let candidates = reader.read_text(&Frame::placeholder()).await?;
//!     assert_eq!(candidates[0].text, "xy-999zz");
//!     assert!(devices.open_camera().is_err());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod devices;
pub mod error;
pub mod mock;
pub mod ocr_http;
#[cfg(feature = "serial")]
pub mod serial;
pub mod snapshot;
pub mod source;
pub mod traits;
pub mod types;

pub use config::{HttpOcrConfig, SerialConfig, SnapshotCameraConfig};
pub use controller::ControllerLink;
pub use devices::{AnyCamera, AnyCommandWriter, AnyPlateReader};
pub use error::{HardwareError, Result};
pub use source::{ConfiguredDevices, DeviceSource, MockDevices};
pub use traits::{Camera, CommandWriter, PlateReader};
pub use types::{DeviceInfo, Frame, JPEG_CONTENT_TYPE, TextCandidate, placeholder_jpeg};
