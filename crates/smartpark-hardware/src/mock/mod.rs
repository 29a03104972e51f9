//! Mock device implementations for testing and development.
//!
//! Each mock is created from a cloneable handle that stays valid across
//! station restarts, so tests can keep driving the device after a
//! stop/start cycle.

pub mod camera;
pub mod controller;
pub mod ocr;

pub use camera::{MockCamera, MockCameraHandle};
pub use controller::{MockCommandWriter, MockControllerHandle};
pub use ocr::{MockPlateReader, MockPlateReaderHandle};
