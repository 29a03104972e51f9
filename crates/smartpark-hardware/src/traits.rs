//! Device trait definitions.
//!
//! All traits use native `async fn` methods (Edition 2024). They are not
//! object-safe; dynamic selection between real and mock devices goes
//! through the enum wrappers in [`crate::devices`].
//!
//! # Devices
//!
//! - [`CommandWriter`]: outbound half of the microcontroller link
//! - [`Camera`]: still-frame source
//! - [`PlateReader`]: OCR engine turning a frame into text candidates

use crate::{
    Result,
    types::{DeviceInfo, Frame, TextCandidate},
};
use smartpark_protocol::GateCommand;

/// Outbound half of the gate/sensor controller link.
///
/// Implementations write the command followed by the line terminator and
/// flush before returning. Callers are responsible for serializing writes.
///
/// # Examples
///
/// ```no_run
/// use smartpark_hardware::traits::CommandWriter;
/// use smartpark_protocol::GateCommand;
///
/// async fn open_gate<W: CommandWriter>(writer: &mut W) -> smartpark_hardware::Result<()> {
///     writer.write_command(&GateCommand::Open).await
/// }
/// ```
pub trait CommandWriter: Send + Sync {
    /// Write one command line and flush.
    ///
    /// # Errors
    ///
    /// - `HardwareError::Disconnected` if the link is closed
    /// - `HardwareError::Io` on a failed write or flush
    async fn write_command(&mut self, command: &GateCommand) -> Result<()>;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}

/// Still-frame camera.
pub trait Camera: Send + Sync {
    /// Capture one frame.
    async fn capture(&mut self) -> Result<Frame>;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}

/// OCR engine.
///
/// Candidates are returned in the engine's own order; callers scan them in
/// that order and stop at the first accepted one.
pub trait PlateReader: Send + Sync {
    /// Read text candidates from a frame.
    async fn read_text(&self, frame: &Frame) -> Result<Vec<TextCandidate>>;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}
