use smartpark_protocol::ControllerMessage;
use tokio::sync::mpsc;

use crate::{devices::AnyCommandWriter, types::DeviceInfo};

/// Capacity of the inbound message channel of a controller link.
pub(crate) const EVENT_BUFFER: usize = 64;

/// An open link to the gate/sensor microcontroller.
///
/// Inbound lines arrive on `events` in the order the device sent them. The
/// channel closes when the device goes away.
#[derive(Debug)]
pub struct ControllerLink {
    writer: AnyCommandWriter,
    events: mpsc::Receiver<ControllerMessage>,
    info: DeviceInfo,
}

impl ControllerLink {
    pub fn new(
        writer: AnyCommandWriter,
        events: mpsc::Receiver<ControllerMessage>,
        info: DeviceInfo,
    ) -> Self {
        Self {
            writer,
            events,
            info,
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Split into the write half and the inbound message stream.
    pub fn into_parts(self) -> (AnyCommandWriter, mpsc::Receiver<ControllerMessage>) {
        (self.writer, self.events)
    }
}
