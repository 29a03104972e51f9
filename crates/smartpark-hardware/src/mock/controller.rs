//! Mock gate/sensor controller.
//!
//! A [`MockControllerHandle`] plays the microcontroller. Every call to
//! [`MockControllerHandle::open_link`] produces a fresh [`ControllerLink`]
//! (the way reopening a serial port does), and the handle keeps driving
//! whichever link is current.

use smartpark_protocol::{ControllerMessage, GateCommand, LineParser};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    controller::{ControllerLink, EVENT_BUFFER},
    devices::AnyCommandWriter,
    traits::CommandWriter,
    types::DeviceInfo,
};

const DEVICE_NAME: &str = "Mock Controller";

#[derive(Debug, Default)]
struct ControllerState {
    events_tx: Option<mpsc::Sender<ControllerMessage>>,
    sent: Vec<String>,
    connected: bool,
    opened: usize,
}

/// Test-side handle of a mock controller.
///
/// # Examples
///
/// ```
/// use smartpark_hardware::mock::MockControllerHandle;
/// use smartpark_hardware::traits::CommandWriter;
/// use smartpark_protocol::{ControllerMessage, GateCommand};
///
/// #[tokio::main]
/// async fn main() -> smartpark_hardware::Result<()> {
///     let handle = MockControllerHandle::new();
///     let (mut writer, mut events) = handle.open_link().into_parts();
///
///     handle.send_line("DETECTADO").await?;
///     assert_eq!(events.recv().await, Some(ControllerMessage::VehicleDetected));
///
///     writer.write_command(&GateCommand::Open).await?;
///     assert_eq!(handle.sent_commands(), vec!["ABRIR"]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockControllerHandle {
    state: Arc<Mutex<ControllerState>>,
}

impl MockControllerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a new link, replacing (and closing) any previous one.
    pub fn open_link(&self) -> ControllerLink {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        {
            let mut state = self.lock();
            state.events_tx = Some(tx);
            state.connected = true;
            state.opened += 1;
        }
        let writer = MockCommandWriter {
            state: Arc::clone(&self.state),
        };
        ControllerLink::new(
            AnyCommandWriter::Mock(writer),
            rx,
            DeviceInfo::new(DEVICE_NAME, "Mock Controller v1.0"),
        )
    }

    /// Deliver one raw line as the device would send it.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if no link is open or the host
    /// dropped its receiver.
    pub async fn send_line(&self, line: &str) -> Result<()> {
        let message = match LineParser::parse(line) {
            Ok(message) => message,
            Err(e) => ControllerMessage::Malformed {
                line: line.trim().to_string(),
                reason: e.to_string(),
            },
        };
        self.send_message(message).await
    }

    /// Deliver an already-decoded message.
    pub async fn send_message(&self, message: ControllerMessage) -> Result<()> {
        let tx = self
            .lock()
            .events_tx
            .clone()
            .ok_or_else(|| HardwareError::disconnected(DEVICE_NAME))?;
        tx.send(message)
            .await
            .map_err(|_| HardwareError::disconnected(DEVICE_NAME))
    }

    /// Simulate unplugging: pending writes fail and the inbound stream ends.
    pub fn disconnect(&self) {
        let mut state = self.lock();
        state.connected = false;
        state.events_tx = None;
    }

    /// Lines written by the host, oldest first, without terminators.
    pub fn sent_commands(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }

    /// Number of links opened so far.
    pub fn open_count(&self) -> usize {
        self.lock().opened
    }

    /// Returns `true` while the host's receiver for the current link is alive.
    pub fn is_link_alive(&self) -> bool {
        self.lock()
            .events_tx
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

/// Write half of a mock controller link.
#[derive(Debug)]
pub struct MockCommandWriter {
    state: Arc<Mutex<ControllerState>>,
}

impl CommandWriter for MockCommandWriter {
    async fn write_command(&mut self, command: &GateCommand) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !state.connected {
            return Err(HardwareError::disconnected(DEVICE_NAME));
        }
        state.sent.push(command.as_line());
        Ok(())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(DEVICE_NAME, "Mock Controller v1.0")
    }
}
