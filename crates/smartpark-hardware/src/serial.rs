//! Serial link to the gate/sensor microcontroller.
//!
//! The port is opened once and split in two: a dedicated reader thread
//! decodes inbound lines with [`ControllerCodec`] and forwards them over a
//! channel, while [`SerialCommandWriter`] owns the write half. Both halves
//! use blocking `serialport` I/O, so writes are moved onto the blocking
//! pool.

use bytes::BytesMut;
use serialport::SerialPort;
use smartpark_protocol::{ControllerCodec, ControllerMessage, GateCommand};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, info, warn};

use crate::{
    HardwareError, Result,
    config::SerialConfig,
    controller::{ControllerLink, EVENT_BUFFER},
    devices::AnyCommandWriter,
    traits::CommandWriter,
    types::DeviceInfo,
};

const READ_CHUNK: usize = 256;

/// Open the serial port and start its reader thread.
///
/// Blocks for the configured settle delay while the board resets, so call
/// it from a blocking context.
///
/// # Errors
///
/// Returns `HardwareError::InitializationFailed` if the port cannot be
/// opened or split.
pub fn open_serial(config: &SerialConfig) -> Result<ControllerLink> {
    let port = serialport::new(&config.port, config.baud_rate)
        .timeout(config.read_timeout)
        .open()
        .map_err(|e| HardwareError::initialization_failed(format!("{}: {}", config.port, e)))?;

    if !config.settle_delay.is_zero() {
        thread::sleep(config.settle_delay);
    }

    let reader = port
        .try_clone()
        .map_err(|e| HardwareError::initialization_failed(format!("{}: {}", config.port, e)))?;

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    spawn_reader(reader, tx, config.port.clone())?;

    let info = DeviceInfo::new(config.port.clone(), "Serial Controller")
        .with_endpoint(format!("{}@{}", config.port, config.baud_rate));
    info!(port = %config.port, baud = config.baud_rate, "controller link open");

    let writer = SerialCommandWriter {
        port: Arc::new(Mutex::new(port)),
        info: info.clone(),
    };
    Ok(ControllerLink::new(
        AnyCommandWriter::Serial(writer),
        rx,
        info,
    ))
}

fn spawn_reader(
    mut port: Box<dyn SerialPort>,
    tx: mpsc::Sender<ControllerMessage>,
    name: String,
) -> Result<()> {
    thread::Builder::new()
        .name("serial-reader".to_string())
        .spawn(move || {
            let mut codec = ControllerCodec::new();
            let mut buf = BytesMut::with_capacity(READ_CHUNK);
            let mut chunk = [0u8; READ_CHUNK];

            'read: while !tx.is_closed() {
                match port.read(&mut chunk) {
                    Ok(0) => {
                        warn!(port = %name, "serial link closed by device");
                        break;
                    }
                    Ok(n) => {
                        buf.extend_from_slice(&chunk[..n]);
                        loop {
                            match codec.decode(&mut buf) {
                                Ok(Some(message)) => {
                                    if tx.blocking_send(message).is_err() {
                                        break 'read;
                                    }
                                }
                                Ok(None) => break,
                                Err(e) => {
                                    warn!(port = %name, error = %e, "serial decode failed");
                                    break 'read;
                                }
                            }
                        }
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                        ) => {}
                    Err(e) => {
                        warn!(port = %name, error = %e, "serial read failed");
                        break;
                    }
                }
            }
            debug!(port = %name, "serial reader stopped");
        })
        .map_err(|e| HardwareError::initialization_failed(format!("reader thread: {}", e)))?;
    Ok(())
}

/// Write half of a serial controller link.
pub struct SerialCommandWriter {
    port: Arc<Mutex<Box<dyn SerialPort>>>,
    info: DeviceInfo,
}

impl std::fmt::Debug for SerialCommandWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialCommandWriter")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl CommandWriter for SerialCommandWriter {
    async fn write_command(&mut self, command: &GateCommand) -> Result<()> {
        let mut line = BytesMut::new();
        ControllerCodec::new()
            .encode(command.clone(), &mut line)
            .map_err(|e| HardwareError::invalid_data(e.to_string()))?;

        let port = Arc::clone(&self.port);
        let device = self.info.name.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut port = port
                .lock()
                .map_err(|_| HardwareError::disconnected(device))?;
            port.write_all(&line)?;
            port.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| HardwareError::communication(e.to_string()))?
    }

    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }
}
