//! Command gate.
//!
//! Every outbound line to the controller passes through one async lock
//! held across the cooldown check, the write and the flush, so concurrent
//! callers never interleave bytes on the link. Open commands inside the
//! cooldown window are dropped without touching the link.

use smartpark_core::FaultCategory;
use smartpark_hardware::{AnyCommandWriter, CommandWriter};
use smartpark_protocol::GateCommand;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::status::{StatusBoard, StatusUpdate};

/// What happened to a command handed to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Written and flushed.
    Sent,
    /// Open command inside the cooldown window.
    Suppressed,
    /// No link, or the write failed.
    Unavailable,
    /// Text that is not a sendable command.
    Rejected,
}

#[derive(Debug, Default)]
struct GateState {
    writer: Option<AnyCommandWriter>,
    last_open: Option<Instant>,
}

/// Serializes commands to the controller link.
#[derive(Debug)]
pub struct CommandGate {
    state: Mutex<GateState>,
    cooldown: Duration,
    status: Arc<StatusBoard>,
}

impl CommandGate {
    pub fn new(cooldown: Duration, status: Arc<StatusBoard>) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            cooldown,
            status,
        }
    }

    /// Install the write half of a freshly opened link.
    pub async fn attach(&self, writer: AnyCommandWriter) {
        self.state.lock().await.writer = Some(writer);
    }

    /// Take the writer out, closing the gate.
    pub async fn detach(&self) -> Option<AnyCommandWriter> {
        self.state.lock().await.writer.take()
    }

    pub async fn is_attached(&self) -> bool {
        self.state.lock().await.writer.is_some()
    }

    /// Send a raw command line such as `"abrir"`.
    pub async fn send(&self, command: &str) -> GateOutcome {
        match command.parse::<GateCommand>() {
            Ok(command) => self.send_command(&command).await,
            Err(e) => {
                self.status
                    .warn(format!("Command {command:?} not sent: {e}"));
                GateOutcome::Rejected
            }
        }
    }

    pub async fn open(&self) -> GateOutcome {
        self.send_command(&GateCommand::Open).await
    }

    pub async fn deny(&self) -> GateOutcome {
        self.send_command(&GateCommand::Deny).await
    }

    pub async fn send_command(&self, command: &GateCommand) -> GateOutcome {
        let mut state = self.state.lock().await;

        if command.is_open() {
            let now = Instant::now();
            if let Some(last) = state.last_open {
                let elapsed = now.duration_since(last);
                if elapsed < self.cooldown {
                    self.status.info(format!(
                        "Open suppressed, last open {}ms ago",
                        elapsed.as_millis()
                    ));
                    return GateOutcome::Suppressed;
                }
            }
            state.last_open = Some(now);
        }

        let Some(writer) = state.writer.as_mut() else {
            self.status
                .warn(format!("No controller link, {command} not sent"));
            self.status
                .update(StatusUpdate::new().hardware_connected(false));
            return GateOutcome::Unavailable;
        };

        match writer.write_command(command).await {
            Ok(()) => {
                self.status.info(format!("Command sent: {command}"));
                GateOutcome::Sent
            }
            Err(e) => {
                state.writer = None;
                self.status.fault(
                    FaultCategory::HardwareUnavailable,
                    format!("writing {command} failed: {e}"),
                );
                self.status
                    .update(StatusUpdate::new().hardware_connected(false));
                GateOutcome::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpark_core::SlotState;
    use smartpark_hardware::mock::MockControllerHandle;

    async fn gate_with_mock(cooldown_ms: u64) -> (CommandGate, MockControllerHandle) {
        let handle = MockControllerHandle::new();
        let (writer, _events) = handle.open_link().into_parts();
        let gate = CommandGate::new(
            Duration::from_millis(cooldown_ms),
            Arc::new(StatusBoard::default()),
        );
        gate.attach(writer).await;
        (gate, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_cooldown() {
        let (gate, handle) = gate_with_mock(3000).await;

        assert_eq!(gate.open().await, GateOutcome::Sent);
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(gate.open().await, GateOutcome::Suppressed);
        assert_eq!(handle.sent_commands(), vec!["ABRIR"]);

        tokio::time::advance(Duration::from_millis(2001)).await;
        assert_eq!(gate.open().await, GateOutcome::Sent);
        assert_eq!(handle.sent_commands(), vec!["ABRIR", "ABRIR"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deny_has_no_cooldown() {
        let (gate, handle) = gate_with_mock(3000).await;
        assert_eq!(gate.open().await, GateOutcome::Sent);
        assert_eq!(gate.deny().await, GateOutcome::Sent);
        assert_eq!(gate.deny().await, GateOutcome::Sent);
        assert_eq!(handle.sent_commands(), vec!["ABRIR", "DENEGADO", "DENEGADO"]);
    }

    #[tokio::test]
    async fn test_raw_commands_are_case_insensitive() {
        let (gate, handle) = gate_with_mock(3000).await;
        assert_eq!(gate.send("abrir").await, GateOutcome::Sent);
        assert_eq!(gate.send(" Abrir ").await, GateOutcome::Suppressed);
        assert_eq!(gate.send("").await, GateOutcome::Rejected);
        gate.send_command(&GateCommand::Reservations(vec![
            SlotState::Vacant,
            SlotState::Reserved,
        ]))
        .await;
        assert_eq!(handle.sent_commands(), vec!["ABRIR", "RESERVA:0,2"]);
    }

    #[tokio::test]
    async fn test_missing_link_marks_hardware_down() {
        let status = Arc::new(StatusBoard::default());
        status.update(StatusUpdate::new().hardware_connected(true));
        let gate = CommandGate::new(Duration::from_secs(3), Arc::clone(&status));

        assert_eq!(gate.deny().await, GateOutcome::Unavailable);
        assert!(!status.snapshot().hardware_connected);
    }

    #[tokio::test]
    async fn test_write_failure_drops_writer() {
        let (gate, handle) = gate_with_mock(0).await;
        handle.disconnect();

        assert_eq!(gate.deny().await, GateOutcome::Unavailable);
        assert!(!gate.is_attached().await);
        assert_eq!(gate.deny().await, GateOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_concurrent_sends_are_serialized() {
        let (gate, handle) = gate_with_mock(3000).await;
        let gate = Arc::new(gate);
        let mut joins = Vec::new();
        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            joins.push(tokio::spawn(async move { gate.open().await }));
        }
        let mut sent = 0;
        for join in joins {
            if join.await.unwrap() == GateOutcome::Sent {
                sent += 1;
            }
        }
        assert_eq!(sent, 1);
        assert_eq!(handle.sent_commands(), vec!["ABRIR"]);
    }
}
