//! Status & log aggregator.
//!
//! [`StatusBoard`] holds the operator-facing status record and a bounded
//! log buffer. Each has its own lock, readers get copies, and every log
//! entry is also emitted as a `tracing` event at the same level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartpark_core::FaultCategory;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::lifecycle::LoopState;

/// Severity of an operator log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One timestamped operator log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Snapshot of the station status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub state: LoopState,
    pub hardware_connected: bool,
    pub camera_connected: bool,
    pub ocr_ready: bool,
    pub recognition_active: bool,
    pub store_reachable: bool,
    pub last_plate: Option<String>,
    pub last_error: Option<String>,
    pub last_fault: Option<FaultCategory>,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            state: LoopState::Stopped,
            hardware_connected: false,
            camera_connected: false,
            ocr_ready: false,
            recognition_active: false,
            store_reachable: true,
            last_plate: None,
            last_error: None,
            last_fault: None,
        }
    }
}

/// Partial status change. Fields left as `None` are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub state: Option<LoopState>,
    pub hardware_connected: Option<bool>,
    pub camera_connected: Option<bool>,
    pub ocr_ready: Option<bool>,
    pub recognition_active: Option<bool>,
    pub store_reachable: Option<bool>,
    pub last_plate: Option<String>,
    pub last_error: Option<Option<String>>,
}

impl StatusUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: LoopState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn hardware_connected(mut self, connected: bool) -> Self {
        self.hardware_connected = Some(connected);
        self
    }

    pub fn camera_connected(mut self, connected: bool) -> Self {
        self.camera_connected = Some(connected);
        self
    }

    pub fn ocr_ready(mut self, ready: bool) -> Self {
        self.ocr_ready = Some(ready);
        self
    }

    pub fn recognition_active(mut self, active: bool) -> Self {
        self.recognition_active = Some(active);
        self
    }

    pub fn store_reachable(mut self, reachable: bool) -> Self {
        self.store_reachable = Some(reachable);
        self
    }

    pub fn last_plate(mut self, plate: impl Into<String>) -> Self {
        self.last_plate = Some(plate.into());
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.last_error = Some(None);
        self
    }

    fn apply(self, status: &mut SystemStatus) {
        if let Some(state) = self.state {
            status.state = state;
        }
        if let Some(v) = self.hardware_connected {
            status.hardware_connected = v;
        }
        if let Some(v) = self.camera_connected {
            status.camera_connected = v;
        }
        if let Some(v) = self.ocr_ready {
            status.ocr_ready = v;
        }
        if let Some(v) = self.recognition_active {
            status.recognition_active = v;
        }
        if let Some(v) = self.store_reachable {
            status.store_reachable = v;
        }
        if let Some(plate) = self.last_plate {
            status.last_plate = Some(plate);
        }
        if let Some(error) = self.last_error {
            if error.is_none() {
                status.last_fault = None;
            }
            status.last_error = error;
        }
    }
}

/// Shared status record plus bounded operator log.
#[derive(Debug)]
pub struct StatusBoard {
    status: Mutex<SystemStatus>,
    logs: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StatusBoard {
    pub fn new(capacity: usize) -> Self {
        Self {
            status: Mutex::new(SystemStatus::default()),
            logs: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    fn push(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!(target: "smartpark::station", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "smartpark::station", "{message}"),
            LogLevel::Error => tracing::error!(target: "smartpark::station", "{message}"),
        }
        if self.capacity == 0 {
            return;
        }
        let mut logs = relock(&self.logs);
        while logs.len() >= self.capacity {
            logs.pop_front();
        }
        logs.push_back(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    /// Log a classified failure and record it as the last error.
    ///
    /// A transport fault also marks the remote store unreachable.
    pub fn fault(&self, category: FaultCategory, message: impl Into<String>) {
        let message = message.into();
        self.push(LogLevel::Error, format!("{category}: {message}"));
        let mut status = relock(&self.status);
        status.last_error = Some(message);
        status.last_fault = Some(category);
        if category == FaultCategory::Transport {
            status.store_reachable = false;
        }
    }

    /// Merge a partial update into the status record.
    pub fn update(&self, update: StatusUpdate) {
        update.apply(&mut relock(&self.status));
    }

    /// Return every flag to its initial value, keeping the lifecycle state.
    pub fn reset(&self) {
        let mut status = relock(&self.status);
        let state = status.state;
        *status = SystemStatus {
            state,
            ..SystemStatus::default()
        };
    }

    pub fn snapshot(&self) -> SystemStatus {
        relock(&self.status).clone()
    }

    /// Log entries, oldest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        relock(&self.logs).iter().cloned().collect()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(smartpark_core::constants::DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_buffer_evicts_oldest() {
        let board = StatusBoard::new(3);
        for i in 0..5 {
            board.info(format!("entry {i}"));
        }
        let messages: Vec<String> = board.logs().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let board = StatusBoard::new(0);
        board.warn("dropped");
        assert!(board.logs().is_empty());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let board = StatusBoard::default();
        board.update(StatusUpdate::new().camera_connected(true));
        board.update(StatusUpdate::new().hardware_connected(true).last_plate("XY999ZZ"));

        let status = board.snapshot();
        assert!(status.camera_connected);
        assert!(status.hardware_connected);
        assert_eq!(status.last_plate.as_deref(), Some("XY999ZZ"));
        assert!(!status.ocr_ready);
    }

    #[test]
    fn test_fault_records_category() {
        let board = StatusBoard::default();
        board.fault(FaultCategory::Transport, "store timed out");

        let status = board.snapshot();
        assert!(!status.store_reachable);
        assert_eq!(status.last_fault, Some(FaultCategory::Transport));
        assert_eq!(status.last_error.as_deref(), Some("store timed out"));

        let entry = board.logs().pop().unwrap();
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.message, "transport: store timed out");

        board.update(StatusUpdate::new().clear_error());
        assert_eq!(board.snapshot().last_fault, None);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let board = StatusBoard::default();
        let mut snapshot = board.snapshot();
        snapshot.hardware_connected = true;
        assert!(!board.snapshot().hardware_connected);
    }

    #[test]
    fn test_reset_keeps_state() {
        let board = StatusBoard::default();
        board.update(
            StatusUpdate::new()
                .state(LoopState::Stopping)
                .recognition_active(true),
        );
        board.reset();
        let status = board.snapshot();
        assert_eq!(status.state, LoopState::Stopping);
        assert!(!status.recognition_active);
    }

    #[test]
    fn test_entry_display() {
        let entry = LogEntry {
            timestamp: DateTime::parse_from_rfc3339("2025-03-01T14:05:09Z")
                .unwrap()
                .with_timezone(&Utc),
            level: LogLevel::Info,
            message: "Gate opened".into(),
        };
        assert_eq!(entry.to_string(), "[14:05:09] Gate opened");
    }
}
