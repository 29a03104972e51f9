//! Core constants for the SmartPark access controller.
//!
//! This module centralizes the wire tokens exchanged with the gate/sensor
//! microcontroller, the semantic paths of the remote document store and the
//! default tuning values used by the engine.
//!
//! # Controller Line Protocol
//!
//! The microcontroller speaks a newline-terminated UTF-8 protocol:
//!
//! | Direction | Line | Meaning |
//! |-----------|------|---------|
//! | inbound | `ESTADO:0,1,2,0` | per-slot sensor states |
//! | inbound | `DETECTADO` | a vehicle is waiting at the gate |
//! | outbound | `ABRIR` | open the gate (cooldown-limited) |
//! | outbound | `DENEGADO` | deny entry |
//! | outbound | `RESERVA:0,0,2,0` | reserved-slot indicators |
//!
//! # Usage
//!
//! ```
//! use smartpark_core::constants::*;
//!
//! assert_eq!(OPEN_COMMAND, "ABRIR");
//! assert!("ESTADO:0,1".starts_with(STATE_PREFIX));
//!
//! use std::time::Duration;
//! let cooldown = Duration::from_millis(DEFAULT_OPEN_COOLDOWN_MS);
//! assert_eq!(cooldown.as_secs(), 3);
//! ```

// ============================================================================
// Controller Line Protocol
// ============================================================================

/// Prefix of an inbound per-slot sensor report.
///
/// # Examples
///
/// ```
/// use smartpark_core::constants::STATE_PREFIX;
///
/// let line = "ESTADO:0,1,2,0";
/// let payload = line.strip_prefix(STATE_PREFIX).unwrap();
/// assert_eq!(payload, "0,1,2,0");
/// ```
pub const STATE_PREFIX: &str = "ESTADO:";

/// Inbound sentinel sent when the presence sensor detects a vehicle.
pub const DETECTION_SENTINEL: &str = "DETECTADO";

/// Outbound command that opens the gate.
pub const OPEN_COMMAND: &str = "ABRIR";

/// Outbound command that denies entry.
pub const DENY_COMMAND: &str = "DENEGADO";

/// Prefix of the outbound reserved-slot indicator line.
pub const RESERVATION_PREFIX: &str = "RESERVA:";

/// Separator between slot values in state and reservation lines.
pub const SLOT_SEPARATOR: char = ',';

/// Line terminator appended to every outbound command.
pub const LINE_TERMINATOR: &str = "\n";

/// Longest inbound line accepted before the decoder discards it.
pub const MAX_LINE_LENGTH: usize = 1024;

// ============================================================================
// Remote Store Paths
// ============================================================================

/// Default root document holding user records and the reservation list.
pub const DEFAULT_STORE_ROOT: &str = "Estacionamiento_inteligente";

/// Field of the root document holding the active-reservations list.
pub const RESERVATIONS_FIELD: &str = "Reservas";

/// Sub-document of the root holding per-user state (arrival flags).
pub const USERS_FIELD: &str = "usuarios";

/// Per-user state document name.
pub const USER_STATE_FIELD: &str = "estado";

/// Arrival flag written when a reservation holder enters.
pub const ARRIVED_FIELD: &str = "llego";

/// Occupancy document.
pub const OCCUPANCY_DOCUMENT: &str = "estado";

/// Per-slot mapping inside the occupancy document.
pub const SLOTS_FIELD: &str = "lugares";

/// Field holding the plate inside a user record.
pub const PLATE_FIELD: &str = "Plate";

/// Legacy spelling of [`PLATE_FIELD`] still found in older records.
pub const LEGACY_PLATE_FIELD: &str = "Patente";

// ============================================================================
// Engine Defaults
// ============================================================================

/// Number of physical slots reported by the sensor controller.
pub const DEFAULT_NUM_SENSORS: usize = 4;

/// Minimum OCR confidence for a candidate to be checked against reservations.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.60;

/// Minimum interval between two `ABRIR` commands in milliseconds.
pub const DEFAULT_OPEN_COOLDOWN_MS: u64 = 3000;

/// Delay between the detection sentinel and the OCR frame capture.
pub const DEFAULT_STABILIZATION_DELAY_MS: u64 = 300;

/// Pause between two recognition loop iterations (~30 fps).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// Period of the remote slot-cache poll.
pub const DEFAULT_RESERVATION_POLL_MS: u64 = 1000;

/// Bounded wait for the loop task when stopping.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 2000;

/// Timeout applied to every remote store request.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

/// Capacity of the operator log buffer.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Concurrent detached jobs (state uploads, arrival marks).
pub const DEFAULT_MAX_BACKGROUND_TASKS: usize = 16;

/// Serial baud rate of the microcontroller.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Time the microcontroller needs to reboot after the port is opened.
pub const DEFAULT_SERIAL_SETTLE_MS: u64 = 2000;
