use serde::{Deserialize, Serialize};
use smartpark_core::{
    Error, Result, SlotState,
    constants::{DENY_COMMAND, OPEN_COMMAND, RESERVATION_PREFIX, SLOT_SEPARATOR},
};
use std::fmt;
use std::str::FromStr;

use crate::parser::parse_slot_list;

/// Line received from the gate/sensor microcontroller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerMessage {
    /// `ESTADO:<int,...>` per-slot sensor report.
    SlotStates(Vec<SlotState>),
    /// `DETECTADO` presence sentinel.
    VehicleDetected,
    /// Any other well-formed line (debug output from the firmware).
    Other(String),
    /// A line that could not be decoded. The stream keeps going.
    Malformed { line: String, reason: String },
}

impl ControllerMessage {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerMessage::SlotStates(_) => "slot_states",
            ControllerMessage::VehicleDetected => "vehicle_detected",
            ControllerMessage::Other(_) => "other",
            ControllerMessage::Malformed { .. } => "malformed",
        }
    }
}

/// Command written to the microcontroller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateCommand {
    /// `ABRIR`, subject to the open cooldown.
    Open,
    /// `DENEGADO`.
    Deny,
    /// `RESERVA:<int,...>` reserved-slot indicators.
    Reservations(Vec<SlotState>),
    /// Free-form single line.
    Custom(String),
}

impl GateCommand {
    /// Wire text without the line terminator.
    ///
    /// ```
    /// use smartpark_core::SlotState;
    /// use smartpark_protocol::GateCommand;
    ///
    /// assert_eq!(GateCommand::Open.as_line(), "ABRIR");
    /// let cmd = GateCommand::Reservations(vec![SlotState::Vacant, SlotState::Reserved]);
    /// assert_eq!(cmd.as_line(), "RESERVA:0,2");
    /// ```
    pub fn as_line(&self) -> String {
        match self {
            GateCommand::Open => OPEN_COMMAND.to_string(),
            GateCommand::Deny => DENY_COMMAND.to_string(),
            GateCommand::Reservations(slots) => {
                let values: Vec<String> = slots.iter().map(|s| s.to_u8().to_string()).collect();
                format!(
                    "{}{}",
                    RESERVATION_PREFIX,
                    values.join(&SLOT_SEPARATOR.to_string())
                )
            }
            GateCommand::Custom(text) => text.clone(),
        }
    }

    /// Returns `true` for the cooldown-limited open command.
    pub fn is_open(&self) -> bool {
        matches!(self, GateCommand::Open)
    }
}

impl fmt::Display for GateCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_line())
    }
}

impl FromStr for GateCommand {
    type Err = Error;

    /// Parse operator text into a command. Matching of the fixed commands is
    /// case-insensitive; anything else becomes [`GateCommand::Custom`].
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() || text.chars().any(char::is_control) {
            return Err(Error::InvalidMessageFormat {
                message: format!("invalid command text: {:?}", s),
            });
        }

        if text.eq_ignore_ascii_case(OPEN_COMMAND) {
            return Ok(GateCommand::Open);
        }
        if text.eq_ignore_ascii_case(DENY_COMMAND) {
            return Ok(GateCommand::Deny);
        }

        let prefix_len = RESERVATION_PREFIX.len();
        if text.len() >= prefix_len
            && text.is_char_boundary(prefix_len)
            && text[..prefix_len].eq_ignore_ascii_case(RESERVATION_PREFIX)
        {
            return Ok(GateCommand::Reservations(parse_slot_list(
                &text[prefix_len..],
            )?));
        }

        Ok(GateCommand::Custom(text.to_string()))
    }
}
