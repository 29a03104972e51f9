//! Inbound line parser for the gate/sensor microcontroller.
//!
//! # Line Format
//!
//! ```text
//! ESTADO:0,1,2,0
//! DETECTADO
//! ```
//!
//! Prefixes are matched exactly (the firmware always sends uppercase).
//! Leading and trailing whitespace, including a `\r` left by CRLF
//! terminators, is ignored.
//!
//! # Examples
//!
//! ```
//! use smartpark_core::SlotState;
//! use smartpark_protocol::{ControllerMessage, LineParser};
//!
//! let msg = LineParser::parse("ESTADO:0,1,2,0\r").unwrap();
//! assert_eq!(
//!     msg,
//!     ControllerMessage::SlotStates(vec![
//!         SlotState::Vacant,
//!         SlotState::Occupied,
//!         SlotState::Reserved,
//!         SlotState::Vacant,
//!     ])
//! );
//!
//! assert_eq!(LineParser::parse("DETECTADO").unwrap(), ControllerMessage::VehicleDetected);
//! assert!(LineParser::parse("ESTADO:1,x").is_err());
//! ```

use crate::message::ControllerMessage;
use smartpark_core::{
    Error, Result, SlotState,
    constants::{DETECTION_SENTINEL, SLOT_SEPARATOR, STATE_PREFIX},
};

/// Parser for controller lines.
pub struct LineParser;

impl LineParser {
    /// Parse one line (terminator optional) into a [`ControllerMessage`].
    ///
    /// # Errors
    ///
    /// - `Error::InvalidMessageFormat` for an empty line or a non-integer slot value
    /// - `Error::InvalidSlotState` for an integer outside 0..=2
    pub fn parse(line: &str) -> Result<ControllerMessage> {
        let line = line.trim();
        if line.is_empty() {
            return Err(Error::InvalidMessageFormat {
                message: "empty line".to_string(),
            });
        }

        if let Some(payload) = line.strip_prefix(STATE_PREFIX) {
            return parse_slot_list(payload).map(ControllerMessage::SlotStates);
        }

        if line == DETECTION_SENTINEL {
            return Ok(ControllerMessage::VehicleDetected);
        }

        Ok(ControllerMessage::Other(line.to_string()))
    }
}

/// Parse a comma-separated list of slot codes (`0,1,2`).
pub fn parse_slot_list(payload: &str) -> Result<Vec<SlotState>> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(Error::InvalidMessageFormat {
            message: "empty slot list".to_string(),
        });
    }

    payload
        .split(SLOT_SEPARATOR)
        .map(|raw| {
            let raw = raw.trim();
            let code: i64 = raw.parse().map_err(|_| Error::InvalidMessageFormat {
                message: format!("invalid slot value: {:?}", raw),
            })?;
            SlotState::from_code(code)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_state_line() {
        let msg = LineParser::parse("ESTADO:1,1,0,0").unwrap();
        match msg {
            ControllerMessage::SlotStates(slots) => {
                assert_eq!(slots.len(), 4);
                assert!(slots[0].is_occupied());
                assert!(slots[3].is_vacant());
            }
            other => panic!("Expected SlotStates, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_state_line_with_spaces() {
        let msg = LineParser::parse("  ESTADO: 0 , 2 ").unwrap();
        assert_eq!(
            msg,
            ControllerMessage::SlotStates(vec![SlotState::Vacant, SlotState::Reserved])
        );
    }

    #[test]
    fn test_parse_detection() {
        assert_eq!(
            LineParser::parse("DETECTADO\r\n").unwrap(),
            ControllerMessage::VehicleDetected
        );
    }

    #[test]
    fn test_parse_other_line() {
        assert_eq!(
            LineParser::parse("Servo listo").unwrap(),
            ControllerMessage::Other("Servo listo".to_string())
        );
        // Prefix matching is exact-case.
        assert_eq!(
            LineParser::parse("detectado").unwrap(),
            ControllerMessage::Other("detectado".to_string())
        );
    }

    #[rstest]
    #[case("")]
    #[case("\r")]
    #[case("ESTADO:")]
    #[case("ESTADO:1,,0")]
    #[case("ESTADO:a,b")]
    fn test_parse_invalid_format(#[case] input: &str) {
        assert!(matches!(
            LineParser::parse(input),
            Err(Error::InvalidMessageFormat { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_slot_code() {
        assert!(matches!(
            LineParser::parse("ESTADO:0,3"),
            Err(Error::InvalidSlotState { value: 3 })
        ));
    }
}
