use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy state of one physical parking slot.
///
/// Serialized as its integer code (`0`, `1`, `2`), which is how both the
/// sensor controller and the remote store represent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum SlotState {
    #[default]
    Vacant = 0,
    Occupied = 1,
    Reserved = 2,
}

impl SlotState {
    /// Create a slot state from its integer code.
    ///
    /// # Errors
    /// Returns `Error::InvalidSlotState` if the value is not 0, 1, or 2.
    #[inline]
    pub fn from_code(value: i64) -> Result<Self> {
        match value {
            0 => Ok(SlotState::Vacant),
            1 => Ok(SlotState::Occupied),
            2 => Ok(SlotState::Reserved),
            _ => Err(Error::InvalidSlotState { value }),
        }
    }

    /// Convert the slot state to its integer code.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` if the slot is free.
    #[inline]
    #[must_use]
    pub fn is_vacant(self) -> bool {
        matches!(self, SlotState::Vacant)
    }

    /// Returns `true` if the slot is physically taken.
    #[inline]
    #[must_use]
    pub fn is_occupied(self) -> bool {
        matches!(self, SlotState::Occupied)
    }

    /// Returns `true` if the slot is held for a reservation.
    #[inline]
    #[must_use]
    pub fn is_reserved(self) -> bool {
        matches!(self, SlotState::Reserved)
    }
}

impl From<SlotState> for u8 {
    fn from(state: SlotState) -> Self {
        state.to_u8()
    }
}

impl TryFrom<u8> for SlotState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        SlotState::from_code(i64::from(value))
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SlotState::Vacant => write!(f, "Vacant"),
            SlotState::Occupied => write!(f, "Occupied"),
            SlotState::Reserved => write!(f, "Reserved"),
        }
    }
}

/// Identity key of a reservation holder in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Identity(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(key: &str) -> Self {
        Identity::new(key)
    }
}

impl From<String> for Identity {
    fn from(key: String) -> Self {
        Identity(key)
    }
}

/// Operator-facing failure category.
///
/// Every error is classified at its origin into one of these and reflected
/// into the status record; none of them stops the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    /// Remote store unreachable, timed out, or answered with a failure status.
    Transport,
    /// A document or line had an unexpected shape.
    MalformedData,
    /// Controller link or camera absent or closed.
    HardwareUnavailable,
    /// Plate reader missing or failing.
    RecognitionUnavailable,
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            FaultCategory::Transport => "transport",
            FaultCategory::MalformedData => "malformed-data",
            FaultCategory::HardwareUnavailable => "hardware-unavailable",
            FaultCategory::RecognitionUnavailable => "recognition-unavailable",
        };
        f.write_str(label)
    }
}

/// Aggregate slot counts published with the merged occupancy view.
///
/// Reserved slots count toward neither total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotCounts {
    pub occupied: usize,
    pub vacant: usize,
}

impl SlotCounts {
    /// Count occupied and vacant slots.
    #[must_use]
    pub fn tally(slots: &[SlotState]) -> Self {
        slots.iter().fold(SlotCounts::default(), |mut counts, slot| {
            match slot {
                SlotState::Occupied => counts.occupied += 1,
                SlotState::Vacant => counts.vacant += 1,
                SlotState::Reserved => {}
            }
            counts
        })
    }
}
