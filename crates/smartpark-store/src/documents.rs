//! Boundary parsing of store documents.
//!
//! The store is written by several clients (the web app, the firmware
//! bridge, older scripts), so the same document can arrive as a native
//! JSON value or as a string holding JSON, and lists sometimes arrive as
//! index-keyed maps. Everything is normalized here into one typed record
//! before business logic sees it. Unexpected shapes read as empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smartpark_core::{
    Identity, SlotCounts, SlotState,
    constants::{RESERVATIONS_FIELD, USERS_FIELD},
};
use std::collections::BTreeMap;

use crate::{Result, StoreError};

/// How the reservation list was stored, so write-backs keep the shape
/// other clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListEncoding {
    /// A string holding a JSON array (`"[\"ana\",\"juan\"]"`).
    #[default]
    JsonString,
    /// A native JSON array.
    Native,
}

/// Ordered list of identities holding an active reservation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReservationList {
    identities: Vec<Identity>,
    encoding: ListEncoding,
}

fn identity_of(item: &Value) -> Option<Identity> {
    match item {
        Value::String(key) if !key.is_empty() => Some(Identity::new(key.as_str())),
        Value::Number(n) => Some(Identity::new(n.to_string())),
        _ => None,
    }
}

impl ReservationList {
    pub fn new(identities: Vec<Identity>, encoding: ListEncoding) -> Self {
        Self {
            identities,
            encoding,
        }
    }

    /// Parse the list field. Missing or malformed values read as empty.
    pub fn parse(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Self::new(
                items.iter().filter_map(identity_of).collect(),
                ListEncoding::Native,
            ),
            Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Array(items)) => Self::new(
                    items.iter().filter_map(identity_of).collect(),
                    ListEncoding::JsonString,
                ),
                _ => Self::default(),
            },
            _ => Self::default(),
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn encoding(&self) -> ListEncoding {
        self.encoding
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Same list with every occurrence of `identity` removed.
    pub fn without(&self, identity: &Identity) -> Self {
        Self::new(
            self.identities
                .iter()
                .filter(|id| *id != identity)
                .cloned()
                .collect(),
            self.encoding,
        )
    }

    /// Encode for write-back in the shape it was read in.
    pub fn to_value(&self) -> Value {
        let items: Vec<Value> = self
            .identities
            .iter()
            .map(|id| Value::String(id.as_str().to_string()))
            .collect();
        match self.encoding {
            ListEncoding::Native => Value::Array(items),
            ListEncoding::JsonString => Value::String(Value::Array(items).to_string()),
        }
    }
}

/// The authorization root: user records keyed by identity plus the
/// reservation list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorizationRoot {
    reservations: ReservationList,
    records: Map<String, Value>,
}

impl AuthorizationRoot {
    /// Parse the root document. A missing root (`null`) is empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` when the root is neither an object
    /// nor `null`.
    pub fn parse(path: &str, doc: Value) -> Result<Self> {
        match doc {
            Value::Null => Ok(Self::default()),
            Value::Object(mut map) => {
                let reservations = ReservationList::parse(map.get(RESERVATIONS_FIELD));
                map.remove(RESERVATIONS_FIELD);
                map.remove(USERS_FIELD);
                Ok(Self {
                    reservations,
                    records: map,
                })
            }
            other => Err(StoreError::malformed(
                path,
                format!("expected an object, found {}", json_kind(&other)),
            )),
        }
    }

    pub fn reservations(&self) -> &ReservationList {
        &self.reservations
    }

    /// User record embedded in the root, if present.
    pub fn record(&self, identity: &Identity) -> Option<&Value> {
        self.records.get(identity.as_str())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn slot_of(value: &Value) -> SlotState {
    let code = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    code.and_then(|c| SlotState::from_code(c).ok())
        .unwrap_or_default()
}

/// Parse the per-slot document into exactly `num_sensors` states.
///
/// Accepts an index-keyed map (`{"0": 0, "2": 2}`) or a list. Missing
/// slots and values that are not slot codes read as `Vacant`.
pub fn parse_slots(doc: &Value, num_sensors: usize) -> Vec<SlotState> {
    match doc {
        Value::Object(map) => (0..num_sensors)
            .map(|i| map.get(&i.to_string()).map(slot_of).unwrap_or_default())
            .collect(),
        Value::Array(items) => (0..num_sensors)
            .map(|i| items.get(i).map(slot_of).unwrap_or_default())
            .collect(),
        _ => vec![SlotState::Vacant; num_sensors],
    }
}

/// Published occupancy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyDocument {
    #[serde(rename = "libres")]
    pub vacant: usize,
    #[serde(rename = "ocupados")]
    pub occupied: usize,
    #[serde(rename = "lugares")]
    pub slots: BTreeMap<String, SlotState>,
}

impl OccupancyDocument {
    pub fn from_slots(slots: &[SlotState]) -> Self {
        let counts = SlotCounts::tally(slots);
        Self {
            vacant: counts.vacant,
            occupied: counts.occupied,
            slots: slots
                .iter()
                .enumerate()
                .map(|(i, state)| (i.to_string(), *state))
                .collect(),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
