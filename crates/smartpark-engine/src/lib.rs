//! Plate authorization and occupancy engine of the SmartPark station.
//!
//! Components, leaf first:
//!
//! - [`status::StatusBoard`]: status record and bounded operator log
//! - [`resolver::AuthorizationResolver`]: plate → reservation holder,
//!   consuming the reservation
//! - [`gate::CommandGate`]: serialized controller writes with the open
//!   cooldown
//! - [`occupancy::OccupancyReconciler`]: sensor/remote/cache merge and
//!   publication
//! - [`recognition`]: the loop task and the reservation poll
//! - [`ParkingStation`]: the facade tying them together
//!
//! No operation returns an error to the caller. Failures are classified,
//! logged and reflected in [`SystemStatus`]; access decisions fail closed.

pub mod access;
pub mod config;
pub mod gate;
pub mod lifecycle;
pub mod occupancy;
pub mod recognition;
pub mod resolver;
pub mod station;
pub mod status;
pub mod tasks;

pub use access::{AccessEvaluator, AccessResult, AccessStatus};
pub use config::StationConfig;
pub use gate::{CommandGate, GateOutcome};
pub use lifecycle::{Lifecycle, LoopState};
pub use occupancy::{OccupancyReconciler, merge_slot, merge_slots};
pub use resolver::AuthorizationResolver;
pub use station::{ControlOutcome, ParkingStation};
pub use status::{LogEntry, LogLevel, StatusBoard, StatusUpdate, SystemStatus};
pub use tasks::BackgroundTasks;
