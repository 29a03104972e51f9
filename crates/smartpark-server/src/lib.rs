//! HTTP serving layer for the SmartPark station.
//!
//! A thin axum surface over [`smartpark_engine::ParkingStation`]: start and
//! stop recognition, read the status and the log buffer, watch the camera
//! and enter plates by hand. The binary in `main.rs` wires the station to
//! the configured devices and remote store.

pub mod config;
pub mod routes;
pub mod video;

pub use config::ServerConfig;
pub use routes::{AppState, router};
