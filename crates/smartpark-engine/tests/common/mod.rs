//! Shared station harness for integration tests.

#![allow(dead_code)]

use serde_json::Value;
use smartpark_engine::{ParkingStation, StationConfig};
use smartpark_hardware::MockDevices;
use smartpark_hardware::mock::{MockCameraHandle, MockControllerHandle, MockPlateReaderHandle};
use smartpark_store::MemoryStore;
use std::time::Duration;
use tokio::time::Instant;

pub const ROOT: &str = "Estacionamiento_inteligente";

pub struct Harness {
    pub station: ParkingStation,
    pub controller: MockControllerHandle,
    pub camera: MockCameraHandle,
    pub ocr: MockPlateReaderHandle,
    pub store: MemoryStore,
}

/// Fast timings so tests finish quickly.
pub fn test_config() -> StationConfig {
    StationConfig::default()
        .with_frame_interval(Duration::from_millis(5))
        .with_stabilization_delay(Duration::from_millis(10))
        .with_reservation_poll_interval(Duration::from_millis(20))
        .with_join_timeout(Duration::from_secs(1))
}

pub fn harness(tree: Value) -> Harness {
    harness_with(tree, |devices, controller, camera, ocr| {
        devices
            .with_controller(controller.clone())
            .with_camera(camera.clone())
            .with_plate_reader(ocr.clone())
    })
}

pub fn harness_with<F>(tree: Value, select: F) -> Harness
where
    F: FnOnce(
        MockDevices,
        &MockControllerHandle,
        &MockCameraHandle,
        &MockPlateReaderHandle,
    ) -> MockDevices,
{
    let controller = MockControllerHandle::new();
    let camera = MockCameraHandle::new();
    let ocr = MockPlateReaderHandle::new();
    let store = MemoryStore::with_tree(tree);
    let devices = select(MockDevices::new(), &controller, &camera, &ocr);
    let station = ParkingStation::new(test_config(), store.clone(), devices);
    Harness {
        station,
        controller,
        camera,
        ocr,
        store,
    }
}

/// Poll `check` until it holds, panicking after a few seconds.
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Gate commands sent to the controller, without reservation pushes.
pub fn gate_commands(controller: &MockControllerHandle) -> Vec<String> {
    controller
        .sent_commands()
        .into_iter()
        .filter(|line| !line.starts_with("RESERVA:"))
        .collect()
}

pub fn reservation_pushes(controller: &MockControllerHandle) -> Vec<String> {
    controller
        .sent_commands()
        .into_iter()
        .filter(|line| line.starts_with("RESERVA:"))
        .collect()
}
