//! The parking station facade.
//!
//! [`ParkingStation`] wires the resolver, gate, reconciler and status
//! board together and exposes the operations the serving layer calls.
//! Start and stop are serialized by one async lock; every other
//! operation works while the loop is running or stopped.

use bytes::Bytes;
use smartpark_core::SlotState;
use smartpark_hardware::{
    AnyCamera, AnyPlateReader, ControllerLink, DeviceSource, HardwareError, placeholder_jpeg,
};
use smartpark_store::{AnyStore, StorePaths};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::access::{AccessEvaluator, AccessResult};
use crate::config::StationConfig;
use crate::gate::CommandGate;
use crate::lifecycle::{Lifecycle, LoopState};
use crate::occupancy::OccupancyReconciler;
use crate::recognition::{FrameSlot, RecognitionLoop, ReservationPoll};
use crate::resolver::AuthorizationResolver;
use crate::status::{LogEntry, StatusBoard, StatusUpdate, SystemStatus};
use crate::tasks::BackgroundTasks;

/// Result of a start or stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The lifecycle changed.
    Applied,
    /// Already in the requested condition; nothing happened.
    NoOp,
}

struct RunningTasks {
    running: Arc<AtomicBool>,
    recognition: JoinHandle<()>,
    poll: JoinHandle<()>,
}

#[derive(Default)]
struct Control {
    lifecycle: Lifecycle,
    tasks: Option<RunningTasks>,
}

struct Acquired {
    controller: Result<ControllerLink, HardwareError>,
    camera: Result<AnyCamera, HardwareError>,
    plate_reader: Result<AnyPlateReader, HardwareError>,
}

/// Vehicle-access station.
///
/// # Examples
///
/// ```
/// use smartpark_engine::{ControlOutcome, ParkingStation, StationConfig};
/// use smartpark_hardware::MockDevices;
/// use smartpark_store::MemoryStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let station = ParkingStation::new(
///     StationConfig::default(),
///     MemoryStore::new(),
///     MockDevices::new(),
/// );
///
/// assert_eq!(station.start().await, ControlOutcome::Applied);
/// assert_eq!(station.start().await, ControlOutcome::NoOp);
/// assert_eq!(station.stop().await, ControlOutcome::Applied);
/// # }
/// ```
pub struct ParkingStation {
    config: StationConfig,
    devices: Arc<dyn DeviceSource>,
    status: Arc<StatusBoard>,
    gate: Arc<CommandGate>,
    occupancy: Arc<OccupancyReconciler>,
    evaluator: AccessEvaluator,
    tasks: BackgroundTasks,
    frame: Arc<FrameSlot>,
    control: Mutex<Control>,
}

impl ParkingStation {
    pub fn new<S, D>(config: StationConfig, store: S, devices: D) -> Self
    where
        S: Into<AnyStore>,
        D: DeviceSource + 'static,
    {
        let store = store.into();
        let paths = StorePaths::new(config.store_root.as_str());
        let status = Arc::new(StatusBoard::new(config.log_capacity));
        let tasks = BackgroundTasks::new(config.max_background_tasks);
        let gate = Arc::new(CommandGate::new(config.open_cooldown, Arc::clone(&status)));
        let resolver = Arc::new(AuthorizationResolver::new(
            store.clone(),
            paths.clone(),
            Arc::clone(&status),
        ));
        let occupancy = Arc::new(OccupancyReconciler::new(
            store,
            paths,
            config.num_sensors,
            Arc::clone(&status),
        ));
        let evaluator = AccessEvaluator::new(
            resolver,
            Arc::clone(&gate),
            Arc::clone(&status),
            tasks.clone(),
            config.min_confidence,
        );

        Self {
            config,
            devices: Arc::new(devices),
            status,
            gate,
            occupancy,
            evaluator,
            tasks,
            frame: Arc::new(FrameSlot::default()),
            control: Mutex::new(Control::default()),
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    fn enter(&self, control: &mut Control, state: LoopState) {
        match control.lifecycle.transition_to(state) {
            Ok(()) => self.status.update(StatusUpdate::new().state(state)),
            Err(e) => self.status.error(e.to_string()),
        }
    }

    /// Acquire devices and start the recognition loop.
    ///
    /// Each device is optional: a missing one is logged and reflected in
    /// the status, and the loop runs without it.
    pub async fn start(&self) -> ControlOutcome {
        let mut control = self.control.lock().await;
        if control.lifecycle.current_state() != LoopState::Stopped {
            self.status.info("Recognition already running");
            return ControlOutcome::NoOp;
        }
        self.enter(&mut control, LoopState::Starting);
        self.status.info("Starting recognition");

        let devices = Arc::clone(&self.devices);
        let acquired = tokio::task::spawn_blocking(move || Acquired {
            controller: devices.open_controller(),
            camera: devices.open_camera(),
            plate_reader: devices.open_plate_reader(),
        })
        .await
        .unwrap_or_else(|e| {
            let failed =
                || HardwareError::initialization_failed(format!("device setup panicked: {e}"));
            Acquired {
                controller: Err(failed()),
                camera: Err(failed()),
                plate_reader: Err(failed()),
            }
        });

        let events = match acquired.controller {
            Ok(link) => {
                self.status
                    .info(format!("Controller connected: {}", link.info().name));
                let (writer, events) = link.into_parts();
                self.gate.attach(writer).await;
                self.status
                    .update(StatusUpdate::new().hardware_connected(true));
                Some(events)
            }
            Err(e) => {
                self.status
                    .fault(e.category(), format!("controller unavailable: {e}"));
                None
            }
        };
        let camera = self.take_device("camera", acquired.camera, |u, ok| u.camera_connected(ok));
        let plate_reader = self
            .take_device("plate reader", acquired.plate_reader, |u, ok| u.ocr_ready(ok))
            .map(Arc::new);

        let running = Arc::new(AtomicBool::new(true));
        let recognition = tokio::spawn(
            RecognitionLoop {
                running: Arc::clone(&running),
                frame_interval: self.config.frame_interval,
                stabilization_delay: self.config.stabilization_delay,
                camera_ok: camera.is_some(),
                camera,
                plate_reader,
                events,
                latest: Arc::clone(&self.frame),
                occupancy: Arc::clone(&self.occupancy),
                evaluator: self.evaluator.clone(),
                status: Arc::clone(&self.status),
                tasks: self.tasks.clone(),
            }
            .run(),
        );
        let poll = tokio::spawn(
            ReservationPoll {
                running: Arc::clone(&running),
                interval: self.config.reservation_poll_interval,
                occupancy: Arc::clone(&self.occupancy),
                gate: Arc::clone(&self.gate),
            }
            .run(),
        );
        control.tasks = Some(RunningTasks {
            running,
            recognition,
            poll,
        });

        self.enter(&mut control, LoopState::Running);
        self.status
            .update(StatusUpdate::new().recognition_active(true));
        self.status.info("Recognition started");
        ControlOutcome::Applied
    }

    fn take_device<T>(
        &self,
        role: &str,
        acquired: Result<T, HardwareError>,
        flag: impl Fn(StatusUpdate, bool) -> StatusUpdate,
    ) -> Option<T> {
        match acquired {
            Ok(device) => {
                self.status.info(format!("{role} ready"));
                self.status.update(flag(StatusUpdate::new(), true));
                Some(device)
            }
            Err(e) => {
                self.status
                    .fault(e.category(), format!("{role} unavailable: {e}"));
                self.status.update(flag(StatusUpdate::new(), false));
                None
            }
        }
    }

    /// Signal the loop to exit, wait a bounded time for it, then release
    /// the devices and reset the status flags.
    pub async fn stop(&self) -> ControlOutcome {
        let mut control = self.control.lock().await;
        let Some(tasks) = control.tasks.take() else {
            self.status.info("Recognition not running");
            return ControlOutcome::NoOp;
        };
        let ran_for = control.lifecycle.time_in_current_state();
        self.enter(&mut control, LoopState::Stopping);

        tasks.running.store(false, Ordering::Release);
        let join = async {
            let _ = tasks.recognition.await;
            let _ = tasks.poll.await;
        };
        if tokio::time::timeout(self.config.join_timeout, join)
            .await
            .is_err()
        {
            self.status.warn(format!(
                "Recognition loop still draining after {}ms, releasing devices",
                self.config.join_timeout.as_millis()
            ));
        }

        if self.gate.detach().await.is_some() {
            debug!("controller writer released");
        }
        self.frame.clear();
        self.status.reset();
        self.enter(&mut control, LoopState::Stopped);
        self.status.info(format!(
            "Recognition stopped after {}s running",
            ran_for.as_secs()
        ));
        ControlOutcome::Applied
    }

    pub fn state(&self) -> LoopState {
        self.status.snapshot().state
    }

    pub fn status(&self) -> SystemStatus {
        self.status.snapshot()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.status.logs()
    }

    /// Latest frame as JPEG, or the gray placeholder if none was captured.
    pub fn frame_jpeg(&self) -> Bytes {
        self.frame
            .get()
            .map(|frame| frame.jpeg().clone())
            .filter(|jpeg| !jpeg.is_empty())
            .unwrap_or_else(placeholder_jpeg)
    }

    /// Authorize a plate typed by an operator.
    pub async fn manual_entry(&self, plate: &str) -> AccessResult {
        self.evaluator.evaluate_manual(plate).await
    }

    /// Merge and publish one sensor report. Returns the merged slots.
    pub async fn handle_state_report(&self, states: &[SlotState]) -> Vec<SlotState> {
        self.occupancy.merge_and_publish(states).await
    }

    /// Local copy of the slot cache.
    pub fn cached_slots(&self) -> Vec<SlotState> {
        self.occupancy.cached()
    }

    /// Wait until detached jobs (uploads, arrival marks, evaluations)
    /// have finished.
    pub async fn wait_idle(&self) {
        self.tasks.wait_idle().await;
    }
}

impl Drop for ParkingStation {
    fn drop(&mut self) {
        if let Some(tasks) = self.control.get_mut().tasks.as_ref() {
            tasks.running.store(false, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for ParkingStation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingStation")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
