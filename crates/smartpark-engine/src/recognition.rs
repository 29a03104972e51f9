//! Recognition loop and reservation poll.
//!
//! The loop task owns the camera, the plate reader and the inbound side of
//! the controller link. Each iteration captures a frame, then handles at
//! most one controller message, so messages are processed strictly in
//! arrival order. Remote-store work is pushed to detached jobs.

use smartpark_core::{FaultCategory, SlotState};
use smartpark_hardware::{AnyCamera, AnyPlateReader, Camera, Frame, PlateReader};
use smartpark_protocol::{ControllerMessage, GateCommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::access::AccessEvaluator;
use crate::gate::{CommandGate, GateOutcome};
use crate::occupancy::OccupancyReconciler;
use crate::status::{StatusBoard, StatusUpdate};
use crate::tasks::BackgroundTasks;

/// Most recent camera frame, shared with the serving layer.
#[derive(Debug, Default)]
pub struct FrameSlot {
    frame: Mutex<Option<Frame>>,
}

impl FrameSlot {
    fn lock(&self) -> MutexGuard<'_, Option<Frame>> {
        self.frame.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, frame: Frame) {
        *self.lock() = Some(frame);
    }

    /// A copy of the latest frame. Frames share their buffer, so this is
    /// cheap.
    pub fn get(&self) -> Option<Frame> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }
}

/// Everything the loop task needs, moved into it at start.
pub(crate) struct RecognitionLoop {
    pub running: Arc<AtomicBool>,
    pub frame_interval: Duration,
    pub stabilization_delay: Duration,
    pub camera: Option<AnyCamera>,
    pub plate_reader: Option<Arc<AnyPlateReader>>,
    pub events: Option<mpsc::Receiver<ControllerMessage>>,
    pub latest: Arc<FrameSlot>,
    pub occupancy: Arc<OccupancyReconciler>,
    pub evaluator: AccessEvaluator,
    pub status: Arc<StatusBoard>,
    pub tasks: BackgroundTasks,
    /// Last capture succeeded; failures are reported once per outage.
    pub camera_ok: bool,
}

impl RecognitionLoop {
    pub async fn run(mut self) {
        debug!("recognition loop started");

        while self.running.load(Ordering::Acquire) {
            if let Some(frame) = self.capture().await {
                self.latest.set(frame);
            }
            self.poll_controller().await;
            tokio::time::sleep(self.frame_interval).await;
        }

        debug!("recognition loop finished");
    }

    async fn capture(&mut self) -> Option<Frame> {
        let camera = self.camera.as_mut()?;
        match camera.capture().await {
            Ok(frame) => {
                if !self.camera_ok {
                    self.status.info("Camera recovered");
                    self.status
                        .update(StatusUpdate::new().camera_connected(true));
                    self.camera_ok = true;
                }
                Some(frame)
            }
            Err(e) => {
                if self.camera_ok {
                    self.status
                        .fault(e.category(), format!("camera capture failed: {e}"));
                    self.status
                        .update(StatusUpdate::new().camera_connected(false));
                    self.camera_ok = false;
                }
                None
            }
        }
    }

    async fn poll_controller(&mut self) {
        let Some(events) = self.events.as_mut() else {
            return;
        };
        let message = match events.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.events = None;
                self.status.fault(
                    FaultCategory::HardwareUnavailable,
                    "controller link closed",
                );
                self.status
                    .update(StatusUpdate::new().hardware_connected(false));
                return;
            }
        };
        trace!(kind = message.kind(), "controller message");

        match message {
            ControllerMessage::SlotStates(states) => {
                trace!(?states, "sensor report");
                let occupancy = Arc::clone(&self.occupancy);
                self.tasks.spawn("publish-occupancy", async move {
                    occupancy.merge_and_publish(&states).await;
                });
            }
            ControllerMessage::VehicleDetected => self.on_detection().await,
            ControllerMessage::Other(line) => {
                debug!(line = %line, "ignoring controller line");
            }
            ControllerMessage::Malformed { line, reason } => {
                self.status.warn(format!(
                    "{}: controller line {line:?} ignored, {reason}",
                    FaultCategory::MalformedData
                ));
            }
        }
    }

    async fn on_detection(&mut self) {
        self.status.info("Vehicle detected");
        tokio::time::sleep(self.stabilization_delay).await;

        let frame = match self.capture().await {
            Some(frame) => {
                self.latest.set(frame.clone());
                Some(frame)
            }
            None => {
                let cached = self.latest.get();
                if let Some(frame) = &cached {
                    debug!(captured_at = %frame.captured_at(), "using the last cached frame");
                }
                cached
            }
        };

        let evaluator = self.evaluator.clone();
        let (Some(frame), Some(reader)) = (frame, self.plate_reader.clone()) else {
            let reason = if self.plate_reader.is_none() {
                "No plate reader available"
            } else {
                "No frame available"
            };
            self.tasks.spawn("deny-unread", async move {
                evaluator.deny_unread(reason).await;
            });
            return;
        };

        let status = Arc::clone(&self.status);
        self.tasks.spawn("evaluate-detection", async move {
            match reader.read_text(&frame).await {
                Ok(candidates) => {
                    debug!(count = candidates.len(), "plate reader returned");
                    evaluator.evaluate_candidates(&candidates).await;
                }
                Err(e) => {
                    status.fault(e.category(), format!("plate reading failed: {e}"));
                    evaluator.deny_unread("Plate reader failed").await;
                }
            }
        });
    }
}

/// Periodic refresh of the local slot cache, forwarding the slot states
/// to the controller as `RESERVA:` lines whenever they change.
pub(crate) struct ReservationPoll {
    pub running: Arc<AtomicBool>,
    pub interval: Duration,
    pub occupancy: Arc<OccupancyReconciler>,
    pub gate: Arc<CommandGate>,
}

impl ReservationPoll {
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_sent: Option<Vec<SlotState>> = None;

        loop {
            ticker.tick().await;
            if !self.running.load(Ordering::Acquire) {
                break;
            }
            let Some(slots) = self.occupancy.refresh_cache().await else {
                continue;
            };
            if last_sent.as_ref() == Some(&slots) || !self.gate.is_attached().await {
                continue;
            }
            let command = GateCommand::Reservations(slots.clone());
            if self.gate.send_command(&command).await == GateOutcome::Sent {
                last_sent = Some(slots);
            }
        }
        debug!("reservation poll finished");
    }
}
