use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    HardwareError, Result,
    traits::Camera,
    types::{DeviceInfo, Frame},
};

const DEVICE_NAME: &str = "Mock Camera";

#[derive(Debug, Default)]
struct CameraState {
    frame: Option<Frame>,
    failing: bool,
    captures: usize,
}

/// Test-side handle of a mock camera.
///
/// Until a frame is set, captures return the gray placeholder.
#[derive(Debug, Clone, Default)]
pub struct MockCameraHandle {
    state: Arc<Mutex<CameraState>>,
}

impl MockCameraHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CameraState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self) -> MockCamera {
        MockCamera {
            state: Arc::clone(&self.state),
        }
    }

    /// Frame returned by every following capture.
    pub fn set_frame(&self, frame: Frame) {
        self.lock().frame = Some(frame);
    }

    /// Make captures fail as if the camera was unplugged.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn capture_count(&self) -> usize {
        self.lock().captures
    }
}

/// Mock camera device.
#[derive(Debug)]
pub struct MockCamera {
    state: Arc<Mutex<CameraState>>,
}

impl Camera for MockCamera {
    async fn capture(&mut self) -> Result<Frame> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.failing {
            return Err(HardwareError::disconnected(DEVICE_NAME));
        }
        state.captures += 1;
        Ok(state.frame.clone().unwrap_or_else(Frame::placeholder))
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(DEVICE_NAME, "Mock Camera v1.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_returns_set_frame() {
        let handle = MockCameraHandle::new();
        let mut camera = handle.open();

        let frame = Frame::from_jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        handle.set_frame(frame.clone());

        assert_eq!(camera.capture().await.unwrap(), frame);
        assert_eq!(handle.capture_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_camera() {
        let handle = MockCameraHandle::new();
        let mut camera = handle.open();
        handle.set_failing(true);

        assert!(camera.capture().await.unwrap_err().is_disconnected());
        assert_eq!(handle.capture_count(), 0);
    }
}
