use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    HardwareError, Result,
    traits::PlateReader,
    types::{DeviceInfo, Frame, TextCandidate},
};

const DEVICE_NAME: &str = "Mock Plate Reader";

#[derive(Debug, Default)]
struct ReaderState {
    candidates: Vec<TextCandidate>,
    failing: bool,
    calls: usize,
}

/// Test-side handle of a mock plate reader.
#[derive(Debug, Clone, Default)]
pub struct MockPlateReaderHandle {
    state: Arc<Mutex<ReaderState>>,
}

impl MockPlateReaderHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self) -> MockPlateReader {
        MockPlateReader {
            state: Arc::clone(&self.state),
        }
    }

    /// Readings returned for every following frame.
    pub fn set_candidates<I, S>(&self, candidates: I)
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        self.lock().candidates = candidates
            .into_iter()
            .map(|(text, confidence)| TextCandidate::new(text, confidence))
            .collect();
    }

    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Number of frames submitted for reading.
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }
}

/// Mock plate reader device.
#[derive(Debug)]
pub struct MockPlateReader {
    state: Arc<Mutex<ReaderState>>,
}

impl PlateReader for MockPlateReader {
    async fn read_text(&self, _frame: &Frame) -> Result<Vec<TextCandidate>> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.calls += 1;
        if state.failing {
            return Err(HardwareError::recognition("mock reader failing"));
        }
        Ok(state.candidates.clone())
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(DEVICE_NAME, "Mock OCR v1.0")
    }
}
