//! Recognition loop lifecycle.
//!
//! # States
//!
//! - `Stopped`: no loop task, devices released
//! - `Starting`: devices being acquired
//! - `Running`: loop task alive
//! - `Stopping`: loop task signaled, waiting for it to drain
//!
//! # Valid Transitions
//!
//! - Stopped → Starting → Running → Stopping → Stopped
//! - Starting → Stopped (acquisition abandoned)
//!
//! # Examples
//!
//! ```
//! use smartpark_engine::lifecycle::{Lifecycle, LoopState};
//!
//! let mut lifecycle = Lifecycle::new();
//! lifecycle.transition_to(LoopState::Starting).unwrap();
//! lifecycle.transition_to(LoopState::Running).unwrap();
//! assert!(lifecycle.transition_to(LoopState::Starting).is_err());
//! ```

use serde::{Deserialize, Serialize};
use smartpark_core::{Error, Result};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Transitions kept for diagnostics.
const MAX_HISTORY_SIZE: usize = 32;

/// Lifecycle state of the recognition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoopState::Stopped => "Stopped",
            LoopState::Starting => "Starting",
            LoopState::Running => "Running",
            LoopState::Stopping => "Stopping",
        };
        f.write_str(label)
    }
}

impl LoopState {
    /// Check if transition to target state is valid from this state.
    ///
    /// ```
    /// use smartpark_engine::lifecycle::LoopState;
    ///
    /// assert!(LoopState::Stopped.can_transition_to(&LoopState::Starting));
    /// assert!(!LoopState::Stopped.can_transition_to(&LoopState::Stopping));
    /// ```
    pub fn can_transition_to(&self, target: &LoopState) -> bool {
        matches!(
            (self, target),
            (LoopState::Stopped, LoopState::Starting)
                | (LoopState::Starting, LoopState::Running | LoopState::Stopped)
                | (LoopState::Running, LoopState::Stopping)
                | (LoopState::Stopping, LoopState::Stopped)
        )
    }

    /// Returns `true` while a loop task exists or is being created.
    pub fn is_active(&self) -> bool {
        !matches!(self, LoopState::Stopped)
    }
}

/// A recorded state change.
#[derive(Debug, Clone, Copy)]
pub struct StateTransition {
    pub from: LoopState,
    pub to: LoopState,
    pub timestamp: Instant,
}

/// Lifecycle state machine with a short transition history.
///
/// Not synchronized; the station keeps it behind a lock.
#[derive(Debug)]
pub struct Lifecycle {
    current: LoopState,
    entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            current: LoopState::Stopped,
            entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> LoopState {
        self.current
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Move to `target`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the move is not allowed;
    /// the state is left unchanged.
    pub fn transition_to(&mut self, target: LoopState) -> Result<()> {
        if !self.current.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            });
        }
        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        let now = Instant::now();
        self.history.push_back(StateTransition {
            from: self.current,
            to: target,
            timestamp: now,
        });
        self.current = target;
        self.entered_at = now;
        Ok(())
    }

    /// Transitions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StateTransition> {
        self.history.iter()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LoopState::Stopped, LoopState::Starting, true)]
    #[case(LoopState::Starting, LoopState::Running, true)]
    #[case(LoopState::Starting, LoopState::Stopped, true)]
    #[case(LoopState::Running, LoopState::Stopping, true)]
    #[case(LoopState::Stopping, LoopState::Stopped, true)]
    #[case(LoopState::Stopped, LoopState::Running, false)]
    #[case(LoopState::Stopped, LoopState::Stopping, false)]
    #[case(LoopState::Running, LoopState::Starting, false)]
    #[case(LoopState::Running, LoopState::Stopped, false)]
    #[case(LoopState::Stopping, LoopState::Running, false)]
    fn test_transitions(#[case] from: LoopState, #[case] to: LoopState, #[case] valid: bool) {
        assert_eq!(from.can_transition_to(&to), valid);
    }

    #[test]
    fn test_full_cycle_records_history() {
        let mut lifecycle = Lifecycle::new();
        for state in [
            LoopState::Starting,
            LoopState::Running,
            LoopState::Stopping,
            LoopState::Stopped,
        ] {
            lifecycle.transition_to(state).unwrap();
        }
        assert_eq!(lifecycle.current_state(), LoopState::Stopped);
        let path: Vec<LoopState> = lifecycle.history().map(|t| t.to).collect();
        assert_eq!(
            path,
            vec![
                LoopState::Starting,
                LoopState::Running,
                LoopState::Stopping,
                LoopState::Stopped
            ]
        );
    }

    #[test]
    fn test_invalid_transition_keeps_state() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.transition_to(LoopState::Stopping).unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert_eq!(lifecycle.current_state(), LoopState::Stopped);
        assert_eq!(lifecycle.history().count(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut lifecycle = Lifecycle::new();
        for _ in 0..20 {
            lifecycle.transition_to(LoopState::Starting).unwrap();
            lifecycle.transition_to(LoopState::Stopped).unwrap();
        }
        assert_eq!(lifecycle.history().count(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&LoopState::Running).unwrap(),
            "\"running\""
        );
    }
}
