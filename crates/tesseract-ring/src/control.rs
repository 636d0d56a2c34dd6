//! Control-plane vocabulary shared by the coordinator and its workers.
//!
//! External signals become [`ControlRequest`]s posted to the coordinator's
//! loop. The coordinator turns them into a [`Control`] value that it fans
//! out to every registered worker, and each worker publishes its
//! [`WorkerStatus`] back.

use std::fmt;

/// What a worker should be doing. Delivered over a per-worker watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    /// Forward the token normally.
    #[default]
    Run,
    /// Stop polling read ends until told to run again.
    Pause,
    /// Leave the forwarding loop and exit.
    Interrupt,
}

/// A request posted to the coordinator, typically from a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Suspend every worker if running, resume them if suspended.
    TogglePause,
    /// Interrupt every worker.
    Terminate,
}

/// Worker lifecycle as observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerStatus {
    /// Spawned, artifact not yet open.
    #[default]
    Starting,
    /// In the forwarding loop.
    Running,
    /// Parked on its control channel.
    Suspended,
    /// Left the loop (normally or not).
    Exited,
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Suspended => write!(f, "Suspended"),
            Self::Exited => write!(f, "Exited"),
        }
    }
}

/// The coordinator's single `paused` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseState {
    paused: bool,
}

impl PauseState {
    /// Whether workers are currently held.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Flip the flag and return the control value to broadcast.
    pub fn toggle(&mut self) -> Control {
        self.paused = !self.paused;
        if self.paused {
            Control::Pause
        } else {
            Control::Run
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_alternates() {
        let mut state = PauseState::default();
        assert!(!state.is_paused());
        assert_eq!(state.toggle(), Control::Pause);
        assert!(state.is_paused());
        assert_eq!(state.toggle(), Control::Run);
        assert!(!state.is_paused());
    }

    #[test]
    fn two_toggles_restore_the_original_state() {
        for start_paused in [false, true] {
            let mut state = PauseState::default();
            if start_paused {
                state.toggle();
            }
            let before = state;
            state.toggle();
            state.toggle();
            assert_eq!(state, before);
        }
    }
}
