//! Process signals to coordinator requests.
//!
//! `SIGUSR1` toggles pause, `SIGINT` terminates. The listener only posts a
//! [`ControlRequest`]; the coordinator applies it on its own loop.

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::control::ControlRequest;
use crate::coordinator::CoordinatorHandle;
use crate::error::Result;

/// Map a delivered signal to the request it stands for.
pub fn request_for(kind: SignalKind) -> Option<ControlRequest> {
    if kind == SignalKind::user_defined1() {
        Some(ControlRequest::TogglePause)
    } else if kind == SignalKind::interrupt() {
        Some(ControlRequest::Terminate)
    } else {
        None
    }
}

/// Install the toggle and terminate handlers and forward them to
/// `coordinator` until it finishes or the returned task is aborted.
pub fn install_signal_handlers(coordinator: CoordinatorHandle) -> Result<JoinHandle<()>> {
    let mut toggle = signal(SignalKind::user_defined1())?;
    let mut terminate = signal(SignalKind::interrupt())?;
    info!(pid = std::process::id(), "SIGUSR1 toggles pause, SIGINT terminates");

    Ok(tokio::spawn(async move {
        loop {
            let kind = tokio::select! {
                Some(()) = toggle.recv() => SignalKind::user_defined1(),
                Some(()) = terminate.recv() => SignalKind::interrupt(),
                else => break,
            };
            let Some(request) = request_for(kind) else {
                continue;
            };
            debug!(?request, "signal received");
            if !coordinator.request(request) {
                break;
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_mapping() {
        assert_eq!(
            request_for(SignalKind::user_defined1()),
            Some(ControlRequest::TogglePause)
        );
        assert_eq!(
            request_for(SignalKind::interrupt()),
            Some(ControlRequest::Terminate)
        );
        assert_eq!(request_for(SignalKind::hangup()), None);
    }
}
