//! Signals raised at the process reach the ring.
//!
//! Kept in its own test binary: the handlers stay installed for the life of
//! the process.

use std::time::Duration;

use tempfile::tempdir;
use tesseract_ring::{install_signal_handlers, Coordinator, RingConfig, WorkerStatus};
use tokio::time::timeout;

const DEADLINE: Duration = Duration::from_secs(10);

fn raise(signal: libc::c_int) {
    // SAFETY: raise only queues a signal for the calling thread.
    let rc = unsafe { libc::raise(signal) };
    assert_eq!(rc, 0, "raise({signal}) failed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sigusr1_suspends_and_sigint_terminates() {
    let out = tempdir().unwrap();
    let config = RingConfig::new(2).with_output_root(out.path()).with_seed(11);
    let coordinator = Coordinator::launch(config).unwrap();
    let mut watchers = coordinator.status_watchers();
    let listener = install_signal_handlers(coordinator.handle()).unwrap();
    let run = tokio::spawn(coordinator.run());

    raise(libc::SIGUSR1);
    for (vertex, status) in watchers.iter_mut() {
        timeout(DEADLINE, status.wait_for(|s| *s == WorkerStatus::Suspended))
            .await
            .unwrap_or_else(|_| panic!("{vertex} was not suspended by SIGUSR1"))
            .unwrap();
    }

    raise(libc::SIGINT);
    let report = timeout(DEADLINE, run)
        .await
        .expect("SIGINT did not end the run")
        .unwrap();
    assert_eq!(report.completed.len(), 4);
    for (_, status) in &watchers {
        assert_eq!(*status.borrow(), WorkerStatus::Exited);
    }

    listener.abort();
}
