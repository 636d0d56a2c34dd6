//! Worker spawn.
//!
//! A worker is one tokio task per vertex. It owns its [`Endpoints`], opens
//! its artifact, and runs a [`TokenForwarder`] until the loop exits. The
//! spawner keeps a [`WorkerHandle`]: the sending side of the worker's control
//! channel and the receiving side of its status channel.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tesseract_topology::VertexId;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{self, JoinSet};
use tracing::{info_span, Instrument};

use crate::arrival_log::ArrivalLog;
use crate::control::{Control, WorkerStatus};
use crate::error::Result;
use crate::forwarder::{TokenForwarder, WorkerReport};
use crate::wiring::Endpoints;

/// What a reaped worker task yields.
pub type WorkerOutcome = (VertexId, Result<WorkerReport>);

/// Settings shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Directory the artifact is created in.
    pub artifact_dir: PathBuf,
    /// Cube dimension, for the artifact's binary label.
    pub dimension: u32,
    /// Base seed; `None` uses entropy.
    pub seed: Option<u64>,
}

/// Coordinator-side handle to one running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    vertex: VertexId,
    task: task::Id,
    control: watch::Sender<Control>,
    status: watch::Receiver<WorkerStatus>,
}

impl WorkerHandle {
    /// The worker's vertex.
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Id of the task running this worker.
    pub fn task_id(&self) -> task::Id {
        self.task
    }

    /// A receiver that follows this worker's status.
    pub fn watch_status(&self) -> watch::Receiver<WorkerStatus> {
        self.status.clone()
    }

    /// Deliver a control value. Never blocks; a worker that already exited
    /// simply never sees it.
    ///
    /// `Interrupt` is final: once sent, later values are dropped so a pause
    /// or resume cannot overwrite it before the worker reads it.
    pub fn signal(&self, control: Control) {
        self.control.send_if_modified(|current| {
            if *current == Control::Interrupt || *current == control {
                false
            } else {
                *current = control;
                true
            }
        });
    }
}

/// Per-vertex RNG: the base seed mixed with the vertex id, or entropy.
fn worker_rng(seed: Option<u64>, vertex: VertexId) -> StdRng {
    match seed {
        Some(seed) => {
            let mixed = u64::from(vertex.get()).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            StdRng::seed_from_u64(seed ^ mixed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Spawn the worker for `endpoints.vertex()` onto `runtime`, tracked by
/// `tasks`.
///
/// The artifact is opened inside the task, so a failure there ends only
/// this worker and surfaces when it is reaped.
pub fn spawn(
    endpoints: Endpoints,
    settings: &WorkerSettings,
    runtime: &Handle,
    tasks: &mut JoinSet<WorkerOutcome>,
) -> WorkerHandle {
    let vertex = endpoints.vertex();
    let (control_tx, control_rx) = watch::channel(Control::Run);
    let (status_tx, status_rx) = watch::channel(WorkerStatus::Starting);

    let dir = settings.artifact_dir.clone();
    let dimension = settings.dimension;
    let rng = worker_rng(settings.seed, vertex);

    let work = async move {
        let log = match ArrivalLog::create(&dir, vertex, dimension).await {
            Ok(log) => log,
            Err(e) => {
                status_tx.send_replace(WorkerStatus::Exited);
                return (vertex, Err(e));
            }
        };
        let forwarder = TokenForwarder::new(endpoints, log, control_rx, status_tx, rng);
        (vertex, forwarder.run().await)
    };
    let abort = tasks.spawn_on(work.instrument(info_span!("worker", %vertex)), runtime);

    WorkerHandle {
        vertex,
        task: abort.id(),
        control: control_tx,
        status: status_rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::forwarder::WorkerExit;
    use crate::wiring::ChannelTable;
    use rand::Rng;
    use tempfile::tempdir;
    use std::time::Duration;
    use tesseract_topology::Hypercube;
    use tokio::time::timeout;

    fn draws(mut rng: StdRng) -> Vec<u32> {
        (0..8).map(|_| rng.gen_range(0..1000)).collect()
    }

    #[test]
    fn seeded_rngs_are_reproducible_and_distinct_per_vertex() {
        let a = draws(worker_rng(Some(1), VertexId(3)));
        let b = draws(worker_rng(Some(1), VertexId(3)));
        let c = draws(worker_rng(Some(1), VertexId(4)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn missing_artifact_dir_fails_only_that_worker() {
        let dir = tempdir().unwrap();
        let cube = Hypercube::new(1).unwrap();
        let mut ends = ChannelTable::build(cube, 4).unwrap().into_endpoints();
        let settings = WorkerSettings {
            artifact_dir: dir.path().join("missing"),
            dimension: 1,
            seed: Some(1),
        };

        let mut tasks = JoinSet::new();
        let handle = spawn(ends.remove(1), &settings, &Handle::current(), &mut tasks);
        assert_eq!(handle.vertex(), VertexId(1));

        let (vertex, outcome) = tasks.join_next().await.unwrap().unwrap();
        assert_eq!(vertex, VertexId(1));
        assert!(matches!(outcome, Err(Error::Io(_))));
        assert_eq!(*handle.watch_status().borrow(), WorkerStatus::Exited);
    }

    #[tokio::test]
    async fn interrupt_through_handle() {
        let dir = tempdir().unwrap();
        let cube = Hypercube::new(1).unwrap();
        let mut ends = ChannelTable::build(cube, 4).unwrap().into_endpoints();
        let settings = WorkerSettings {
            artifact_dir: dir.path().to_path_buf(),
            dimension: 1,
            seed: None,
        };

        let mut tasks = JoinSet::new();
        let handle = spawn(ends.remove(1), &settings, &Handle::current(), &mut tasks);
        handle.signal(Control::Interrupt);

        let (_, outcome) = tasks.join_next().await.unwrap().unwrap();
        assert_eq!(outcome.unwrap().exit, WorkerExit::Interrupted);
        assert!(dir.path().join("1.txt").exists());
    }

    #[tokio::test]
    async fn pause_after_interrupt_still_interrupts() {
        let dir = tempdir().unwrap();
        let cube = Hypercube::new(1).unwrap();
        let mut ends = ChannelTable::build(cube, 4).unwrap().into_endpoints();
        let settings = WorkerSettings {
            artifact_dir: dir.path().to_path_buf(),
            dimension: 1,
            seed: Some(2),
        };

        let mut tasks = JoinSet::new();
        let handle = spawn(ends.remove(1), &settings, &Handle::current(), &mut tasks);
        handle.signal(Control::Interrupt);
        handle.signal(Control::Pause);
        handle.signal(Control::Run);
        assert_eq!(*handle.control.borrow(), Control::Interrupt);

        let (_, outcome) = timeout(Duration::from_secs(5), tasks.join_next())
            .await
            .expect("worker ignored the interrupt")
            .unwrap()
            .unwrap();
        assert_eq!(outcome.unwrap().exit, WorkerExit::Interrupted);
    }
}
