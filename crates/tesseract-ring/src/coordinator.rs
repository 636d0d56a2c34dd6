//! Coordinator - builds the cube, spawns one worker per vertex and
//! supervises them until every one has been reaped.
//!
//! # Lifecycle
//!
//! 1. [`Coordinator::launch`]: validate the config, build the channel table,
//!    create the artifact directory, partition the table and spawn `2^n`
//!    workers. The table is consumed by the partition, so the coordinator
//!    keeps no channel ends.
//! 2. [`Coordinator::run`]: wait for workers to exit while serving
//!    [`ControlRequest`]s. A request never ends the wait early.
//!
//! # Control
//!
//! Requests arrive through a [`CoordinatorHandle`] (signal handlers hold
//! one). They are applied on the coordinator's own loop, so the registry is
//! only ever touched from one place:
//!
//! - `TogglePause` while running: `Pause` to every worker.
//! - `TogglePause` while paused: `Run` to every worker.
//! - `Terminate`: `Interrupt` to every worker, no acknowledgement. Toggles
//!   that arrive afterwards are ignored.

use std::collections::BTreeMap;

use tesseract_topology::{Hypercube, VertexId};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::RingConfig;
use crate::control::{Control, ControlRequest, PauseState, WorkerStatus};
use crate::error::{Error, Result};
use crate::forwarder::WorkerReport;
use crate::wiring::ChannelTable;
use crate::worker::{self, WorkerHandle, WorkerOutcome, WorkerSettings};

/// Cloneable handle for posting control requests to a running coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    requests: mpsc::UnboundedSender<ControlRequest>,
}

impl CoordinatorHandle {
    /// Post a request. Returns `false` once the coordinator has finished.
    pub fn request(&self, request: ControlRequest) -> bool {
        self.requests.send(request).is_ok()
    }

    /// Suspend every worker, or resume them if already suspended.
    pub fn toggle_pause(&self) -> bool {
        self.request(ControlRequest::TogglePause)
    }

    /// Interrupt every worker.
    pub fn terminate(&self) -> bool {
        self.request(ControlRequest::Terminate)
    }
}

/// Spawned workers that have not been reaped yet.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: BTreeMap<VertexId, WorkerHandle>,
}

impl WorkerRegistry {
    fn insert(&mut self, handle: WorkerHandle) {
        self.workers.insert(handle.vertex(), handle);
    }

    fn remove(&mut self, vertex: VertexId) -> Option<WorkerHandle> {
        self.workers.remove(&vertex)
    }

    fn vertex_of(&self, task: task::Id) -> Option<VertexId> {
        self.workers
            .values()
            .find(|handle| handle.task_id() == task)
            .map(WorkerHandle::vertex)
    }

    /// Number of live workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether every worker has been reaped.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Send `control` to every live worker.
    fn broadcast(&self, control: Control) {
        for handle in self.workers.values() {
            handle.signal(control);
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub dimension: u32,
    /// Workers that exited cleanly, in the order they were reaped.
    pub completed: Vec<WorkerReport>,
    /// Workers that ended with an error.
    pub failed: Vec<(VertexId, Error)>,
}

impl RunReport {
    /// Sum of arrival rounds over every clean worker.
    pub fn total_arrivals(&self) -> u64 {
        self.completed.iter().map(|r| r.arrivals).sum()
    }

    /// Whether every worker exited cleanly.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Supervisor of one simulation run.
#[derive(Debug)]
pub struct Coordinator {
    cube: Hypercube,
    registry: WorkerRegistry,
    tasks: JoinSet<WorkerOutcome>,
    pause: PauseState,
    terminating: bool,
    requests_tx: mpsc::UnboundedSender<ControlRequest>,
    requests_rx: mpsc::UnboundedReceiver<ControlRequest>,
}

impl Coordinator {
    /// Build the cube and spawn every worker.
    ///
    /// Must be called from within a tokio runtime. Any failure here is fatal
    /// to the run; workers spawned before the failure are not cleaned up.
    pub fn launch(config: RingConfig) -> Result<Self> {
        config.validate()?;
        let cube = Hypercube::new(config.dimension)?;
        let runtime = Handle::try_current()
            .map_err(|e| Error::ResourceExhausted(format!("no runtime to spawn workers on: {e}")))?;

        let table = ChannelTable::build(cube, config.channel_capacity)?;

        let artifact_dir = config.artifact_dir();
        std::fs::create_dir_all(&artifact_dir)?;

        info!(
            dimension = cube.dimension(),
            vertices = cube.vertex_count(),
            channels = table.len(),
            dir = %artifact_dir.display(),
            "launching hypercube ring"
        );

        let settings = WorkerSettings {
            artifact_dir,
            dimension: cube.dimension(),
            seed: config.seed,
        };

        let mut tasks = JoinSet::new();
        let mut registry = WorkerRegistry::default();
        for endpoints in table.into_endpoints() {
            registry.insert(worker::spawn(endpoints, &settings, &runtime, &mut tasks));
        }
        debug!(workers = registry.len(), "all workers spawned");

        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        Ok(Self {
            cube,
            registry,
            tasks,
            pause: PauseState::default(),
            terminating: false,
            requests_tx,
            requests_rx,
        })
    }

    /// A handle for posting control requests.
    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle {
            requests: self.requests_tx.clone(),
        }
    }

    /// The cube being simulated.
    pub fn cube(&self) -> Hypercube {
        self.cube
    }

    /// Live workers.
    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Whether the last toggle left the workers paused.
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Status receivers for every worker, in vertex order.
    ///
    /// They outlive the coordinator, so they can be taken before
    /// [`Coordinator::run`] consumes it.
    pub fn status_watchers(&self) -> Vec<(VertexId, watch::Receiver<WorkerStatus>)> {
        self.registry
            .workers
            .iter()
            .map(|(vertex, handle)| (*vertex, handle.watch_status()))
            .collect()
    }

    /// Supervise until every worker has been reaped.
    pub async fn run(mut self) -> RunReport {
        let mut report = RunReport {
            dimension: self.cube.dimension(),
            ..Default::default()
        };

        loop {
            tokio::select! {
                joined = self.tasks.join_next_with_id() => match joined {
                    None => break,
                    Some(Ok((_, (vertex, outcome)))) => self.reap(vertex, outcome, &mut report),
                    Some(Err(e)) => self.reap_panicked(e, &mut report),
                },
                Some(request) = self.requests_rx.recv() => self.apply(request),
            }
        }

        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            arrivals = report.total_arrivals(),
            "all workers reaped"
        );
        report
    }

    /// Apply one control request to every registered worker.
    pub fn apply(&mut self, request: ControlRequest) {
        match request {
            ControlRequest::TogglePause if self.terminating => {
                debug!("toggle ignored; workers are being interrupted");
            }
            ControlRequest::TogglePause => {
                let control = self.pause.toggle();
                info!(
                    paused = self.pause.is_paused(),
                    workers = self.registry.len(),
                    "toggling workers"
                );
                self.registry.broadcast(control);
            }
            ControlRequest::Terminate => {
                self.terminating = true;
                info!(workers = self.registry.len(), "interrupting workers");
                self.registry.broadcast(Control::Interrupt);
            }
        }
    }

    fn reap(&mut self, vertex: VertexId, outcome: Result<WorkerReport>, report: &mut RunReport) {
        self.registry.remove(vertex);
        match outcome {
            Ok(worker) => {
                debug!(%vertex, arrivals = worker.arrivals, exit = ?worker.exit, "worker reaped");
                report.completed.push(worker);
            }
            Err(e) => {
                error!(%vertex, error = %e, "worker failed");
                report.failed.push((vertex, e));
            }
        }
    }

    fn reap_panicked(&mut self, e: JoinError, report: &mut RunReport) {
        match self.registry.vertex_of(e.id()) {
            Some(vertex) => {
                error!(%vertex, error = %e, "worker task did not complete");
                self.registry.remove(vertex);
                report.failed.push((vertex, Error::WorkerPanicked(vertex)));
            }
            None => warn!(error = %e, "unknown task reaped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn launch_spawns_one_worker_per_vertex() {
        let dir = tempdir().unwrap();
        let config = RingConfig::new(3).with_output_root(dir.path()).with_seed(3);
        let coordinator = Coordinator::launch(config).unwrap();

        assert_eq!(coordinator.registry().len(), 8);
        assert!(dir.path().join("3").is_dir());

        let handle = coordinator.handle();
        let task = tokio::spawn(coordinator.run());
        assert!(handle.terminate());

        let report = task.await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.completed.len(), 8);
        assert!(!handle.terminate(), "coordinator should be gone");
    }

    #[tokio::test]
    async fn launch_rejects_oversized_cube() {
        let dir = tempdir().unwrap();
        let config = RingConfig::new(6)
            .with_output_root(dir.path())
            .with_max_dimension(5);
        let err = Coordinator::launch(config).unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted(_)));
        assert!(!dir.path().join("6").exists());
    }

    #[test]
    fn launch_outside_runtime_is_resource_exhausted() {
        let dir = tempdir().unwrap();
        let config = RingConfig::new(1).with_output_root(dir.path());
        assert!(matches!(
            Coordinator::launch(config),
            Err(Error::ResourceExhausted(_))
        ));
    }

    #[tokio::test]
    async fn toggle_flips_the_pause_flag() {
        let dir = tempdir().unwrap();
        let config = RingConfig::new(1).with_output_root(dir.path());
        let mut coordinator = Coordinator::launch(config).unwrap();

        assert!(!coordinator.is_paused());
        coordinator.apply(ControlRequest::TogglePause);
        assert!(coordinator.is_paused());
        coordinator.apply(ControlRequest::TogglePause);
        assert!(!coordinator.is_paused());

        coordinator.apply(ControlRequest::Terminate);
        let report = coordinator.run().await;
        assert_eq!(report.completed.len() + report.failed.len(), 2);
    }

    #[tokio::test]
    async fn artifact_dir_may_already_exist() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("2")).unwrap();
        let config = RingConfig::new(2).with_output_root(dir.path());
        let coordinator = Coordinator::launch(config).unwrap();
        coordinator.handle().terminate();
        assert_eq!(coordinator.run().await.completed.len(), 4);
    }

    #[tokio::test]
    async fn toggle_after_terminate_still_reaps_every_worker() {
        let dir = tempdir().unwrap();
        let config = RingConfig::new(1).with_output_root(dir.path()).with_seed(5);
        let mut coordinator = Coordinator::launch(config).unwrap();

        coordinator.apply(ControlRequest::Terminate);
        coordinator.apply(ControlRequest::TogglePause);
        assert!(!coordinator.is_paused());

        let report = tokio::time::timeout(std::time::Duration::from_secs(5), coordinator.run())
            .await
            .expect("workers were not reaped after terminate");
        assert_eq!(report.completed.len() + report.failed.len(), 2);
    }
}
