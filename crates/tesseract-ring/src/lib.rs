//! Tesseract Ring - a token ring over an n-dimensional hypercube
//!
//! One worker per vertex, one bounded channel per directed edge, and a
//! single token walking the cube at random.
//!
//! # Overview
//!
//! ## Wiring
//!
//! [`ChannelTable`] allocates the `n · 2^n` channels and partitions them
//! into per-vertex [`Endpoints`]: `n` read ends and `n` write ends, moved to
//! their owners so nothing is shared and the coordinator keeps none.
//!
//! ## Forwarding
//!
//! Each worker runs a [`TokenForwarder`]: vertex 0 seeds the token, every
//! arrival is counted, timestamped, logged to the vertex's artifact and
//! forwarded along a uniformly random edge.
//!
//! ## Supervision
//!
//! The [`Coordinator`] spawns the workers, turns signals into
//! [`ControlRequest`]s and fans them out (pause, resume, interrupt), then
//! reaps every worker.
//!
//! # Example
//!
//! ```no_run
//! use tesseract_ring::{run, RingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = run(RingConfig::new(3)).await?;
//!     println!("{} arrivals", report.total_arrivals());
//!     Ok(())
//! }
//! ```

pub mod arrival_log;
pub mod config;
pub mod control;
pub mod coordinator;
pub mod error;
pub mod forwarder;
pub mod signals;
pub mod token;
pub mod wiring;
pub mod worker;

pub use arrival_log::{parse_log, ArrivalEntry, ArrivalLog};
pub use config::RingConfig;
pub use control::{Control, ControlRequest, PauseState, WorkerStatus};
pub use coordinator::{Coordinator, CoordinatorHandle, RunReport, WorkerRegistry};
pub use error::{Error, Result};
pub use forwarder::{ForwarderState, TokenForwarder, WorkerExit, WorkerReport};
pub use signals::install_signal_handlers;
pub use token::{Token, TOKEN_WIRE_SIZE};
pub use wiring::{ChannelTable, Endpoints, Frame};
pub use worker::WorkerHandle;

// Re-export the topology types that appear in this crate's API
pub use tesseract_topology::{ChannelId, Dimension, Hypercube, VertexId};

/// Launch a ring, forward signals to it, and supervise until every worker
/// has been reaped.
pub async fn run(config: RingConfig) -> Result<RunReport> {
    let coordinator = Coordinator::launch(config)?;
    let signals = install_signal_handlers(coordinator.handle())?;
    let report = coordinator.run().await;
    signals.abort();
    Ok(report)
}
