//! Error types for tesseract-ring.

use tesseract_topology::{TopologyError, VertexId};
use thiserror::Error;

/// Result type for tesseract-ring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while wiring, running or supervising the ring.
///
/// Every variant is fatal to the unit that raised it: a launch error aborts
/// the whole run, a worker error ends only that worker.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad command-line argument or configuration value.
    #[error("usage error: {0}")]
    Usage(String),

    /// A channel or worker could not be created.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Log artifact or output directory failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame did not carry exactly one token.
    #[error("protocol error at {vertex}: expected a {expected}-byte token, got {actual} bytes")]
    Protocol {
        vertex: VertexId,
        expected: usize,
        actual: usize,
    },

    /// Invalid topology argument.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// A worker task panicked or was aborted before reporting.
    #[error("worker {0} panicked")]
    WorkerPanicked(VertexId),
}
