//! Error types for tesseract-topology.

use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors raised when a dimension, vertex or edge falls outside the cube.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// The requested dimension exceeds [`crate::MAX_DIMENSION`].
    #[error("dimension {requested} exceeds the supported maximum of {max}")]
    DimensionTooLarge { requested: u32, max: u32 },

    /// A vertex id does not belong to a cube of this dimension.
    #[error("vertex {vertex} is outside a {dimension}-cube")]
    VertexOutOfRange { vertex: u32, dimension: u32 },

    /// An edge dimension is not smaller than the cube dimension.
    #[error("edge dimension {edge} is outside a {dimension}-cube")]
    DimensionOutOfRange { edge: u32, dimension: u32 },
}
