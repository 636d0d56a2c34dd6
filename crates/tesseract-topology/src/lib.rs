//! Tesseract Hypercube Topology
//!
//! Pure maths for an n-dimensional hypercube interconnect.
//!
//! # Mathematical Foundation
//!
//! The hypercube of dimension `n` has `2^n` vertices. A vertex id is an
//! `n`-bit integer and two vertices are neighbours iff their ids differ in
//! exactly one bit, so every vertex has exactly `n` neighbours:
//!
//! ```text
//! neighbour(v, j) = v ^ (1 << j)        for j in 0..n
//! ```
//!
//! # Channel Indexing
//!
//! Each undirected edge `{v, v ^ (1 << j)}` is backed by two directed
//! channels, one per direction. Channel `(v, j)` has flat index `v·n + j`
//! and is *read* by `v` and *written* by `v ^ (1 << j)`. Every vertex
//! therefore owns exactly one read end and one write end per dimension and no
//! endpoint is ever shared; see [`EndpointPlan`].

mod error;
mod hypercube;
mod ownership;
mod vertex;

pub use error::{Result, TopologyError};
pub use hypercube::Hypercube;
pub use ownership::{ChannelId, EndpointPlan};
pub use vertex::{Dimension, VertexId};

/// Largest dimension the topology accepts (`2^24` vertices).
///
/// Keeps `n · 2^n` comfortably inside `usize` and vertex ids inside `u32`.
pub const MAX_DIMENSION: u32 = 24;

/// Directed channels per undirected edge (one per direction).
pub const CHANNELS_PER_EDGE: usize = 2;
