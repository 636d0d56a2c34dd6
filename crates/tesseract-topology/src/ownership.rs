//! Channel identities and per-vertex endpoint ownership.
//!
//! Channel `(v, j)` carries traffic *into* `v` along edge `j`. Its reader is
//! `v` and its writer is `v ^ (1 << j)`. With that single rule every vertex
//! reads from the `n` channels keyed by itself and writes into the `n`
//! channels keyed by its neighbours, so ownership is computed directly rather
//! than discovered by elimination.

use crate::{Dimension, VertexId};

/// One directed channel of the cube, keyed by its reading vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId {
    /// The vertex that owns the read end.
    pub vertex: VertexId,
    /// The edge the channel runs along.
    pub dimension: Dimension,
}

impl ChannelId {
    /// Create a new channel id.
    pub const fn new(vertex: VertexId, dimension: Dimension) -> Self {
        Self { vertex, dimension }
    }

    /// Flat index `vertex · n + dimension` inside a cube of dimension `n`.
    pub const fn index(self, cube_dimension: u32) -> usize {
        self.vertex.index() * cube_dimension as usize + self.dimension.index()
    }

    /// The vertex that owns the read end.
    pub const fn reader(self) -> VertexId {
        self.vertex
    }

    /// The vertex that owns the write end.
    pub const fn writer(self) -> VertexId {
        self.vertex.flip(self.dimension)
    }
}

/// The channel ends a single vertex owns, indexed by dimension.
///
/// `reads[j]` is the channel the vertex receives on along edge `j` and
/// `writes[j]` the one it sends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPlan {
    pub vertex: VertexId,
    pub reads: Vec<ChannelId>,
    pub writes: Vec<ChannelId>,
}

impl EndpointPlan {
    /// Compute the plan for `vertex` in a cube of dimension `cube_dimension`.
    ///
    /// The caller is responsible for `vertex` being inside the cube.
    pub(crate) fn compute(vertex: VertexId, cube_dimension: u32) -> Self {
        let reads = (0..cube_dimension)
            .map(|j| ChannelId::new(vertex, Dimension(j)))
            .collect();
        let writes = (0..cube_dimension)
            .map(|j| ChannelId::new(vertex.flip(Dimension(j)), Dimension(j)))
            .collect();
        Self { vertex, reads, writes }
    }

    /// Number of edges covered (equal to the cube dimension).
    pub fn degree(&self) -> usize {
        self.reads.len()
    }
}
