//! The hypercube graph for a fixed dimension.

use crate::{
    ChannelId, Dimension, EndpointPlan, Result, TopologyError, VertexId, CHANNELS_PER_EDGE,
    MAX_DIMENSION,
};

/// An n-dimensional hypercube.
///
/// Construction validates the dimension once; every checked accessor then
/// guards vertex and edge arguments against the cube's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hypercube {
    dimension: u32,
}

impl Hypercube {
    /// Create a cube of dimension `n`.
    pub fn new(dimension: u32) -> Result<Self> {
        if dimension > MAX_DIMENSION {
            return Err(TopologyError::DimensionTooLarge {
                requested: dimension,
                max: MAX_DIMENSION,
            });
        }
        Ok(Self { dimension })
    }

    /// The dimension `n` (also the degree of every vertex).
    pub const fn dimension(&self) -> u32 {
        self.dimension
    }

    /// `2^n`.
    pub const fn vertex_count(&self) -> usize {
        1usize << self.dimension
    }

    /// `n · 2^n`: one directed channel per (vertex, dimension) pair.
    pub const fn channel_count(&self) -> usize {
        self.dimension as usize * self.vertex_count()
    }

    /// `n · 2^(n-1)` undirected edges.
    pub const fn edge_count(&self) -> usize {
        self.channel_count() / CHANNELS_PER_EDGE
    }

    /// Whether `vertex` belongs to this cube.
    pub const fn contains(&self, vertex: VertexId) -> bool {
        vertex.index() < self.vertex_count()
    }

    /// All vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertex_count() as u32).map(VertexId)
    }

    /// All edge dimensions `0..n`.
    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> {
        (0..self.dimension).map(Dimension)
    }

    /// All channels in flat-index order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.vertices()
            .flat_map(move |v| self.dimensions().map(move |j| ChannelId::new(v, j)))
    }

    /// The neighbour of `vertex` across edge `dimension`.
    pub fn neighbor(&self, vertex: VertexId, dimension: Dimension) -> Result<VertexId> {
        self.check_vertex(vertex)?;
        self.check_dimension(dimension)?;
        Ok(vertex.flip(dimension))
    }

    /// All `n` neighbours of `vertex`, indexed by dimension.
    pub fn neighbors(&self, vertex: VertexId) -> Result<Vec<VertexId>> {
        self.check_vertex(vertex)?;
        Ok(self.dimensions().map(|j| vertex.flip(j)).collect())
    }

    /// Whether `a` and `b` are both in the cube and joined by an edge.
    pub fn are_neighbors(&self, a: VertexId, b: VertexId) -> bool {
        self.contains(a) && self.contains(b) && a.is_adjacent(b)
    }

    /// The read and write ends `vertex` owns.
    pub fn ownership(&self, vertex: VertexId) -> Result<EndpointPlan> {
        self.check_vertex(vertex)?;
        Ok(EndpointPlan::compute(vertex, self.dimension))
    }

    /// Ownership plans of every vertex, in id order.
    pub fn plans(&self) -> impl Iterator<Item = EndpointPlan> + '_ {
        self.vertices().map(move |v| EndpointPlan::compute(v, self.dimension))
    }

    fn check_vertex(&self, vertex: VertexId) -> Result<()> {
        if self.contains(vertex) {
            Ok(())
        } else {
            Err(TopologyError::VertexOutOfRange {
                vertex: vertex.get(),
                dimension: self.dimension,
            })
        }
    }

    fn check_dimension(&self, dimension: Dimension) -> Result<()> {
        if dimension.get() < self.dimension {
            Ok(())
        } else {
            Err(TopologyError::DimensionOutOfRange {
                edge: dimension.get(),
                dimension: self.dimension,
            })
        }
    }
}
