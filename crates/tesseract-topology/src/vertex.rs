//! Vertex and edge-dimension identifiers.
//!
//! A vertex id doubles as its adjacency key: flipping bit `j` of the id walks
//! along edge `j` of the cube.

use std::fmt;

/// A hypercube vertex, identified by its `n`-bit id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VertexId(pub u32);

impl VertexId {
    /// The vertex that seeds the token.
    pub const ORIGIN: Self = Self(0);

    /// Create a new vertex id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id as a slice index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is vertex 0.
    pub const fn is_origin(self) -> bool {
        self.0 == 0
    }

    /// The vertex across edge `dimension`: `self ^ (1 << dimension)`.
    ///
    /// Does not check that `dimension` is inside any particular cube; use
    /// [`crate::Hypercube::neighbor`] for a checked lookup.
    pub const fn flip(self, dimension: Dimension) -> Self {
        Self(self.0 ^ dimension.mask())
    }

    /// Whether the two ids differ in exactly one bit.
    pub const fn is_adjacent(self, other: Self) -> bool {
        (self.0 ^ other.0).count_ones() == 1
    }

    /// Fixed-width binary label, most significant bit first.
    ///
    /// `VertexId(5).label(4) == "0101"`. A zero-dimensional cube has the
    /// empty label.
    pub fn label(self, dimension: u32) -> String {
        (0..dimension)
            .rev()
            .map(|bit| if (self.0 >> bit) & 1 == 1 { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for VertexId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// An edge dimension (bit position) in `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dimension(pub u32);

impl Dimension {
    /// Create a new dimension.
    pub const fn new(bit: u32) -> Self {
        Self(bit)
    }

    /// The bit position.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The dimension as a slice index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask `1 << self`.
    pub const fn mask(self) -> u32 {
        1 << self.0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}
