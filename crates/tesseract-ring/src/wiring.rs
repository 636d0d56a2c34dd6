//! Channel table construction and endpoint partitioning.
//!
//! [`ChannelTable::build`] allocates one bounded channel per
//! (vertex, dimension) pair. [`ChannelTable::into_endpoints`] then consumes
//! the table and moves every read end to its reader and every write end to
//! its writer, following [`Hypercube::ownership`]. Handles are move-only, so
//! after partitioning no vertex can hold an end it does not own and the
//! caller holds none at all.

use bytes::Bytes;
use tesseract_topology::{ChannelId, Hypercube, VertexId};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};

/// One encoded token in flight.
pub type Frame = Bytes;

/// All `n · 2^n` channels of a cube, in flat-index order.
#[derive(Debug)]
pub struct ChannelTable {
    cube: Hypercube,
    senders: Vec<mpsc::Sender<Frame>>,
    receivers: Vec<mpsc::Receiver<Frame>>,
}

impl ChannelTable {
    /// Allocate every channel of `cube`, each bounded to `capacity` frames.
    pub fn build(cube: Hypercube, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Usage("channel capacity must be at least 1".into()));
        }

        let count = cube.channel_count();
        let mut senders = Vec::new();
        let mut receivers = Vec::new();
        senders
            .try_reserve_exact(count)
            .and_then(|()| receivers.try_reserve_exact(count))
            .map_err(|e| {
                Error::ResourceExhausted(format!("cannot allocate {count} channels: {e}"))
            })?;

        for _ in 0..count {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            receivers.push(rx);
        }

        debug!(dimension = cube.dimension(), channels = count, "channel table built");
        Ok(Self {
            cube,
            senders,
            receivers,
        })
    }

    /// The cube the table was built for.
    pub fn cube(&self) -> Hypercube {
        self.cube
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    /// Whether the table has no channels (a zero-dimensional cube).
    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Hand every vertex exactly the ends it owns, in vertex order.
    pub fn into_endpoints(self) -> Vec<Endpoints> {
        let cube = self.cube;
        let n = cube.dimension();

        let mut senders: Vec<Option<mpsc::Sender<Frame>>> =
            self.senders.into_iter().map(Some).collect();
        let mut receivers: Vec<Option<mpsc::Receiver<Frame>>> =
            self.receivers.into_iter().map(Some).collect();

        cube.plans()
            .map(|plan| {
                let inbound: Vec<_> = plan
                    .reads
                    .iter()
                    .filter_map(|channel| receivers[channel.index(n)].take())
                    .collect();
                let outbound: Vec<_> = plan
                    .writes
                    .iter()
                    .filter_map(|channel| senders[channel.index(n)].take())
                    .collect();

                debug_assert_eq!(inbound.len(), n as usize);
                debug_assert_eq!(outbound.len(), n as usize);

                Endpoints {
                    vertex: plan.vertex,
                    reads: plan.reads,
                    writes: plan.writes,
                    inbound,
                    outbound,
                }
            })
            .collect()
    }
}

/// The `n` read ends and `n` write ends owned by one vertex, indexed by
/// dimension.
#[derive(Debug)]
pub struct Endpoints {
    vertex: VertexId,
    reads: Vec<ChannelId>,
    writes: Vec<ChannelId>,
    inbound: Vec<mpsc::Receiver<Frame>>,
    outbound: Vec<mpsc::Sender<Frame>>,
}

impl Endpoints {
    /// The owning vertex.
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Number of edges (the cube dimension).
    pub fn degree(&self) -> usize {
        self.inbound.len()
    }

    /// Identities of the channels this vertex reads, by dimension.
    pub fn read_channels(&self) -> &[ChannelId] {
        &self.reads
    }

    /// Identities of the channels this vertex writes, by dimension.
    pub fn write_channels(&self) -> &[ChannelId] {
        &self.writes
    }

    /// Give up the channel handles: read ends and write ends, by dimension.
    pub fn into_parts(self) -> (Vec<mpsc::Receiver<Frame>>, Vec<mpsc::Sender<Frame>>) {
        (self.inbound, self.outbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use std::collections::HashSet;

    fn endpoints(n: u32) -> Vec<Endpoints> {
        let cube = Hypercube::new(n).unwrap();
        ChannelTable::build(cube, 4).unwrap().into_endpoints()
    }

    #[test]
    fn table_has_n_times_two_to_the_n_channels() {
        for n in 0..=6 {
            let cube = Hypercube::new(n).unwrap();
            let table = ChannelTable::build(cube, 1).unwrap();
            assert_eq!(table.len(), (n as usize) << n);
            assert_eq!(table.is_empty(), n == 0);
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cube = Hypercube::new(2).unwrap();
        assert!(matches!(ChannelTable::build(cube, 0), Err(Error::Usage(_))));
    }

    #[test]
    fn partition_matches_ownership_plan() {
        let cube = Hypercube::new(3).unwrap();
        for ends in endpoints(3) {
            let plan = cube.ownership(ends.vertex()).unwrap();
            assert_eq!(ends.read_channels(), plan.reads.as_slice());
            assert_eq!(ends.write_channels(), plan.writes.as_slice());
        }
    }

    #[test]
    fn two_cube_has_two_ends_each_way_and_no_sharing() {
        let all = endpoints(2);
        assert_eq!(all.len(), 4);

        let mut reads = HashSet::new();
        let mut writes = HashSet::new();
        for ends in &all {
            assert_eq!(ends.degree(), 2);
            assert_eq!(ends.read_channels().len(), 2);
            assert_eq!(ends.write_channels().len(), 2);
            reads.extend(ends.read_channels().iter().copied());
            writes.extend(ends.write_channels().iter().copied());
        }
        assert_eq!(reads.len(), 8);
        assert_eq!(writes.len(), 8);
    }

    #[tokio::test]
    async fn write_end_reaches_the_neighbour_read_end() {
        // Vertex 5 writes along dimension 1; vertex 7 must read it on its
        // own dimension 1 end.
        let mut all = endpoints(3);
        let (_, five_out) = all.remove(5).into_parts();
        let (mut seven_in, _) = all.remove(6).into_parts();

        five_out[1].send(Token(42).encode()).await.unwrap();
        let frame = seven_in[1].recv().await.unwrap();
        assert_eq!(Token::decode(&frame), Some(Token(42)));

        for (j, rx) in seven_in.iter_mut().enumerate() {
            if j != 1 {
                assert!(rx.try_recv().is_err());
            }
        }
    }
}
