//! Token Forwarder - the per-vertex protocol state machine.
//!
//! # Loop
//!
//! 1. Vertex 0 seeds token 1, logs it and sends it along a random edge,
//!    once its control channel lets it run.
//! 2. Block on every read end at once, merged with the worker's control
//!    channel. No timeout.
//! 3. Every read end that is ready yields exactly one frame. When several
//!    are ready in the same round they are all drained, the counter takes
//!    the value of the last frame in dimension order and advances once.
//!    That can move the counter by more than one per round; it is reported,
//!    not hidden.
//! 4. Increment, timestamp and log the arrival.
//! 5. Send the token along a uniformly random edge, independent of the edge
//!    it arrived on.
//! 6. Re-arm and repeat.
//!
//! The loop ends when every read end is closed, when a forward finds the
//! neighbour gone, or when the coordinator interrupts the worker.

use std::future::poll_fn;
use std::task::{Context, Poll};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use tesseract_topology::{Dimension, VertexId};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::arrival_log::{ArrivalEntry, ArrivalLog};
use crate::control::{Control, WorkerStatus};
use crate::error::{Error, Result};
use crate::token::{Token, TOKEN_WIRE_SIZE};
use crate::wiring::{Endpoints, Frame};

/// Where the forwarder is in its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwarderState {
    /// No token seen (or seeded) yet.
    WaitingFirst,
    /// Blocked on the read set.
    IdleBlocked,
    /// A token just arrived; logging and forwarding.
    Processing,
}

/// Why a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Every read end closed, or the chosen neighbour was gone.
    Disconnected,
    /// The coordinator asked the worker to stop.
    Interrupted,
}

/// Summary a worker hands back when it is reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub vertex: VertexId,
    /// Rounds in which at least one token arrived.
    pub arrivals: u64,
    /// Last value this worker held, if it ever held the token.
    pub last_token: Option<Token>,
    pub exit: WorkerExit,
}

/// Outcome of one multiplexed wait.
#[derive(Debug)]
enum Readiness {
    /// At most one frame per ready read end, tagged with its dimension.
    Frames(Vec<(Dimension, Frame)>),
    /// No read end can ever become ready again.
    Closed,
}

/// Poll every read end once, collecting a frame from each one that is ready.
fn poll_read_set(inbound: &mut [mpsc::Receiver<Frame>], cx: &mut Context<'_>) -> Poll<Readiness> {
    let mut frames = Vec::new();
    let mut pending = 0usize;

    for (j, rx) in inbound.iter_mut().enumerate() {
        match rx.poll_recv(cx) {
            Poll::Ready(Some(frame)) => frames.push((Dimension(j as u32), frame)),
            Poll::Ready(None) => {}
            Poll::Pending => pending += 1,
        }
    }

    if !frames.is_empty() {
        Poll::Ready(Readiness::Frames(frames))
    } else if pending == 0 {
        Poll::Ready(Readiness::Closed)
    } else {
        Poll::Pending
    }
}

/// The forwarding state machine for one vertex.
pub struct TokenForwarder {
    vertex: VertexId,
    inbound: Vec<mpsc::Receiver<Frame>>,
    outbound: Vec<mpsc::Sender<Frame>>,
    log: ArrivalLog,
    control: watch::Receiver<Control>,
    status: watch::Sender<WorkerStatus>,
    rng: StdRng,
    state: ForwarderState,
    token: Token,
    baseline: Option<Instant>,
    arrivals: u64,
}

impl TokenForwarder {
    /// Assemble a forwarder from the vertex's endpoints and its control wiring.
    pub fn new(
        endpoints: Endpoints,
        log: ArrivalLog,
        control: watch::Receiver<Control>,
        status: watch::Sender<WorkerStatus>,
        rng: StdRng,
    ) -> Self {
        let vertex = endpoints.vertex();
        let (inbound, outbound) = endpoints.into_parts();
        Self {
            vertex,
            inbound,
            outbound,
            log,
            control,
            status,
            rng,
            state: ForwarderState::WaitingFirst,
            token: Token::default(),
            baseline: None,
            arrivals: 0,
        }
    }

    /// Current protocol state.
    pub fn state(&self) -> ForwarderState {
        self.state
    }

    /// Run until the loop exits, then close the artifact.
    pub async fn run(mut self) -> Result<WorkerReport> {
        let outcome = self.forward_loop().await;

        let Self {
            vertex,
            log,
            status,
            state,
            token,
            arrivals,
            ..
        } = self;
        let closed = log.close().await;
        status.send_replace(WorkerStatus::Exited);

        let exit = outcome?;
        closed?;
        Ok(WorkerReport {
            vertex,
            arrivals,
            last_token: (state != ForwarderState::WaitingFirst).then_some(token),
            exit,
        })
    }

    async fn forward_loop(&mut self) -> Result<WorkerExit> {
        if self.vertex.is_origin() {
            // A pause or interrupt that beat the worker's start holds the seed.
            if let Some(exit) = self.hold_while_paused().await {
                return Ok(exit);
            }
            if let Some(exit) = self.seed().await? {
                return Ok(exit);
            }
        }

        loop {
            if let Some(exit) = self.hold_while_paused().await {
                return Ok(exit);
            }

            let readiness = tokio::select! {
                biased;
                changed = self.control.changed() => {
                    if changed.is_err() {
                        return Ok(WorkerExit::Interrupted);
                    }
                    continue;
                }
                readiness = poll_fn(|cx| poll_read_set(&mut self.inbound, cx)) => readiness,
            };

            match readiness {
                Readiness::Closed => {
                    debug!(vertex = %self.vertex, "all read ends closed");
                    return Ok(WorkerExit::Disconnected);
                }
                Readiness::Frames(frames) => {
                    if let Some(exit) = self.process(frames).await? {
                        return Ok(exit);
                    }
                }
            }
        }
    }

    /// Vertex 0 only: create the token and send it off.
    async fn seed(&mut self) -> Result<Option<WorkerExit>> {
        self.baseline = Some(Instant::now());
        self.token = Token::SEED;
        self.state = ForwarderState::IdleBlocked;
        self.log
            .record(&ArrivalEntry::Seed { token: self.token })
            .await?;
        info!(vertex = %self.vertex, token = %self.token, "token seeded");
        Ok(self.forward().await)
    }

    /// Park on the control channel while paused. Returns an exit if the
    /// worker was interrupted or lost its coordinator.
    async fn hold_while_paused(&mut self) -> Option<WorkerExit> {
        loop {
            let control = *self.control.borrow_and_update();
            match control {
                Control::Run => {
                    self.publish(WorkerStatus::Running);
                    return None;
                }
                Control::Interrupt => {
                    debug!(vertex = %self.vertex, "interrupted");
                    return Some(WorkerExit::Interrupted);
                }
                Control::Pause => {
                    self.publish(WorkerStatus::Suspended);
                    if self.control.changed().await.is_err() {
                        return Some(WorkerExit::Interrupted);
                    }
                }
            }
        }
    }

    async fn process(&mut self, frames: Vec<(Dimension, Frame)>) -> Result<Option<WorkerExit>> {
        self.state = ForwarderState::Processing;

        if frames.len() > 1 {
            warn!(
                vertex = %self.vertex,
                ready = frames.len(),
                "several read ends ready in one round; counter advances once from the last frame"
            );
        }

        let mut received = self.token;
        for (dimension, frame) in &frames {
            received = Token::decode(frame).ok_or(Error::Protocol {
                vertex: self.vertex,
                expected: TOKEN_WIRE_SIZE,
                actual: frame.len(),
            })?;
            trace!(vertex = %self.vertex, %dimension, token = %received, "frame received");
        }

        self.token = received.next();
        self.arrivals += 1;

        let now = Instant::now();
        let entry = match self.baseline.replace(now) {
            None => ArrivalEntry::FirstReceived { token: self.token },
            Some(previous) => ArrivalEntry::Forwarded {
                token: self.token,
                elapsed_us: u64::try_from(now.duration_since(previous).as_micros())
                    .unwrap_or(u64::MAX),
            },
        };
        self.log.record(&entry).await?;
        debug!(vertex = %self.vertex, %entry, "arrival");

        let exit = self.forward().await;
        self.state = ForwarderState::IdleBlocked;
        Ok(exit)
    }

    /// Send the current token along a random edge.
    async fn forward(&mut self) -> Option<WorkerExit> {
        if self.outbound.is_empty() {
            warn!(vertex = %self.vertex, token = %self.token, "no neighbours; token stays here");
            return None;
        }

        let j = self.rng.gen_range(0..self.outbound.len());
        if self.outbound[j].send(self.token.encode()).await.is_err() {
            debug!(vertex = %self.vertex, dimension = j, "neighbour gone");
            return Some(WorkerExit::Disconnected);
        }
        trace!(vertex = %self.vertex, dimension = j, token = %self.token, "forwarded");
        None
    }

    fn publish(&self, status: WorkerStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}
