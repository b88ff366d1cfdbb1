//! Event queue primitives.
//!
//! The timeline is a min-heap of [`ScheduledEvent`]s ordered by time.
//! Events scheduled for the same instant pop in insertion order, carried
//! by a monotonically increasing sequence number. That FIFO tie-break is
//! load-bearing: several bootstrap steps are scheduled for the same
//! instant and must observe each other's side effects in order.

use std::cmp::Ordering;

use crate::accounting::TaggedPacket;
use crate::nwk::{JoinRequest, NetworkDiscoveryRequest, NetworkFormationRequest, RouteDiscoveryConfirm};
use crate::time::SimTime;

/// Everything that can happen on the timeline. Nodes are referenced by
/// stable population index, never by address, so events stay valid for
/// nodes that have not joined yet.
#[derive(Debug, Clone)]
pub enum Event {
    /// Coordinator begins network formation.
    FormNetwork { node: usize, params: NetworkFormationRequest },
    /// Formation finished; success opens the network.
    FormationComplete { node: usize },
    /// Node begins scanning for joinable networks.
    StartDiscovery { node: usize, params: NetworkDiscoveryRequest },
    /// Scan window elapsed; descriptors are gathered now.
    ScanComplete { node: usize },
    /// Node asks to join a discovered network.
    Join { node: usize, params: JoinRequest },
    /// Association handshake finished.
    AssociationComplete { node: usize, params: JoinRequest },
    /// Freshly joined router begins relaying.
    StartRouter { node: usize },
    /// Traffic stream dispatches its next payload.
    StreamSend { index: u32 },
    /// A routed payload arrives at a node.
    DataDelivery { node: usize, packet: TaggedPacket },
    /// Route discovery outcome reported back to the sender.
    RouteDiscoveryNotice { node: usize, confirm: RouteDiscoveryConfirm },
    /// Dump a node's neighbor and routing tables.
    PrintTables { node: usize },
    /// Walk the forwarding path between two nodes.
    TraceRoute { src: usize, dst: usize },
    /// Fold the accounting ledger into the final report.
    ComputeReport,
}

/// Monotonic tie-breaker for events at the same instant.
pub type SequenceNumber = u64;

/// An event bound to its execution time, ordered for a min-heap.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub time: SimTime,
    pub seq: SequenceNumber,
    pub event: Event,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

impl Ord for ScheduledEvent {
    // Reversed so BinaryHeap pops the earliest event first, FIFO within
    // an instant.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
