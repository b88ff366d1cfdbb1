//! Hop-by-hop route tracing.
//!
//! Walks the forwarding state actually installed in node routing tables,
//! one resolution per hop, from a source address toward a destination.
//! The walk is read-only and bounded: a hop cap catches runaway paths
//! and a per-node visit counter catches forwarding loops, so every trace
//! terminates with a distinct outcome even over inconsistent tables.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::address::{ExtendedAddress, ShortAddress};
use crate::nwk::NodeStack;

/// Upper bound on path length before the walk gives up.
pub const MAX_HOPS: usize = 16;

/// Number of visits to one node that declares a forwarding loop.
pub const LOOP_THRESHOLD: usize = 3;

/// How a trace ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// Walk arrived at the destination address.
    DestinationReached,
    /// A node on the path had no route toward the destination.
    Unreachable,
    /// Some node was visited [`LOOP_THRESHOLD`] times.
    LoopDetected,
    /// Path exceeded [`MAX_HOPS`] resolutions.
    HopLimitExceeded,
    /// An address on the path maps to no known node.
    NodeNotFound,
    /// Trace skipped because an endpoint never joined the network.
    Skipped,
}

impl fmt::Display for TraceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceOutcome::DestinationReached => "destination reached",
            TraceOutcome::Unreachable => "destination unreachable",
            TraceOutcome::LoopDetected => "routing loop detected",
            TraceOutcome::HopLimitExceeded => "hop limit exceeded",
            TraceOutcome::NodeNotFound => "node not found",
            TraceOutcome::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// One resolution step of a trace.
#[derive(Debug, Clone, Copy)]
pub struct TraceHop {
    pub node: usize,
    pub short: ShortAddress,
    pub extended: ExtendedAddress,
    pub next_hop: ShortAddress,
    pub via_neighbor: bool,
}

/// Full record of one trace run.
#[derive(Debug, Clone)]
pub struct TraceReport {
    pub src: ShortAddress,
    pub dst: ShortAddress,
    pub hops: Vec<TraceHop>,
    pub outcome: TraceOutcome,
}

impl fmt::Display for TraceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Traceroute from [{}] to [{}]:", self.src, self.dst)?;
        for (i, hop) in self.hops.iter().enumerate() {
            write!(f, "{}. Node {} [{} | {}]: ", i + 1, hop.node, hop.short, hop.extended)?;
            if hop.next_hop.is_broadcast() {
                writeln!(f, "Destination Unreachable")?;
            } else {
                writeln!(
                    f,
                    "NextHop [{}]{}",
                    hop.next_hop,
                    if hop.via_neighbor { " (*Neighbor)" } else { "" }
                )?;
            }
        }
        writeln!(f, "Trace result: {}", self.outcome)
    }
}

fn stack_by_short(stacks: &[NodeStack], short: ShortAddress) -> Option<&NodeStack> {
    stacks.iter().find(|s| s.is_joined() && s.short_address() == short)
}

/// Walk installed forwarding state from `src` toward `dst`.
///
/// Endpoints that still carry the unassigned address pattern make the
/// walk meaningless (the sentinel doubles as broadcast), so such traces
/// are skipped outright rather than reported as unreachable.
pub fn trace_route(stacks: &[NodeStack], src: ShortAddress, dst: ShortAddress) -> TraceReport {
    if src.is_unassigned() || dst.is_unassigned() {
        warn!(%src, %dst, "trace endpoints not resolved, skipping trace");
        return TraceReport { src, dst, hops: Vec::new(), outcome: TraceOutcome::Skipped };
    }

    let mut hops = Vec::new();
    let mut visits: HashMap<ShortAddress, usize> = HashMap::new();
    let mut current = src;

    let outcome = loop {
        if current == dst {
            break TraceOutcome::DestinationReached;
        }
        if hops.len() >= MAX_HOPS {
            break TraceOutcome::HopLimitExceeded;
        }

        let seen = visits.entry(current).or_insert(0);
        *seen += 1;
        if *seen >= LOOP_THRESHOLD {
            break TraceOutcome::LoopDetected;
        }

        let Some(stack) = stack_by_short(stacks, current) else {
            warn!(addr = %current, "trace reached an address with no node behind it");
            break TraceOutcome::NodeNotFound;
        };

        let (next_hop, via_neighbor) = stack.find_route(dst);
        hops.push(TraceHop {
            node: stack.index(),
            short: current,
            extended: stack.extended_address(),
            next_hop,
            via_neighbor,
        });

        if next_hop.is_broadcast() {
            break TraceOutcome::Unreachable;
        }
        current = next_hop;
    };

    TraceReport { src, dst, hops, outcome }
}
