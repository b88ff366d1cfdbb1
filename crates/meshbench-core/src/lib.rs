//! # meshbench-core
//!
//! Measurement harness for multi-hop mesh networks, driven by a
//! single-threaded discrete-event timeline.
//!
//! A run brings a node population through a Zigbee-style staged
//! bootstrap (formation, staggered discovery, association, router
//! start), pushes a tagged synthetic traffic stream across the mesh,
//! and reports packet delivery ratio, end-to-end latency and jitter.
//! A hop-by-hop path tracer walks the forwarding state the run actually
//! installed, with bounded loop detection.
//!
//! ## Example
//!
//! ```no_run
//! use meshbench_core::prelude::*;
//!
//! let summary = ScenarioBuilder::ten_node().run().unwrap();
//! assert!(summary.bootstrap_complete);
//! ```

pub mod accounting;
pub mod address;
pub mod bootstrap;
pub mod error;
pub mod event;
pub mod nwk;
pub mod scenario;
pub mod sim;
pub mod time;
pub mod topology;
pub mod trace;
pub mod traffic;

pub use accounting::{PacketAccounting, PacketId, TaggedPacket, TrafficReport};
pub use address::{ExtendedAddress, NodeRole, PanId, ShortAddress};
pub use bootstrap::{BootstrapOrchestrator, BootstrapState, StartupPlan};
pub use error::{HarnessError, HarnessResult};
pub use event::{Event, ScheduledEvent, SequenceNumber};
pub use nwk::{NodeStack, NwkStatus};
pub use scenario::{NodeSpec, ScenarioBuilder};
pub use sim::{RunSummary, Simulator, StackLatencies};
pub use time::{SimDuration, SimTime};
pub use topology::{Position, Topology};
pub use trace::{trace_route, TraceOutcome, TraceReport, LOOP_THRESHOLD, MAX_HOPS};
pub use traffic::StreamConfig;

/// Common imports for harness users.
pub mod prelude {
    pub use crate::accounting::{PacketId, TrafficReport};
    pub use crate::address::{ExtendedAddress, NodeRole, ShortAddress};
    pub use crate::bootstrap::{BootstrapState, StartupPlan};
    pub use crate::error::{HarnessError, HarnessResult};
    pub use crate::scenario::{NodeSpec, ScenarioBuilder};
    pub use crate::sim::{RunSummary, Simulator, StackLatencies};
    pub use crate::time::{SimDuration, SimTime};
    pub use crate::topology::Position;
    pub use crate::trace::TraceOutcome;
    pub use crate::traffic::StreamConfig;
}
