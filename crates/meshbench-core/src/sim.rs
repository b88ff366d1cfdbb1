//! Single-threaded discrete-event simulator.
//!
//! Owns the node population, the topology, the event queue and the
//! measurement state. `run_to_completion` pops events in timestamp order
//! (FIFO within an instant) and executes each handler to completion
//! before the next; there is no preemption and no event cancellation, so
//! handlers guard at execution time instead.
//!
//! The network stack itself is modelled deterministically: requests
//! schedule their completion events at fixed latencies, and completions
//! read the world as it stands when they fire.

use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::accounting::{PacketAccounting, TaggedPacket, TrafficReport};
use crate::address::{NodeRole, PanId, ShortAddress};
use crate::bootstrap::{BootstrapOrchestrator, BootstrapState};
use crate::error::{HarnessError, HarnessResult};
use crate::event::{Event, ScheduledEvent, SequenceNumber};
use crate::nwk::{
    AddressMode, DataRequest, JoinConfirm, JoinRequest, NeighborEntry, NetworkDescriptor,
    NetworkDiscoveryConfirm, NetworkFormationConfirm, NodeStack, NwkStatus,
    RouteDiscoveryConfirm, RouteEntry,
};
use crate::time::{SimDuration, SimTime};
use crate::topology::Topology;
use crate::trace::{self, TraceOutcome, TraceReport};
use crate::traffic::StreamConfig;

/// Fixed service times of the modelled network stack.
#[derive(Debug, Clone, Copy)]
pub struct StackLatencies {
    /// Formation request to formation complete.
    pub formation: SimDuration,
    /// Per scan-duration unit of a discovery scan.
    pub scan_step: SimDuration,
    /// Join request to association complete.
    pub join: SimDuration,
}

impl Default for StackLatencies {
    fn default() -> Self {
        StackLatencies {
            formation: SimDuration::from_millis(100),
            scan_step: SimDuration::from_millis(250),
            join: SimDuration::from_millis(200),
        }
    }
}

/// What one full run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub end_time: SimTime,
    pub bootstrap_complete: bool,
    pub report: Option<TrafficReport>,
    pub trace_outcome: Option<TraceOutcome>,
}

#[derive(Debug)]
pub struct Simulator {
    nodes: Vec<NodeStack>,
    topology: Topology,
    orchestrator: BootstrapOrchestrator,
    queue: BinaryHeap<ScheduledEvent>,
    next_seq: SequenceNumber,
    now: SimTime,
    rng: StdRng,
    latencies: StackLatencies,
    /// Uniform extra delivery delay drawn per packet, zero disables.
    delivery_jitter: SimDuration,
    /// Packet ids to silently drop in flight, for loss injection.
    dropped_ids: HashSet<u32>,
    stream: Option<StreamConfig>,
    next_short: u16,
    accounting: PacketAccounting,
    report: Option<TrafficReport>,
    last_trace: Option<TraceReport>,
}

impl Simulator {
    pub fn new(
        nodes: Vec<NodeStack>,
        topology: Topology,
        orchestrator: BootstrapOrchestrator,
        seed: u64,
    ) -> Self {
        Simulator {
            nodes,
            topology,
            orchestrator,
            queue: BinaryHeap::new(),
            next_seq: 0,
            now: SimTime::ZERO,
            rng: StdRng::seed_from_u64(seed),
            latencies: StackLatencies::default(),
            delivery_jitter: SimDuration::ZERO,
            dropped_ids: HashSet::new(),
            stream: None,
            next_short: 0x0001,
            accounting: PacketAccounting::new(),
            report: None,
            last_trace: None,
        }
    }

    pub fn set_latencies(&mut self, latencies: StackLatencies) {
        self.latencies = latencies;
    }

    pub fn set_delivery_jitter(&mut self, jitter: SimDuration) {
        self.delivery_jitter = jitter;
    }

    pub fn set_dropped_ids(&mut self, ids: impl IntoIterator<Item = u32>) {
        self.dropped_ids = ids.into_iter().collect();
    }

    pub fn set_stream(&mut self, stream: StreamConfig) {
        self.stream = Some(stream);
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn node(&self, index: usize) -> HarnessResult<&NodeStack> {
        self.nodes.get(index).ok_or(HarnessError::UnknownNode(index))
    }

    pub fn node_mut(&mut self, index: usize) -> HarnessResult<&mut NodeStack> {
        self.nodes.get_mut(index).ok_or(HarnessError::UnknownNode(index))
    }

    pub fn nodes(&self) -> &[NodeStack] {
        &self.nodes
    }

    pub fn bootstrap_state(&self, node: usize) -> BootstrapState {
        self.orchestrator.state(node)
    }

    pub fn accounting(&self) -> &PacketAccounting {
        &self.accounting
    }

    pub fn report(&self) -> Option<&TrafficReport> {
        self.report.as_ref()
    }

    pub fn last_trace(&self) -> Option<&TraceReport> {
        self.last_trace.as_ref()
    }

    /// Place an event on the timeline.
    pub fn schedule(&mut self, at: SimTime, event: Event) {
        debug_assert!(at >= self.now, "event scheduled in the past");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledEvent { time: at, seq, event });
    }

    pub fn schedule_in(&mut self, delay: SimDuration, event: Event) {
        self.schedule(self.now + delay, event);
    }

    /// Drain the timeline. Stops early with an error when a fatal
    /// bootstrap failure surfaces; later events stay unprocessed.
    pub fn run_to_completion(&mut self) -> HarnessResult<SimTime> {
        while let Some(scheduled) = self.queue.pop() {
            self.now = scheduled.time;
            self.process(scheduled.event)?;
        }
        Ok(self.now)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            end_time: self.now,
            bootstrap_complete: self.orchestrator.all_bootstrapped(),
            report: self.report.clone(),
            trace_outcome: self.last_trace.as_ref().map(|t| t.outcome),
        }
    }

    fn process(&mut self, event: Event) -> HarnessResult<()> {
        match event {
            Event::FormNetwork { node, params } => {
                debug!(time = %self.now, node, duration = params.scan_duration, "formation requested");
                self.orchestrator.note_formation_started(node);
                let latency = self.latencies.formation
                    + self.latencies.scan_step * params.scan_duration as u32;
                self.schedule_in(latency, Event::FormationComplete { node });
            }
            Event::FormationComplete { node } => self.formation_complete(node)?,
            Event::StartDiscovery { node, params } => {
                debug!(time = %self.now, node, "discovery scan started");
                self.orchestrator.note_discovery_started(node);
                let latency = self.latencies.scan_step * (params.scan_duration as u32 + 1);
                self.schedule_in(latency, Event::ScanComplete { node });
            }
            Event::ScanComplete { node } => self.scan_complete(node)?,
            Event::Join { node, params } => {
                debug!(time = %self.now, node, "join requested");
                self.schedule_in(self.latencies.join, Event::AssociationComplete { node, params });
            }
            Event::AssociationComplete { node, params } => self.association_complete(node, &params),
            Event::StartRouter { node } => {
                let now = self.now;
                let stack = self.node_mut(node)?;
                stack.start_router();
                let short = stack.short_address();
                info!(time = %now, node, %short, "router active");
                self.orchestrator.note_router_started(node);
            }
            Event::StreamSend { index } => self.stream_send(index),
            Event::DataDelivery { node, packet } => self.data_delivery(node, packet),
            Event::RouteDiscoveryNotice { node, confirm } => {
                debug!(time = %self.now, node, status = %confirm.status, "route discovery confirm");
            }
            Event::PrintTables { node } => self.print_tables(node)?,
            Event::TraceRoute { src, dst } => self.trace_route(src, dst)?,
            Event::ComputeReport => {
                let report = self.accounting.compute();
                println!("{report}");
                if self.accounting.outstanding() > 0 {
                    warn!(
                        outstanding = self.accounting.outstanding(),
                        "packets still in flight or lost at report time"
                    );
                }
                self.report = Some(report);
            }
        }
        Ok(())
    }

    fn formation_complete(&mut self, node: usize) -> HarnessResult<()> {
        let coordinator = self.nodes[node].role() == NodeRole::Coordinator;
        let status = if coordinator { NwkStatus::Success } else { NwkStatus::InvalidRequest };

        if status.is_success() {
            let pan = PanId::from_u64(self.nodes[node].extended_address().to_u64());
            self.nodes[node].form_network(pan);
            println!(
                "{} Node {} | NetworkFormationConfirm: {} | PAN {}",
                self.now, node, status, pan
            );
        } else {
            println!("{} Node {} | NetworkFormationConfirm: {}", self.now, node, status);
        }

        self.orchestrator
            .handle_formation_confirm(node, &NetworkFormationConfirm { status })
    }

    /// Gather the networks audible at scan end: one descriptor per PAN
    /// advertised by an in-range active relay.
    fn scan_complete(&mut self, node: usize) -> HarnessResult<()> {
        let mut seen: HashMap<u64, NetworkDescriptor> = HashMap::new();
        for other in self.topology.neighbors(node) {
            let stack = &self.nodes[other];
            if !stack.is_relay_active() {
                continue;
            }
            if let Some(pan) = stack.pan() {
                seen.entry(pan.to_u64()).or_insert(NetworkDescriptor {
                    extended_pan_id: pan,
                    pan_id: pan.to_u64() as u16,
                    channel: 11,
                });
            }
        }

        let confirm = if seen.is_empty() {
            NetworkDiscoveryConfirm { status: NwkStatus::NoNetworks, descriptors: Vec::new() }
        } else {
            let mut descriptors: Vec<_> = seen.into_values().collect();
            descriptors.sort_by_key(|d| d.extended_pan_id.to_u64());
            NetworkDiscoveryConfirm { status: NwkStatus::Success, descriptors }
        };

        println!(
            "{} Node {} | NetworkDiscoveryConfirm: {} | networks found: {}",
            self.now,
            node,
            confirm.status,
            confirm.descriptors.len()
        );
        for d in &confirm.descriptors {
            println!("    ExtPanId {} | PanId {:#06X} | channel {}", d.extended_pan_id, d.pan_id, d.channel);
        }

        let join = self.orchestrator.handle_discovery_confirm(node, &confirm)?;
        self.schedule(self.now, Event::Join { node, params: join });
        Ok(())
    }

    /// Association resolves against the world as it stands now: the
    /// nearest in-range active relay on the requested PAN becomes the
    /// parent. No candidate means the join is refused.
    fn association_complete(&mut self, node: usize, params: &JoinRequest) {
        let parent = self
            .topology
            .neighbors(node)
            .into_iter()
            .filter(|&other| {
                let stack = &self.nodes[other];
                stack.is_relay_active() && stack.pan() == Some(params.extended_pan_id)
            })
            .min_by(|&a, &b| {
                let da = self.topology.distance(node, a);
                let db = self.topology.distance(node, b);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });

        let confirm = match parent {
            Some(parent_idx) => {
                let parent_short = self.nodes[parent_idx].short_address();
                let short = ShortAddress::from_u16(self.next_short);
                self.next_short += 1;
                self.nodes[node].join_network(short, params.extended_pan_id, parent_short);
                self.link_neighbors(node);
                JoinConfirm {
                    status: NwkStatus::Success,
                    short_address: short,
                    extended_pan_id: params.extended_pan_id,
                }
            }
            None => JoinConfirm {
                status: NwkStatus::NotPermitted,
                short_address: ShortAddress::BROADCAST,
                extended_pan_id: params.extended_pan_id,
            },
        };

        println!(
            "{} Node {} | JoinConfirm: {} | short address [{}] | ExtPanId {}",
            self.now, node, confirm.status, confirm.short_address, confirm.extended_pan_id
        );

        if self.orchestrator.handle_join_confirm(node, &confirm) {
            self.schedule(self.now, Event::StartRouter { node });
        }
    }

    /// Populate mutual neighbor table entries between a freshly joined
    /// node and every joined node it shares a link with.
    fn link_neighbors(&mut self, node: usize) {
        let own = NeighborEntry {
            short: self.nodes[node].short_address(),
            extended: self.nodes[node].extended_address(),
            relay: self.nodes[node].role().can_route(),
        };
        for other in self.topology.neighbors(node) {
            if !self.nodes[other].is_joined() {
                continue;
            }
            let theirs = NeighborEntry {
                short: self.nodes[other].short_address(),
                extended: self.nodes[other].extended_address(),
                relay: self.nodes[other].role().can_route(),
            };
            self.nodes[other].add_neighbor(own);
            self.nodes[node].add_neighbor(theirs);
        }
    }

    fn stream_send(&mut self, index: u32) {
        let Some(cfg) = self.stream else { return };

        let id = self.accounting.allocate_id();
        self.accounting.record_send(id, self.now);
        let packet = TaggedPacket { id, payload_len: cfg.payload_len };

        let src = cfg.source;
        debug!(time = %self.now, index, %id, src, dst = cfg.destination, "stream dispatch");

        if !self.nodes[src].is_joined() {
            warn!(time = %self.now, node = src, "sender outside the mesh, packet lost");
            return;
        }
        let request = DataRequest {
            dst_addr: self.nodes[cfg.destination].short_address(),
            addr_mode: AddressMode::UnicastOrBroadcast,
            discover_route: true,
            handle: (index & 0xFF) as u8,
        };
        self.dispatch_data(src, request, packet);
    }

    /// Route a payload per its data request. The destination address is
    /// resolved against the joined population; the all-ones pattern
    /// (which an unjoined destination still carries) goes out as a
    /// broadcast instead.
    fn dispatch_data(&mut self, src: usize, request: DataRequest, packet: TaggedPacket) {
        debug_assert_eq!(request.addr_mode, AddressMode::UnicastOrBroadcast);
        debug!(time = %self.now, src, dst_addr = %request.dst_addr, handle = request.handle, "data request");
        if request.dst_addr.is_broadcast() {
            self.broadcast(src, packet);
            return;
        }
        let Some(dst) = self
            .nodes
            .iter()
            .position(|n| n.is_joined() && n.short_address() == request.dst_addr)
        else {
            warn!(time = %self.now, addr = %request.dst_addr, "no node behind destination address, packet lost");
            return;
        };
        let id = packet.id;

        let route = if request.discover_route || self.nodes[src].has_route(request.dst_addr) {
            self.route_path(src, dst)
        } else {
            None
        };
        match route {
            Some(path) => {
                let discovered = self.install_route(&path, request.dst_addr);
                if discovered {
                    self.schedule_in(
                        SimDuration::from_micros(1),
                        Event::RouteDiscoveryNotice {
                            node: src,
                            confirm: RouteDiscoveryConfirm { status: NwkStatus::Success },
                        },
                    );
                }
                let hops = (path.len() - 1) as u32;
                let delay = self.topology.hop_delay() * hops + self.draw_jitter();
                if self.dropped_ids.contains(&id.to_u32()) {
                    debug!(%id, "packet dropped in flight");
                } else {
                    self.schedule_in(delay, Event::DataDelivery { node: dst, packet });
                }
            }
            None => {
                warn!(time = %self.now, src, dst, "no route to destination, packet lost");
                self.schedule_in(
                    SimDuration::from_micros(1),
                    Event::RouteDiscoveryNotice {
                        node: src,
                        confirm: RouteDiscoveryConfirm { status: NwkStatus::RouteDiscoveryFailed },
                    },
                );
            }
        }
    }

    /// Flood delivery for an unresolved destination address: every
    /// joined node reachable through the relay graph hears the packet.
    /// Accounting still matches the id exactly once; later receptions
    /// count as orphans.
    fn broadcast(&mut self, src: usize, packet: TaggedPacket) {
        warn!(time = %self.now, node = src, "destination unresolved, sending as broadcast");
        let reachable: Vec<(usize, u32)> = (0..self.nodes.len())
            .filter(|&n| n != src && self.nodes[n].is_joined())
            .filter_map(|n| self.route_path(src, n).map(|p| (n, (p.len() - 1) as u32)))
            .collect();
        for (node, hops) in reachable {
            let delay = self.topology.hop_delay() * hops + self.draw_jitter();
            self.schedule_in(delay, Event::DataDelivery { node, packet });
        }
    }

    fn draw_jitter(&mut self) -> SimDuration {
        if self.delivery_jitter.is_zero() {
            SimDuration::ZERO
        } else {
            SimDuration::from_micros(self.rng.gen_range(0..=self.delivery_jitter.as_micros()))
        }
    }

    /// Shortest usable path from `src` to `dst` over the joined
    /// population. Interior hops must be active relays; only the
    /// endpoints may be leaves.
    fn route_path(&self, src: usize, dst: usize) -> Option<Vec<usize>> {
        if src == dst {
            return Some(vec![src]);
        }
        let mut prev: HashMap<usize, usize> = HashMap::new();
        let mut frontier = VecDeque::from([src]);
        while let Some(current) = frontier.pop_front() {
            for next in self.topology.neighbors(current) {
                if prev.contains_key(&next) || next == src {
                    continue;
                }
                if !self.nodes[next].is_joined() {
                    continue;
                }
                if next != dst && !self.nodes[next].is_relay_active() {
                    continue;
                }
                prev.insert(next, current);
                if next == dst {
                    let mut path = vec![dst];
                    let mut at = dst;
                    while at != src {
                        at = prev[&at];
                        path.push(at);
                    }
                    path.reverse();
                    return Some(path);
                }
                frontier.push_back(next);
            }
        }
        None
    }

    /// Install forwarding entries for `dst_short` along a path. Returns
    /// true when any node learned a route it did not already have.
    fn install_route(&mut self, path: &[usize], dst_short: ShortAddress) -> bool {
        let mut learned = false;
        for window in path.windows(2) {
            let (here, next) = (window[0], window[1]);
            if self.nodes[here].has_route(dst_short) {
                continue;
            }
            let next_short = self.nodes[next].short_address();
            self.nodes[here]
                .set_route(dst_short, RouteEntry { next_hop: next_short, is_neighbor: true });
            learned = true;
        }
        learned
    }

    fn data_delivery(&mut self, node: usize, packet: TaggedPacket) {
        if !packet.id.is_valid() {
            self.accounting.record_untagged();
            println!("{} Node {} | DataIndication: packet arrived without a tag", self.now, node);
            return;
        }
        match self.accounting.record_receive(packet.id, self.now) {
            Some(delay) => {
                println!(
                    "{} Node {} | DataIndication: received packet id {} | delay {}",
                    self.now, node, packet.id, delay
                );
            }
            None => {
                println!(
                    "{} Node {} | DataIndication: packet id {} has no send record",
                    self.now, node, packet.id
                );
            }
        }
    }

    fn print_tables(&mut self, node: usize) -> HarnessResult<()> {
        let stack = self.node(node)?;
        let mut out = String::new();
        stack
            .write_neighbor_table(&mut out)
            .and_then(|_| stack.write_routing_table(&mut out))
            .map_err(|e| HarnessError::InvalidConfig(format!("table rendering failed: {e}")))?;
        print!("{out}");
        Ok(())
    }

    fn trace_route(&mut self, src: usize, dst: usize) -> HarnessResult<()> {
        let src_short = self.node(src)?.short_address();
        let dst_short = self.node(dst)?.short_address();
        let report = trace::trace_route(&self.nodes, src_short, dst_short);
        println!("{report}");
        self.last_trace = Some(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::PacketId;
    use crate::address::{ExtendedAddress, NodeRole};
    use crate::bootstrap::StartupPlan;
    use crate::nwk::{NetworkDiscoveryRequest, NetworkFormationRequest};
    use crate::topology::Position;

    /// Coordinator, router, end device in a line; only adjacent pairs
    /// are in range.
    fn chain_sim() -> Simulator {
        let roles = [NodeRole::Coordinator, NodeRole::Router, NodeRole::EndDevice];
        let positions = vec![
            Position::new(0.0, 0.0),
            Position::new(60.0, 0.0),
            Position::new(120.0, 0.0),
        ];
        let nodes: Vec<NodeStack> = roles
            .iter()
            .enumerate()
            .map(|(i, &role)| NodeStack::new(i, ExtendedAddress::from_u64(i as u64 + 1), role))
            .collect();
        let topology = Topology::new(positions, 80.0, SimDuration::from_millis(3));
        let plan = StartupPlan::staggered(1..3, SimDuration::from_secs(3), SimDuration::from_secs(1));
        let orchestrator = BootstrapOrchestrator::new(roles.to_vec(), 0, plan.clone());
        let mut sim = Simulator::new(nodes, topology, orchestrator, 7);
        sim.schedule(
            SimTime::from_secs(1),
            Event::FormNetwork { node: 0, params: NetworkFormationRequest::default() },
        );
        for &(node, delay) in plan.entries() {
            sim.schedule(
                SimTime::ZERO + delay,
                Event::StartDiscovery { node, params: NetworkDiscoveryRequest::default() },
            );
        }
        sim
    }

    #[test]
    fn chain_bootstraps_fully() {
        let mut sim = chain_sim();
        sim.run_to_completion().unwrap();
        assert!(sim.summary().bootstrap_complete);
        assert_eq!(sim.bootstrap_state(0), BootstrapState::NetworkFormed);
        assert_eq!(sim.bootstrap_state(1), BootstrapState::RouterActive);
        assert_eq!(sim.bootstrap_state(2), BootstrapState::Joined);
        // Short addresses handed out in join order.
        assert_eq!(sim.node(1).unwrap().short_address(), ShortAddress::from_u16(1));
        assert_eq!(sim.node(2).unwrap().short_address(), ShortAddress::from_u16(2));
        assert_eq!(sim.node(2).unwrap().parent(), Some(ShortAddress::from_u16(1)));
    }

    #[test]
    fn stream_over_chain_is_delivered_with_summed_hop_delay() {
        let mut sim = chain_sim();
        let mut stream = StreamConfig::new(0, 2);
        stream.start = SimTime::from_secs(8);
        stream.interval = SimDuration::from_secs(1);
        stream.count = 1;
        sim.set_stream(stream);
        sim.schedule(stream.send_time(0), Event::StreamSend { index: 0 });
        sim.schedule(stream.report_time(), Event::ComputeReport);
        sim.run_to_completion().unwrap();

        let report = sim.report().unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(report.received, 1);
        assert_eq!(report.pdr, Some(1.0));
        // Two hops at 3 ms each, no jitter configured.
        assert_eq!(report.avg_delay, Some(SimDuration::from_millis(6)));
        assert_eq!(report.jitter_secs, Some(0.0));
    }

    #[test]
    fn dropped_packet_counts_against_pdr() {
        let mut sim = chain_sim();
        sim.set_dropped_ids([2]);
        let mut stream = StreamConfig::new(0, 2);
        stream.start = SimTime::from_secs(8);
        stream.interval = SimDuration::from_millis(500);
        stream.count = 3;
        sim.set_stream(stream);
        for i in 0..stream.count {
            sim.schedule(stream.send_time(i), Event::StreamSend { index: i });
        }
        sim.schedule(stream.report_time(), Event::ComputeReport);
        sim.run_to_completion().unwrap();

        let report = sim.report().unwrap();
        assert_eq!(report.sent, 3);
        assert_eq!(report.received, 2);
        assert_eq!(sim.accounting().outstanding(), 1);
    }

    #[test]
    fn trace_follows_installed_routes() {
        let mut sim = chain_sim();
        let mut stream = StreamConfig::new(0, 2);
        stream.start = SimTime::from_secs(8);
        stream.count = 1;
        sim.set_stream(stream);
        sim.schedule(stream.send_time(0), Event::StreamSend { index: 0 });
        sim.schedule(SimTime::from_secs(9), Event::TraceRoute { src: 0, dst: 2 });
        sim.run_to_completion().unwrap();

        let trace = sim.last_trace().unwrap();
        assert_eq!(trace.outcome, TraceOutcome::DestinationReached);
        assert_eq!(trace.hops.len(), 2);
    }

    #[test]
    fn trace_before_join_is_skipped() {
        let mut sim = chain_sim();
        // End device has not joined at 2s.
        sim.schedule(SimTime::from_secs(2), Event::TraceRoute { src: 0, dst: 2 });
        sim.run_to_completion().unwrap();
        let trace = sim.last_trace().unwrap();
        assert_eq!(trace.outcome, TraceOutcome::Skipped);
    }

    #[test]
    fn untagged_delivery_is_tallied_separately() {
        let mut sim = chain_sim();
        // A payload whose tag did not survive transit arrives with the
        // reserved zero id.
        let packet = TaggedPacket { id: PacketId::INVALID, payload_len: 5 };
        sim.schedule(SimTime::from_secs(6), Event::DataDelivery { node: 2, packet });
        sim.run_to_completion().unwrap();

        let report = sim.accounting().compute();
        assert_eq!(report.untagged, 1);
        assert_eq!(report.received, 0);
        assert_eq!(report.orphans, 0);
        assert!(report.avg_delay.is_none());
    }

    #[test]
    fn unknown_node_index_is_reported() {
        let mut sim = chain_sim();
        sim.schedule(SimTime::from_secs(20), Event::TraceRoute { src: 0, dst: 99 });
        let err = sim.run_to_completion().unwrap_err();
        assert_eq!(err, HarnessError::UnknownNode(99));
    }
}
