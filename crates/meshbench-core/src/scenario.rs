//! Scenario assembly.
//!
//! A scenario is the full description of one measurement run: the node
//! population and layout, the bring-up schedule, the traffic stream and
//! the observation points. [`ScenarioBuilder`] validates the description
//! and loads the whole timeline before the first event fires.

use crate::address::{ExtendedAddress, NodeRole};
use crate::bootstrap::{BootstrapOrchestrator, StartupPlan};
use crate::error::{HarnessError, HarnessResult};
use crate::event::Event;
use crate::nwk::{NetworkDiscoveryRequest, NetworkFormationRequest, NodeStack};
use crate::sim::{RunSummary, Simulator, StackLatencies};
use crate::time::{SimDuration, SimTime};
use crate::topology::{ten_node_layout, Position, Topology};
use crate::traffic::StreamConfig;

/// One device in a scenario.
#[derive(Debug, Clone, Copy)]
pub struct NodeSpec {
    pub role: NodeRole,
    pub position: Position,
    pub extended: ExtendedAddress,
}

impl NodeSpec {
    pub fn new(role: NodeRole, position: Position, extended: ExtendedAddress) -> Self {
        NodeSpec { role, position, extended }
    }
}

/// Builder for a complete measurement run.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    specs: Vec<NodeSpec>,
    range: f64,
    hop_delay: SimDuration,
    delivery_jitter: SimDuration,
    latencies: StackLatencies,
    seed: u64,
    formation_at: SimTime,
    plan: Option<StartupPlan>,
    discovery: NetworkDiscoveryRequest,
    formation: NetworkFormationRequest,
    /// Traffic is opt-in: no stream means no sends and no report.
    stream: Option<StreamConfig>,
    /// Node whose tables are dumped before the report.
    inspect: usize,
    dropped: Vec<u32>,
    trace_enabled: bool,
}

impl ScenarioBuilder {
    pub fn new(specs: Vec<NodeSpec>) -> Self {
        ScenarioBuilder {
            specs,
            range: 120.0,
            hop_delay: SimDuration::from_millis(3),
            delivery_jitter: SimDuration::from_millis(2),
            latencies: StackLatencies::default(),
            seed: 42,
            formation_at: SimTime::from_secs(1),
            plan: None,
            discovery: NetworkDiscoveryRequest::default(),
            formation: NetworkFormationRequest::default(),
            stream: None,
            inspect: 0,
            dropped: Vec::new(),
            trace_enabled: true,
        }
    }

    /// Reference scenario: the ten-node layout, a 200-packet stream from
    /// router 4 to end device 6, tables and trace inspected at router 1.
    pub fn ten_node() -> Self {
        let specs = ten_node_layout()
            .into_iter()
            .enumerate()
            .map(|(i, (role, position))| {
                let extended = if role == NodeRole::Coordinator {
                    ExtendedAddress::from_u64(0xCAFE)
                } else {
                    ExtendedAddress::from_u64(i as u64)
                };
                NodeSpec::new(role, position, extended)
            })
            .collect();
        let mut builder = ScenarioBuilder::new(specs);
        builder.stream = Some(StreamConfig::new(4, 6));
        builder.inspect = 1;
        builder
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    pub fn with_hop_delay(mut self, delay: SimDuration) -> Self {
        self.hop_delay = delay;
        self
    }

    pub fn with_delivery_jitter(mut self, jitter: SimDuration) -> Self {
        self.delivery_jitter = jitter;
        self
    }

    pub fn with_latencies(mut self, latencies: StackLatencies) -> Self {
        self.latencies = latencies;
        self
    }

    pub fn with_startup_plan(mut self, plan: StartupPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_inspect(mut self, node: usize) -> Self {
        self.inspect = node;
        self
    }

    pub fn with_dropped_packets(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.dropped = ids.into_iter().collect();
        self
    }

    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace_enabled = enabled;
        self
    }

    fn coordinator_index(&self) -> HarnessResult<usize> {
        let mut coordinators = self
            .specs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role == NodeRole::Coordinator)
            .map(|(i, _)| i);
        match (coordinators.next(), coordinators.next()) {
            (Some(index), None) => Ok(index),
            (None, _) => Err(HarnessError::InvalidConfig("no coordinator in population".into())),
            (Some(_), Some(_)) => {
                Err(HarnessError::InvalidConfig("more than one coordinator in population".into()))
            }
        }
    }

    fn check_index(&self, what: &str, index: usize) -> HarnessResult<()> {
        if index < self.specs.len() {
            Ok(())
        } else {
            Err(HarnessError::InvalidConfig(format!(
                "{what} index {index} outside population of {}",
                self.specs.len()
            )))
        }
    }

    /// Validate the description and load the timeline.
    pub fn build(self) -> HarnessResult<Simulator> {
        if self.specs.is_empty() {
            return Err(HarnessError::InvalidConfig("empty population".into()));
        }
        let coordinator = self.coordinator_index()?;
        if let Some(stream) = self.stream {
            self.check_index("stream source", stream.source)?;
            self.check_index("stream destination", stream.destination)?;
        }
        self.check_index("inspect", self.inspect)?;

        let nodes: Vec<NodeStack> = self
            .specs
            .iter()
            .enumerate()
            .map(|(i, s)| NodeStack::new(i, s.extended, s.role))
            .collect();
        let positions: Vec<Position> = self.specs.iter().map(|s| s.position).collect();
        let topology = Topology::new(positions, self.range, self.hop_delay);

        let plan = self.plan.clone().unwrap_or_else(|| {
            let joiners = (0..self.specs.len()).filter(|&i| i != coordinator);
            StartupPlan::staggered(joiners, SimDuration::from_secs(3), SimDuration::from_secs(1))
        });
        let roles: Vec<NodeRole> = self.specs.iter().map(|s| s.role).collect();
        let orchestrator = BootstrapOrchestrator::new(roles, coordinator, plan.clone());

        let mut sim = Simulator::new(nodes, topology, orchestrator, self.seed);
        sim.set_latencies(self.latencies);
        sim.set_delivery_jitter(self.delivery_jitter);
        sim.set_dropped_ids(self.dropped.iter().copied());

        sim.schedule(
            self.formation_at,
            Event::FormNetwork { node: coordinator, params: self.formation },
        );
        for &(node, delay) in plan.entries() {
            sim.schedule(
                SimTime::ZERO + delay,
                Event::StartDiscovery { node, params: self.discovery },
            );
        }

        if let Some(stream) = self.stream {
            sim.set_stream(stream);
            for index in 0..stream.count {
                sim.schedule(stream.send_time(index), Event::StreamSend { index });
            }

            // Tables and trace are captured shortly before the ledger is
            // folded, after all traffic has settled.
            let report_time = stream.report_time();
            let table_time = if stream.report_margin > SimDuration::from_millis(500) {
                report_time - SimDuration::from_millis(500)
            } else {
                report_time
            };
            sim.schedule(table_time, Event::PrintTables { node: self.inspect });
            if self.trace_enabled {
                sim.schedule(
                    table_time + SimDuration::from_millis(30),
                    Event::TraceRoute { src: stream.source, dst: stream.destination },
                );
            }
            sim.schedule(report_time, Event::ComputeReport);
        }

        Ok(sim)
    }

    /// Build and drain the timeline in one step.
    pub fn run(self) -> HarnessResult<RunSummary> {
        let mut sim = self.build()?;
        sim.run_to_completion()?;
        Ok(sim.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_needs_exactly_one_coordinator() {
        let spec = NodeSpec::new(
            NodeRole::Router,
            Position::new(0.0, 0.0),
            ExtendedAddress::from_u64(1),
        );
        let err = ScenarioBuilder::new(vec![spec]).build().unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig(_)));

        let coordinator = NodeSpec::new(
            NodeRole::Coordinator,
            Position::new(0.0, 0.0),
            ExtendedAddress::from_u64(1),
        );
        let err = ScenarioBuilder::new(vec![coordinator, coordinator]).build().unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig(_)));
    }

    #[test]
    fn stream_endpoints_are_validated() {
        let coordinator = NodeSpec::new(
            NodeRole::Coordinator,
            Position::new(0.0, 0.0),
            ExtendedAddress::from_u64(1),
        );
        let mut stream = StreamConfig::new(0, 5);
        stream.count = 1;
        let err = ScenarioBuilder::new(vec![coordinator])
            .with_stream(stream)
            .build()
            .unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig(_)));
    }

    #[test]
    fn reference_scenario_builds() {
        let sim = ScenarioBuilder::ten_node().build().unwrap();
        assert_eq!(sim.nodes().len(), 10);
    }
}
