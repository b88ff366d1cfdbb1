//! Staged network bring-up.
//!
//! The orchestrator owns one state machine per node and advances it on
//! confirm events only: discovery confirm triggers the join, join confirm
//! triggers router start. Formation and the staggered discovery scans are
//! scheduled by wall-clock plan instead, matching how a field bring-up is
//! scripted.
//!
//! Failure handling is deliberately asymmetric. A failed formation or
//! discovery invalidates the whole run and surfaces as an error; a failed
//! join strands that one node and the run carries on without it.

use tracing::{info, warn};

use crate::address::NodeRole;
use crate::error::{HarnessError, HarnessResult};
use crate::nwk::{
    CapabilityInformation, DeviceType, JoinConfirm, JoinRequest, JoiningMethod,
    NetworkDiscoveryConfirm, NetworkFormationConfirm,
};
use crate::time::SimDuration;

/// Per-node bring-up progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    FormingNetwork,
    NetworkFormed,
    Discovering,
    Joining,
    Joined,
    RouterActive,
}

/// When each non-coordinator node starts its discovery scan, as offsets
/// from scenario start.
#[derive(Debug, Clone)]
pub struct StartupPlan {
    entries: Vec<(usize, SimDuration)>,
}

impl StartupPlan {
    pub fn new(entries: Vec<(usize, SimDuration)>) -> Self {
        StartupPlan { entries }
    }

    /// Evenly staggered plan: first node scans at `first`, each
    /// subsequent node `spacing` later. Staggering keeps join traffic off
    /// the air while earlier routers come up.
    pub fn staggered(nodes: impl IntoIterator<Item = usize>, first: SimDuration, spacing: SimDuration) -> Self {
        let entries = nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| (node, first + spacing * i as u32))
            .collect();
        StartupPlan { entries }
    }

    pub fn entries(&self) -> &[(usize, SimDuration)] {
        &self.entries
    }
}

/// Drives every node from power-on to its terminal state.
#[derive(Debug)]
pub struct BootstrapOrchestrator {
    coordinator: usize,
    roles: Vec<NodeRole>,
    states: Vec<BootstrapState>,
    plan: StartupPlan,
}

impl BootstrapOrchestrator {
    pub fn new(roles: Vec<NodeRole>, coordinator: usize, plan: StartupPlan) -> Self {
        let states = vec![BootstrapState::Uninitialized; roles.len()];
        BootstrapOrchestrator { coordinator, roles, states, plan }
    }

    pub fn coordinator(&self) -> usize {
        self.coordinator
    }

    pub fn plan(&self) -> &StartupPlan {
        &self.plan
    }

    pub fn state(&self, node: usize) -> BootstrapState {
        self.states[node]
    }

    pub fn note_formation_started(&mut self, node: usize) {
        self.states[node] = BootstrapState::FormingNetwork;
    }

    pub fn note_discovery_started(&mut self, node: usize) {
        self.states[node] = BootstrapState::Discovering;
    }

    /// Formation outcome. Failure is fatal: without a network there is
    /// nothing for the rest of the population to join.
    pub fn handle_formation_confirm(
        &mut self,
        node: usize,
        confirm: &NetworkFormationConfirm,
    ) -> HarnessResult<()> {
        if !confirm.status.is_success() {
            return Err(HarnessError::FormationFailed(confirm.status));
        }
        self.states[node] = BootstrapState::NetworkFormed;
        info!(node, "network formed, discovery windows open");
        Ok(())
    }

    /// Discovery outcome. On success the node immediately asks to join
    /// the first advertised network; the returned request is scheduled
    /// for the same instant. Failure is fatal for the run.
    pub fn handle_discovery_confirm(
        &mut self,
        node: usize,
        confirm: &NetworkDiscoveryConfirm,
    ) -> HarnessResult<JoinRequest> {
        let descriptor = match confirm.descriptors.first() {
            Some(d) if confirm.status.is_success() => *d,
            _ => {
                return Err(HarnessError::DiscoveryFailed { node, status: confirm.status });
            }
        };

        let device_type = match self.roles[node] {
            NodeRole::Router => DeviceType::Router,
            _ => DeviceType::EndDevice,
        };
        self.states[node] = BootstrapState::Joining;
        info!(node, pan = %descriptor.extended_pan_id, "joining first discovered network");

        Ok(JoinRequest {
            extended_pan_id: descriptor.extended_pan_id,
            capability: CapabilityInformation { device_type, allocate_address: true },
            method: JoiningMethod::Association,
        })
    }

    /// Join outcome. A failed join strands the node outside the mesh; it
    /// keeps its unassigned address and the run continues without it.
    /// Returns whether a router start should be issued now.
    pub fn handle_join_confirm(&mut self, node: usize, confirm: &JoinConfirm) -> bool {
        if !confirm.status.is_success() {
            warn!(node, status = %confirm.status, "join failed, node stays out of the mesh");
            return false;
        }
        self.states[node] = BootstrapState::Joined;
        info!(node, short = %confirm.short_address, "joined network");
        self.roles[node] == NodeRole::Router
    }

    pub fn note_router_started(&mut self, node: usize) {
        self.states[node] = BootstrapState::RouterActive;
    }

    /// Whether every planned node reached its terminal state: the
    /// coordinator formed, routers relay, end devices joined.
    pub fn all_bootstrapped(&self) -> bool {
        if self.states[self.coordinator] != BootstrapState::NetworkFormed {
            return false;
        }
        self.plan.entries().iter().all(|&(node, _)| match self.roles[node] {
            NodeRole::Router => self.states[node] == BootstrapState::RouterActive,
            NodeRole::EndDevice => self.states[node] == BootstrapState::Joined,
            NodeRole::Coordinator => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{PanId, ShortAddress};
    use crate::nwk::{NetworkDescriptor, NwkStatus};

    fn orchestrator() -> BootstrapOrchestrator {
        let roles = vec![NodeRole::Coordinator, NodeRole::Router, NodeRole::EndDevice];
        let plan = StartupPlan::staggered(1..3, SimDuration::from_secs(3), SimDuration::from_secs(1));
        BootstrapOrchestrator::new(roles, 0, plan)
    }

    fn descriptor() -> NetworkDescriptor {
        NetworkDescriptor {
            extended_pan_id: PanId::from_u64(0xCAFE),
            pan_id: 0xCAFE,
            channel: 11,
        }
    }

    #[test]
    fn staggered_plan_spacing() {
        let plan = StartupPlan::staggered(1..4, SimDuration::from_secs(3), SimDuration::from_secs(1));
        assert_eq!(
            plan.entries(),
            [
                (1, SimDuration::from_secs(3)),
                (2, SimDuration::from_secs(4)),
                (3, SimDuration::from_secs(5)),
            ]
        );
    }

    #[test]
    fn explicit_plan_preserves_order() {
        let plan = StartupPlan::new(vec![(4, SimDuration::from_secs(7)), (1, SimDuration::from_secs(3))]);
        assert_eq!(plan.entries()[0].0, 4);
    }

    #[test]
    fn formation_failure_is_fatal() {
        let mut orch = orchestrator();
        orch.note_formation_started(0);
        let err = orch
            .handle_formation_confirm(0, &NetworkFormationConfirm { status: NwkStatus::InvalidRequest })
            .unwrap_err();
        assert_eq!(err, HarnessError::FormationFailed(NwkStatus::InvalidRequest));
    }

    #[test]
    fn discovery_success_yields_join_for_first_network() {
        let mut orch = orchestrator();
        orch.note_discovery_started(1);
        let confirm = NetworkDiscoveryConfirm {
            status: NwkStatus::Success,
            descriptors: vec![descriptor()],
        };
        let join = orch.handle_discovery_confirm(1, &confirm).unwrap();
        assert_eq!(join.extended_pan_id, PanId::from_u64(0xCAFE));
        assert_eq!(join.capability.device_type, DeviceType::Router);
        assert!(join.capability.allocate_address);
        assert_eq!(orch.state(1), BootstrapState::Joining);
    }

    #[test]
    fn discovery_failure_is_fatal_and_issues_no_join() {
        let mut orch = orchestrator();
        orch.note_discovery_started(2);
        let confirm = NetworkDiscoveryConfirm { status: NwkStatus::NoNetworks, descriptors: vec![] };
        let err = orch.handle_discovery_confirm(2, &confirm).unwrap_err();
        assert_eq!(err, HarnessError::DiscoveryFailed { node: 2, status: NwkStatus::NoNetworks });
        assert_eq!(orch.state(2), BootstrapState::Discovering);
    }

    #[test]
    fn join_confirm_starts_routers_but_not_end_devices() {
        let mut orch = orchestrator();
        let confirm = JoinConfirm {
            status: NwkStatus::Success,
            short_address: ShortAddress::from_u16(1),
            extended_pan_id: PanId::from_u64(0xCAFE),
        };
        assert!(orch.handle_join_confirm(1, &confirm));
        assert!(!orch.handle_join_confirm(2, &confirm));
        assert_eq!(orch.state(1), BootstrapState::Joined);
        assert_eq!(orch.state(2), BootstrapState::Joined);
    }

    #[test]
    fn failed_join_strands_a_single_node() {
        let mut orch = orchestrator();
        orch.note_discovery_started(2);
        let confirm = JoinConfirm {
            status: NwkStatus::NotPermitted,
            short_address: ShortAddress::BROADCAST,
            extended_pan_id: PanId::from_u64(0xCAFE),
        };
        assert!(!orch.handle_join_confirm(2, &confirm));
        assert_ne!(orch.state(2), BootstrapState::Joined);
    }

    #[test]
    fn completion_requires_terminal_state_per_role() {
        let mut orch = orchestrator();
        orch.note_formation_started(0);
        orch.handle_formation_confirm(0, &NetworkFormationConfirm { status: NwkStatus::Success })
            .unwrap();
        assert!(!orch.all_bootstrapped());

        let joined = JoinConfirm {
            status: NwkStatus::Success,
            short_address: ShortAddress::from_u16(1),
            extended_pan_id: PanId::from_u64(0xCAFE),
        };
        orch.handle_join_confirm(1, &joined);
        orch.handle_join_confirm(2, &joined);
        // Router joined but not yet relaying.
        assert!(!orch.all_bootstrapped());
        orch.note_router_started(1);
        assert!(orch.all_bootstrapped());
    }
}
