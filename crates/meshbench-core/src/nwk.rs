//! Network-layer management primitives.
//!
//! Models the request/confirm surface of a Zigbee-style network layer:
//! formation, discovery, join, router start and routed data transfer.
//! Each request is answered later by a confirm carrying an [`NwkStatus`];
//! the harness never blocks on a request.
//!
//! [`NodeStack`] is the per-device state: addresses, join status, and the
//! neighbor and routing tables the path tracer walks.

use std::collections::HashMap;
use std::fmt;

use crate::address::{ExtendedAddress, NodeRole, PanId, ShortAddress};

/// Outcome code carried by every confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NwkStatus {
    Success,
    NoNetworks,
    InvalidRequest,
    NotPermitted,
    RouteDiscoveryFailed,
}

impl NwkStatus {
    pub fn is_success(self) -> bool {
        self == NwkStatus::Success
    }
}

impl fmt::Display for NwkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NwkStatus::Success => "SUCCESS",
            NwkStatus::NoNetworks => "NO_NETWORKS",
            NwkStatus::InvalidRequest => "INVALID_REQUEST",
            NwkStatus::NotPermitted => "NOT_PERMITTED",
            NwkStatus::RouteDiscoveryFailed => "ROUTE_DISCOVERY_FAILED",
        };
        f.write_str(s)
    }
}

/// Bitmask of 2.4 GHz channels to scan, one bit per channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanChannels(u32);

impl ScanChannels {
    /// All sixteen 2.4 GHz channels (11-26).
    pub const ALL: ScanChannels = ScanChannels(0x07FF_F800);
    /// Channels 11-14, the default discovery subset.
    pub const LOW_BAND: ScanChannels = ScanChannels(0x0000_7800);

    pub fn from_mask(mask: u32) -> Self {
        ScanChannels(mask)
    }

    pub fn mask(self) -> u32 {
        self.0
    }

    pub fn contains(self, channel: u8) -> bool {
        (11..=26).contains(&channel) && self.0 & (1 << channel) != 0
    }
}

/// Ask a coordinator to form a new network.
#[derive(Debug, Clone, Copy)]
pub struct NetworkFormationRequest {
    pub scan_channels: ScanChannels,
    pub scan_duration: u8,
}

impl Default for NetworkFormationRequest {
    fn default() -> Self {
        NetworkFormationRequest {
            scan_channels: ScanChannels::ALL,
            scan_duration: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkFormationConfirm {
    pub status: NwkStatus,
}

/// Ask a node to scan for joinable networks.
#[derive(Debug, Clone, Copy)]
pub struct NetworkDiscoveryRequest {
    pub scan_channels: ScanChannels,
    pub scan_duration: u8,
}

impl Default for NetworkDiscoveryRequest {
    fn default() -> Self {
        NetworkDiscoveryRequest {
            scan_channels: ScanChannels::LOW_BAND,
            scan_duration: 2,
        }
    }
}

/// One network heard during a discovery scan.
#[derive(Debug, Clone, Copy)]
pub struct NetworkDescriptor {
    pub extended_pan_id: PanId,
    pub pan_id: u16,
    pub channel: u8,
}

#[derive(Debug, Clone)]
pub struct NetworkDiscoveryConfirm {
    pub status: NwkStatus,
    pub descriptors: Vec<NetworkDescriptor>,
}

/// Device type advertised during association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Router,
    EndDevice,
}

/// Capability bits a joining device presents to its parent.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityInformation {
    pub device_type: DeviceType,
    /// Request a parent-allocated short address.
    pub allocate_address: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoiningMethod {
    Association,
    Rejoin,
}

/// Ask a node to join a previously discovered network.
#[derive(Debug, Clone, Copy)]
pub struct JoinRequest {
    pub extended_pan_id: PanId,
    pub capability: CapabilityInformation,
    pub method: JoiningMethod,
}

#[derive(Debug, Clone, Copy)]
pub struct JoinConfirm {
    pub status: NwkStatus,
    /// Assigned network address, `FF:FF` on failure.
    pub short_address: ShortAddress,
    pub extended_pan_id: PanId,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteDiscoveryConfirm {
    pub status: NwkStatus,
}

/// Destination interpretation for a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Unicast to the named address, broadcast when it is the
    /// all-ones pattern.
    UnicastOrBroadcast,
}

/// Ask a node to send a routed payload.
#[derive(Debug, Clone, Copy)]
pub struct DataRequest {
    pub dst_addr: ShortAddress,
    pub addr_mode: AddressMode,
    /// Discover and install a route on demand.
    pub discover_route: bool,
    /// Caller-chosen handle echoed in diagnostics.
    pub handle: u8,
}

/// One row of a node's neighbor table.
#[derive(Debug, Clone, Copy)]
pub struct NeighborEntry {
    pub short: ShortAddress,
    pub extended: ExtendedAddress,
    /// Neighbor can forward traffic (active router or coordinator).
    pub relay: bool,
}

/// One row of a node's routing table, keyed by destination.
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub next_hop: ShortAddress,
    /// Next hop is a direct link neighbor.
    pub is_neighbor: bool,
}

/// Per-device network-layer state.
///
/// Constructed unjoined; the simulator drives it through formation or
/// association and fills its tables as routes are discovered. Tables are
/// also settable directly so degenerate route shapes can be staged.
#[derive(Debug, Clone)]
pub struct NodeStack {
    index: usize,
    extended: ExtendedAddress,
    role: NodeRole,
    short: ShortAddress,
    pan: Option<PanId>,
    network_formed: bool,
    router_active: bool,
    parent: Option<ShortAddress>,
    neighbors: Vec<NeighborEntry>,
    routes: HashMap<ShortAddress, RouteEntry>,
}

impl NodeStack {
    pub fn new(index: usize, extended: ExtendedAddress, role: NodeRole) -> Self {
        NodeStack {
            index,
            extended,
            role,
            short: ShortAddress::BROADCAST,
            pan: None,
            network_formed: false,
            router_active: false,
            parent: None,
            neighbors: Vec::new(),
            routes: HashMap::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn extended_address(&self) -> ExtendedAddress {
        self.extended
    }

    /// Current network address; `FF:FF` until the node joins.
    pub fn short_address(&self) -> ShortAddress {
        self.short
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn pan(&self) -> Option<PanId> {
        self.pan
    }

    pub fn is_joined(&self) -> bool {
        !self.short.is_unassigned()
    }

    pub fn parent(&self) -> Option<ShortAddress> {
        self.parent
    }

    /// Node currently forwards traffic for others.
    pub fn is_relay_active(&self) -> bool {
        match self.role {
            NodeRole::Coordinator => self.network_formed,
            NodeRole::Router => self.router_active,
            NodeRole::EndDevice => false,
        }
    }

    /// Coordinator-side network bring-up: anchors the address space at
    /// `00:00` and opens the network for joiners.
    pub fn form_network(&mut self, pan: PanId) {
        self.short = ShortAddress::from_u16(0x0000);
        self.pan = Some(pan);
        self.network_formed = true;
    }

    /// Successful association: adopt the parent-assigned address.
    pub fn join_network(&mut self, short: ShortAddress, pan: PanId, parent: ShortAddress) {
        self.short = short;
        self.pan = Some(pan);
        self.parent = Some(parent);
    }

    /// Begin relaying. Meaningful for routers only.
    pub fn start_router(&mut self) {
        self.router_active = true;
    }

    pub fn add_neighbor(&mut self, entry: NeighborEntry) {
        if !self.neighbors.iter().any(|n| n.short == entry.short) {
            self.neighbors.push(entry);
        }
    }

    pub fn neighbors(&self) -> &[NeighborEntry] {
        &self.neighbors
    }

    pub fn set_route(&mut self, destination: ShortAddress, entry: RouteEntry) {
        self.routes.insert(destination, entry);
    }

    pub fn has_route(&self, destination: ShortAddress) -> bool {
        self.routes.contains_key(&destination)
    }

    /// Resolve the next hop toward `destination`.
    ///
    /// Direct neighbors win over routing entries. Returns the broadcast
    /// pattern when no route exists; callers treat that as unreachable.
    pub fn find_route(&self, destination: ShortAddress) -> (ShortAddress, bool) {
        if self.neighbors.iter().any(|n| n.short == destination) {
            return (destination, true);
        }
        match self.routes.get(&destination) {
            Some(entry) => (entry.next_hop, entry.is_neighbor),
            None => (ShortAddress::BROADCAST, false),
        }
    }

    /// Render the neighbor table in a stable, sorted order.
    pub fn write_neighbor_table(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "---------------------------------------------------")?;
        writeln!(
            out,
            "Neighbor table for node {} [{} | {}]",
            self.index, self.short, self.extended
        )?;
        writeln!(out, "{:<8}  {:<25}  {}", "Short", "Extended", "Relay")?;
        let mut rows = self.neighbors.clone();
        rows.sort_by_key(|n| n.short.to_u16());
        for n in &rows {
            writeln!(
                out,
                "{:<8}  {:<25}  {}",
                n.short.to_string(),
                n.extended.to_string(),
                if n.relay { "yes" } else { "no" }
            )?;
        }
        Ok(())
    }

    /// Render the routing table in a stable, sorted order.
    pub fn write_routing_table(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "---------------------------------------------------")?;
        writeln!(
            out,
            "Routing table for node {} [{} | {}]",
            self.index, self.short, self.extended
        )?;
        writeln!(out, "{:<12}  {:<8}  {}", "Destination", "NextHop", "Neighbor")?;
        let mut rows: Vec<_> = self.routes.iter().collect();
        rows.sort_by_key(|(dst, _)| dst.to_u16());
        for (dst, entry) in rows {
            writeln!(
                out,
                "{:<12}  {:<8}  {}",
                dst.to_string(),
                entry.next_hop.to_string(),
                if entry.is_neighbor { "yes" } else { "no" }
            )?;
        }
        Ok(())
    }
}
