//! Mesh addressing primitives.
//!
//! Every device carries a permanent 64-bit hardware address and, once it
//! has joined a network, a 16-bit network-assigned short address. The
//! all-ones short address doubles as the broadcast destination and the
//! "not yet assigned" sentinel, so a node that never joined reports
//! `FF:FF` from every lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Permanent 64-bit hardware (extended) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtendedAddress(u64);

impl ExtendedAddress {
    pub fn from_u64(raw: u64) -> Self {
        ExtendedAddress(raw)
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }

    pub fn octets(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ExtendedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.octets();
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5], o[6], o[7]
        )
    }
}

/// 16-bit network address, assigned at join time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShortAddress(u16);

impl ShortAddress {
    /// Broadcast destination, also the unassigned/unreachable sentinel.
    pub const BROADCAST: ShortAddress = ShortAddress(0xFFFF);

    pub fn from_u16(raw: u16) -> Self {
        ShortAddress(raw)
    }

    pub fn to_u16(self) -> u16 {
        self.0
    }

    pub fn is_broadcast(self) -> bool {
        self.0 == 0xFFFF
    }

    /// A node that never joined still carries the broadcast pattern.
    pub fn is_unassigned(self) -> bool {
        self.is_broadcast()
    }
}

impl fmt::Display for ShortAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [hi, lo] = self.0.to_be_bytes();
        write!(f, "{hi:02X}:{lo:02X}")
    }
}

/// PAN identifier, derived from the coordinator's hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanId(u64);

impl PanId {
    pub fn from_u64(raw: u64) -> Self {
        PanId(raw)
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018X}", self.0)
    }
}

/// Role a device plays in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Forms the network and anchors the address space.
    Coordinator,
    /// Joins, then relays traffic for others.
    Router,
    /// Joins as a leaf, never relays.
    EndDevice,
}

impl NodeRole {
    /// Whether this role can forward traffic once active.
    pub fn can_route(self) -> bool {
        matches!(self, NodeRole::Coordinator | NodeRole::Router)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeRole::Coordinator => "coordinator",
            NodeRole::Router => "router",
            NodeRole::EndDevice => "end-device",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_address_display() {
        let addr = ExtendedAddress::from_u64(0xCAFE);
        assert_eq!(addr.to_string(), "00:00:00:00:00:00:CA:FE");
    }

    #[test]
    fn short_address_display() {
        assert_eq!(ShortAddress::from_u16(0x0001).to_string(), "00:01");
        assert_eq!(ShortAddress::BROADCAST.to_string(), "FF:FF");
    }

    #[test]
    fn broadcast_doubles_as_unassigned() {
        assert!(ShortAddress::BROADCAST.is_unassigned());
        assert!(!ShortAddress::from_u16(0).is_unassigned());
    }

    #[test]
    fn role_routing_capability() {
        assert!(NodeRole::Coordinator.can_route());
        assert!(NodeRole::Router.can_route());
        assert!(!NodeRole::EndDevice.can_route());
    }
}
