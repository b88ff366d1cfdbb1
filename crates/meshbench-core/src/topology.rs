//! Physical layout of the mesh.
//!
//! Nodes sit at fixed planar positions; two nodes share a link when they
//! are within radio range. Links are symmetric and carry a fixed per-hop
//! transit delay.

use serde::{Deserialize, Serialize};

use crate::address::NodeRole;
use crate::time::SimDuration;

/// Planar position in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Static radio graph over the node population.
#[derive(Debug, Clone)]
pub struct Topology {
    positions: Vec<Position>,
    range: f64,
    hop_delay: SimDuration,
}

impl Topology {
    pub fn new(positions: Vec<Position>, range: f64, hop_delay: SimDuration) -> Self {
        Topology { positions, range, hop_delay }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, node: usize) -> Position {
        self.positions[node]
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.positions[a].distance_to(&self.positions[b])
    }

    pub fn in_range(&self, a: usize, b: usize) -> bool {
        a != b && self.distance(a, b) <= self.range
    }

    /// Indices of all nodes sharing a link with `node`.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        (0..self.positions.len())
            .filter(|&other| self.in_range(node, other))
            .collect()
    }

    /// Transit delay across one link.
    pub fn hop_delay(&self) -> SimDuration {
        self.hop_delay
    }
}

/// Reference ten-node layout: a coordinator at the origin ringed by four
/// routers, with five end devices on the fringe reachable only through
/// the routers.
pub fn ten_node_layout() -> Vec<(NodeRole, Position)> {
    vec![
        (NodeRole::Coordinator, Position::new(0.0, 0.0)),
        (NodeRole::Router, Position::new(100.0, 50.0)),
        (NodeRole::Router, Position::new(-75.0, 50.0)),
        (NodeRole::Router, Position::new(0.0, -100.0)),
        (NodeRole::Router, Position::new(-100.0, -50.0)),
        (NodeRole::EndDevice, Position::new(100.0, 100.0)),
        (NodeRole::EndDevice, Position::new(150.0, 50.0)),
        (NodeRole::EndDevice, Position::new(150.0, 0.0)),
        (NodeRole::EndDevice, Position::new(-150.0, -100.0)),
        (NodeRole::EndDevice, Position::new(-50.0, -100.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Topology {
        let positions = vec![
            Position::new(0.0, 0.0),
            Position::new(60.0, 0.0),
            Position::new(120.0, 0.0),
        ];
        Topology::new(positions, 80.0, SimDuration::from_millis(3))
    }

    #[test]
    fn links_respect_range() {
        let t = chain();
        assert!(t.in_range(0, 1));
        assert!(t.in_range(1, 2));
        assert!(!t.in_range(0, 2));
        assert!(!t.in_range(1, 1));
    }

    #[test]
    fn neighbor_listing() {
        let t = chain();
        assert_eq!(t.neighbors(0), vec![1]);
        assert_eq!(t.neighbors(1), vec![0, 2]);
    }

    #[test]
    fn reference_layout_is_coordinator_anchored() {
        let layout = ten_node_layout();
        assert_eq!(layout.len(), 10);
        assert_eq!(layout[0].0, NodeRole::Coordinator);
        assert_eq!(layout.iter().filter(|(r, _)| *r == NodeRole::Router).count(), 4);
        assert_eq!(layout.iter().filter(|(r, _)| *r == NodeRole::EndDevice).count(), 5);
    }

    #[test]
    fn end_devices_sit_beyond_coordinator_range() {
        let layout = ten_node_layout();
        let positions: Vec<Position> = layout.iter().map(|(_, p)| *p).collect();
        let t = Topology::new(positions, 120.0, SimDuration::from_millis(3));
        // Every end device needs at least one router in range, and none
        // may reach the coordinator directly.
        for ed in 5..10 {
            assert!(!t.in_range(0, ed), "end device {ed} should not see the coordinator");
            assert!(
                (1..5).any(|r| t.in_range(r, ed)),
                "end device {ed} has no router in range"
            );
        }
    }
}
