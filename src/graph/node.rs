//! Node records.

use super::types::{IntersectionType, NodeType, RoadClass, Traversability};

/// Maximum number of local (base-level) edges tracked per node for
/// headings and driveability.
pub const MAX_LOCAL_EDGES: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub lat: f64,
    pub lon: f64,
    /// Index of the first outgoing directed edge in the tile.
    pub edge_index: u32,
    pub edge_count: u32,
    pub admin_index: u16,
    pub timezone: u16,
    /// Most important (lowest value) road class among adjacent edges.
    pub best_road_class: RoadClass,
    /// Number of local edges (capped at `MAX_LOCAL_EDGES`).
    pub local_edge_count: u8,
    pub node_type: NodeType,
    pub intersection: IntersectionType,
    /// Heading in degrees of each local edge as it leaves the node.
    pub headings: [u16; MAX_LOCAL_EDGES],
    pub driveability: [Traversability; MAX_LOCAL_EDGES],
}

impl Default for NodeInfo {
    fn default() -> Self {
        NodeInfo {
            lat: 0.0,
            lon: 0.0,
            edge_index: 0,
            edge_count: 0,
            admin_index: 0,
            timezone: 0,
            best_road_class: RoadClass::ServiceOther,
            local_edge_count: 0,
            node_type: NodeType::Street,
            intersection: IntersectionType::Regular,
            headings: [0; MAX_LOCAL_EDGES],
            driveability: [Traversability::None; MAX_LOCAL_EDGES],
        }
    }
}

impl NodeInfo {
    pub const ENCODED_SIZE: usize = 56;

    pub fn heading(&self, local_idx: u8) -> u16 {
        self.headings[local_idx as usize % MAX_LOCAL_EDGES]
    }

    pub fn local_driveability(&self, local_idx: u8) -> Traversability {
        self.driveability[local_idx as usize % MAX_LOCAL_EDGES]
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&self.lat.to_le_bytes());
        out.extend_from_slice(&self.lon.to_le_bytes());
        out.extend_from_slice(&self.edge_index.to_le_bytes());
        out.extend_from_slice(&self.edge_count.to_le_bytes());
        out.extend_from_slice(&self.admin_index.to_le_bytes());
        out.extend_from_slice(&self.timezone.to_le_bytes());
        out.push(self.best_road_class as u8);
        out.push(self.local_edge_count);
        out.push(self.node_type as u8);
        out.push(self.intersection as u8);
        for h in &self.headings {
            out.extend_from_slice(&h.to_le_bytes());
        }
        for d in &self.driveability {
            out.push(*d as u8);
        }
        debug_assert_eq!(out.len() - start, Self::ENCODED_SIZE);
    }

    pub fn decode(buf: &[u8]) -> NodeInfo {
        debug_assert!(buf.len() >= Self::ENCODED_SIZE);
        let f64_at = |i: usize| f64::from_le_bytes(buf[i..i + 8].try_into().unwrap());
        let u32_at = |i: usize| u32::from_le_bytes(buf[i..i + 4].try_into().unwrap());
        let u16_at = |i: usize| u16::from_le_bytes(buf[i..i + 2].try_into().unwrap());
        let mut headings = [0u16; MAX_LOCAL_EDGES];
        for (k, h) in headings.iter_mut().enumerate() {
            *h = u16_at(32 + k * 2);
        }
        let mut driveability = [Traversability::None; MAX_LOCAL_EDGES];
        for (k, d) in driveability.iter_mut().enumerate() {
            *d = Traversability::from_u8(buf[48 + k]);
        }
        NodeInfo {
            lat: f64_at(0),
            lon: f64_at(8),
            edge_index: u32_at(16),
            edge_count: u32_at(20),
            admin_index: u16_at(24),
            timezone: u16_at(26),
            best_road_class: RoadClass::from_u8(buf[28]),
            local_edge_count: buf[29],
            node_type: NodeType::from_u8(buf[30]),
            intersection: IntersectionType::from_u8(buf[31]),
            headings,
            driveability,
        }
    }
}
