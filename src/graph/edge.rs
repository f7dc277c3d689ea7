//! Directed edge records.
//!
//! Edges are stored contiguously by owning node inside a tile. The
//! encoded size is fixed: the base-tile patcher shifts section offsets
//! by `ENCODED_SIZE` per appended edge, so any layout change here must
//! keep encode/decode and `ENCODED_SIZE` in sync.

use super::types::{Access, RoadClass, Surface, Use, ALL_ACCESS};
use super::GraphId;

// Boolean attribute bits (flags field).
const FLAG_FORWARD: u16 = 1 << 0;
const FLAG_LINK: u16 = 1 << 1;
const FLAG_ROUNDABOUT: u16 = 1 << 2;
const FLAG_TOLL: u16 = 1 << 3;
const FLAG_DEST_ONLY: u16 = 1 << 4;
const FLAG_UNPAVED: u16 = 1 << 5;
const FLAG_TRANS_DOWN: u16 = 1 << 6;
const FLAG_TRANS_UP: u16 = 1 << 7;
const FLAG_EXIT_SIGN: u16 = 1 << 8;
const FLAG_ACCESS_RESTRICTION: u16 = 1 << 9;
const FLAG_INTERNAL: u16 = 1 << 10;

/// Weighted-grade code meaning "flat" (4-bit scale 0..15).
pub const FLAT_GRADE: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedEdge {
    pub end_node: GraphId,
    pub edgeinfo_offset: u32,
    /// Length in meters.
    pub length: u32,
    /// Index of the opposing edge within the end node's edge list.
    /// Filled by a later validation pass; cleared when edges are copied
    /// to a new level.
    pub opp_index: u32,
    flags: u16,
    pub speed: u8,
    pub classification: RoadClass,
    pub edge_use: Use,
    pub surface: Surface,
    pub forward_access: Access,
    pub reverse_access: Access,
    /// Index among the owning node's local edges.
    pub local_edge_idx: u8,
    /// Index among the end node's local edges (reverse direction).
    pub opp_local_idx: u8,
    /// Bitmask of local edge indices at the end node that may not be
    /// taken next after traversing this edge.
    pub restrictions: u8,
    /// Shortcut index (1-based, at the owning node) that supersedes
    /// this edge, 0 when none does.
    pub superseded: u8,
    /// Non-zero marks this edge as a shortcut; the value is its
    /// 1-based index at the owning node.
    pub shortcut: u8,
    /// Compressed mean grade, 4-bit code, 6 = flat.
    pub weighted_grade: u8,
    /// Maximum upward slope in percent.
    pub max_up_slope: i8,
    /// Maximum downward slope in percent (negative).
    pub max_down_slope: i8,
    pub curvature: u8,
}

impl Default for DirectedEdge {
    fn default() -> Self {
        DirectedEdge {
            end_node: GraphId::invalid(),
            edgeinfo_offset: 0,
            length: 0,
            opp_index: 0,
            flags: FLAG_FORWARD,
            speed: 0,
            classification: RoadClass::ServiceOther,
            edge_use: Use::Road,
            surface: Surface::Paved,
            forward_access: 0,
            reverse_access: 0,
            local_edge_idx: 0,
            opp_local_idx: 0,
            restrictions: 0,
            superseded: 0,
            shortcut: 0,
            weighted_grade: FLAT_GRADE,
            max_up_slope: 0,
            max_down_slope: 0,
            curvature: 0,
        }
    }
}

macro_rules! flag_accessors {
    ($get:ident, $set:ident, $bit:ident) => {
        pub fn $get(&self) -> bool {
            self.flags & $bit != 0
        }
        pub fn $set(&mut self, v: bool) {
            if v {
                self.flags |= $bit;
            } else {
                self.flags &= !$bit;
            }
        }
    };
}

impl DirectedEdge {
    /// Encoded record size in bytes. The patcher's offset arithmetic
    /// depends on this value.
    pub const ENCODED_SIZE: usize = 40;

    flag_accessors!(forward, set_forward, FLAG_FORWARD);
    flag_accessors!(link, set_link, FLAG_LINK);
    flag_accessors!(roundabout, set_roundabout, FLAG_ROUNDABOUT);
    flag_accessors!(toll, set_toll, FLAG_TOLL);
    flag_accessors!(dest_only, set_dest_only, FLAG_DEST_ONLY);
    flag_accessors!(unpaved, set_unpaved, FLAG_UNPAVED);
    flag_accessors!(trans_down, set_trans_down, FLAG_TRANS_DOWN);
    flag_accessors!(trans_up, set_trans_up, FLAG_TRANS_UP);
    flag_accessors!(exit_sign, set_exit_sign, FLAG_EXIT_SIGN);
    flag_accessors!(
        access_restriction,
        set_access_restriction,
        FLAG_ACCESS_RESTRICTION
    );
    flag_accessors!(internal, set_internal, FLAG_INTERNAL);

    pub fn is_shortcut(&self) -> bool {
        self.shortcut != 0
    }

    /// Open access in every mode, forward direction. Used by transition
    /// edges so they never block a traversal.
    pub fn set_all_forward_access(&mut self) {
        self.forward_access = ALL_ACCESS;
        self.reverse_access = ALL_ACCESS;
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&self.end_node.value().to_le_bytes());
        out.extend_from_slice(&self.edgeinfo_offset.to_le_bytes());
        out.extend_from_slice(&self.length.to_le_bytes());
        out.extend_from_slice(&self.opp_index.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.push(self.speed);
        out.push(self.classification as u8);
        out.push(self.edge_use as u8);
        out.push(self.surface as u8);
        out.push(self.forward_access);
        out.push(self.reverse_access);
        out.push(self.local_edge_idx);
        out.push(self.opp_local_idx);
        out.push(self.restrictions);
        out.push(self.superseded);
        out.push(self.shortcut);
        out.push(self.weighted_grade);
        out.push(self.max_up_slope as u8);
        out.push(self.max_down_slope as u8);
        out.push(self.curvature);
        // Pad to the fixed record size
        while out.len() - start < Self::ENCODED_SIZE {
            out.push(0);
        }
        debug_assert_eq!(out.len() - start, Self::ENCODED_SIZE);
    }

    pub fn decode(buf: &[u8]) -> DirectedEdge {
        debug_assert!(buf.len() >= Self::ENCODED_SIZE);
        let u64_at = |i: usize| u64::from_le_bytes(buf[i..i + 8].try_into().unwrap());
        let u32_at = |i: usize| u32::from_le_bytes(buf[i..i + 4].try_into().unwrap());
        let u16_at = |i: usize| u16::from_le_bytes(buf[i..i + 2].try_into().unwrap());
        DirectedEdge {
            end_node: GraphId::from_value(u64_at(0)),
            edgeinfo_offset: u32_at(8),
            length: u32_at(12),
            opp_index: u32_at(16),
            flags: u16_at(20),
            speed: buf[22],
            classification: RoadClass::from_u8(buf[23]),
            edge_use: Use::from_u8(buf[24]),
            surface: Surface::from_u8(buf[25]),
            forward_access: buf[26],
            reverse_access: buf[27],
            local_edge_idx: buf[28],
            opp_local_idx: buf[29],
            restrictions: buf[30],
            superseded: buf[31],
            shortcut: buf[32],
            weighted_grade: buf[33],
            max_up_slope: buf[34] as i8,
            max_down_slope: buf[35] as i8,
            curvature: buf[36],
        }
    }
}
