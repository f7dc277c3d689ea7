//! Tile file header.

use anyhow::{bail, Result};

use crate::graph::GraphId;

const MAGIC: u32 = 0x42464854; // "BFHT"
const VERSION: u16 = 1;

/// Fixed-size header at the start of every tile file.
///
/// `edgeinfo_offset`, `textlist_offset`, and
/// `complex_restriction_offset` are byte offsets from the start of the
/// file. When the patcher appends directed edges it must shift all
/// three by the added bytes: the (empty) complex restriction section
/// trails the text list in this layout, so its offset moves together
/// with the blobs in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileHeader {
    pub graph_id: GraphId,
    pub node_count: u32,
    pub directed_edge_count: u32,
    pub sign_count: u32,
    pub access_restriction_count: u32,
    pub admin_count: u32,
    pub complex_restriction_count: u32,
    pub edgeinfo_offset: u32,
    pub textlist_offset: u32,
    pub complex_restriction_offset: u32,
}

impl TileHeader {
    pub const ENCODED_SIZE: usize = 64;

    pub fn new(graph_id: GraphId) -> Self {
        TileHeader {
            graph_id,
            node_count: 0,
            directed_edge_count: 0,
            sign_count: 0,
            access_restriction_count: 0,
            admin_count: 0,
            complex_restriction_count: 0,
            edgeinfo_offset: 0,
            textlist_offset: 0,
            complex_restriction_offset: 0,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.graph_id.value().to_le_bytes());
        out.extend_from_slice(&self.node_count.to_le_bytes());
        out.extend_from_slice(&self.directed_edge_count.to_le_bytes());
        out.extend_from_slice(&self.sign_count.to_le_bytes());
        out.extend_from_slice(&self.access_restriction_count.to_le_bytes());
        out.extend_from_slice(&self.admin_count.to_le_bytes());
        out.extend_from_slice(&self.complex_restriction_count.to_le_bytes());
        out.extend_from_slice(&self.edgeinfo_offset.to_le_bytes());
        out.extend_from_slice(&self.textlist_offset.to_le_bytes());
        out.extend_from_slice(&self.complex_restriction_offset.to_le_bytes());
        while out.len() - start < Self::ENCODED_SIZE {
            out.push(0);
        }
        debug_assert_eq!(out.len() - start, Self::ENCODED_SIZE);
    }

    pub fn decode(buf: &[u8]) -> Result<TileHeader> {
        if buf.len() < Self::ENCODED_SIZE {
            bail!("tile header truncated: {} bytes", buf.len());
        }
        let u32_at = |i: usize| u32::from_le_bytes(buf[i..i + 4].try_into().unwrap());
        let magic = u32_at(0);
        if magic != MAGIC {
            bail!("bad tile magic {:#010x}", magic);
        }
        let version = u16::from_le_bytes(buf[4..6].try_into().unwrap());
        if version != VERSION {
            bail!("unsupported tile version {}", version);
        }
        Ok(TileHeader {
            graph_id: GraphId::from_value(u64::from_le_bytes(buf[8..16].try_into().unwrap())),
            node_count: u32_at(16),
            directed_edge_count: u32_at(20),
            sign_count: u32_at(24),
            access_restriction_count: u32_at(28),
            admin_count: u32_at(32),
            complex_restriction_count: u32_at(36),
            edgeinfo_offset: u32_at(40),
            textlist_offset: u32_at(44),
            complex_restriction_offset: u32_at(48),
        })
    }
}
