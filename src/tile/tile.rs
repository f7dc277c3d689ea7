//! Read-only tile access.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::graph::{Access, DirectedEdge, GraphId, NodeInfo};

use super::header::TileHeader;
use super::records::{
    iso_to_string, AccessRestriction, AdminInfo, AdminRecord, EdgeInfo, Sign, SignInfo,
};
use super::tile_path;

/// A fully decoded tile. Immutable once read.
#[derive(Debug)]
pub struct Tile {
    header: TileHeader,
    nodes: Vec<NodeInfo>,
    edges: Vec<DirectedEdge>,
    signs: Vec<Sign>,
    restrictions: Vec<AccessRestriction>,
    admins: Vec<AdminRecord>,
    edgeinfo: Vec<u8>,
    text: Vec<u8>,
    byte_size: usize,
}

impl Tile {
    /// Read and decode the tile file for `id` under `tile_dir`.
    pub fn read(tile_dir: &Path, id: GraphId) -> Result<Tile> {
        let path = tile_path(tile_dir, id);
        let buf = fs::read(&path).with_context(|| format!("reading tile {}", path.display()))?;
        Tile::from_bytes(&buf)
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Tile> {
        let header = TileHeader::decode(buf)?;

        fn section<'a>(
            buf: &'a [u8],
            pos: &mut usize,
            count: usize,
            size: usize,
        ) -> Result<&'a [u8]> {
            let end = *pos + count * size;
            if end > buf.len() {
                bail!("tile truncated: section at {} runs past {}", pos, buf.len());
            }
            let s = &buf[*pos..end];
            *pos = end;
            Ok(s)
        }

        let mut pos = TileHeader::ENCODED_SIZE;
        let nodes = section(buf, &mut pos, header.node_count as usize, NodeInfo::ENCODED_SIZE)?
            .chunks_exact(NodeInfo::ENCODED_SIZE)
            .map(NodeInfo::decode)
            .collect();
        let edges = section(
            buf,
            &mut pos,
            header.directed_edge_count as usize,
            DirectedEdge::ENCODED_SIZE,
        )?
        .chunks_exact(DirectedEdge::ENCODED_SIZE)
        .map(DirectedEdge::decode)
        .collect();
        let signs = section(buf, &mut pos, header.sign_count as usize, Sign::ENCODED_SIZE)?
            .chunks_exact(Sign::ENCODED_SIZE)
            .map(Sign::decode)
            .collect();
        let restrictions = section(
            buf,
            &mut pos,
            header.access_restriction_count as usize,
            AccessRestriction::ENCODED_SIZE,
        )?
        .chunks_exact(AccessRestriction::ENCODED_SIZE)
        .map(AccessRestriction::decode)
        .collect();
        let admins = section(
            buf,
            &mut pos,
            header.admin_count as usize,
            AdminRecord::ENCODED_SIZE,
        )?
        .chunks_exact(AdminRecord::ENCODED_SIZE)
        .map(AdminRecord::decode)
        .collect();

        let ei_start = header.edgeinfo_offset as usize;
        let ei_end = header.textlist_offset as usize;
        let text_end = header.complex_restriction_offset as usize;
        if ei_start != pos || ei_end < ei_start || text_end < ei_end || text_end > buf.len() {
            bail!(
                "inconsistent tile section offsets: edgeinfo={} textlist={} end={}",
                ei_start,
                ei_end,
                text_end
            );
        }

        Ok(Tile {
            header,
            nodes,
            edges,
            signs,
            restrictions,
            admins,
            edgeinfo: buf[ei_start..ei_end].to_vec(),
            text: buf[ei_end..text_end].to_vec(),
            byte_size: buf.len(),
        })
    }

    pub fn header(&self) -> &TileHeader {
        &self.header
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn node(&self, id: u32) -> &NodeInfo {
        &self.nodes[id as usize]
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn directededge(&self, idx: u32) -> &DirectedEdge {
        &self.edges[idx as usize]
    }

    pub fn directededges(&self) -> &[DirectedEdge] {
        &self.edges
    }

    /// Decode the edge-info entry at `offset` (relative to the
    /// edge-info section).
    pub fn edgeinfo(&self, offset: u32) -> Result<EdgeInfo> {
        let buf = &self.edgeinfo;
        let pos = offset as usize;
        if pos + 12 > buf.len() {
            bail!("edgeinfo offset {} out of range", offset);
        }
        let wayid = i64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap());
        let name_count = u16::from_le_bytes(buf[pos + 8..pos + 10].try_into().unwrap()) as usize;
        let point_count = u16::from_le_bytes(buf[pos + 10..pos + 12].try_into().unwrap()) as usize;
        let mut p = pos + 12;
        if p + name_count * 4 + point_count * 8 > buf.len() {
            bail!("edgeinfo entry at {} truncated", offset);
        }

        let mut names = Vec::with_capacity(name_count);
        for _ in 0..name_count {
            let text_offset = u32::from_le_bytes(buf[p..p + 4].try_into().unwrap());
            names.push(self.read_text(text_offset)?.to_string());
            p += 4;
        }

        let mut shape = Vec::with_capacity(point_count);
        for _ in 0..point_count {
            let lat = i32::from_le_bytes(buf[p..p + 4].try_into().unwrap());
            let lon = i32::from_le_bytes(buf[p + 4..p + 8].try_into().unwrap());
            shape.push((f64::from(lat) * 1e-6, f64::from(lon) * 1e-6));
            p += 8;
        }

        Ok(EdgeInfo {
            wayid,
            shape,
            names,
        })
    }

    /// Names attached to the edge-info entry at `offset`.
    pub fn get_names(&self, offset: u32) -> Result<Vec<String>> {
        Ok(self.edgeinfo(offset)?.names)
    }

    /// All sign records owned by the directed edge at `edge_idx`, with
    /// text resolved.
    pub fn get_signs(&self, edge_idx: u32) -> Vec<SignInfo> {
        self.signs
            .iter()
            .filter(|s| s.edge_index == edge_idx)
            .filter_map(|s| {
                self.read_text(s.text_offset).ok().map(|t| SignInfo {
                    sign_type: s.sign_type,
                    text: t.to_string(),
                })
            })
            .collect()
    }

    /// Raw sign records in file order (patcher path).
    pub fn signs(&self) -> &[Sign] {
        &self.signs
    }

    /// Access restrictions owned by `edge_idx` affecting any of the
    /// given modes.
    pub fn get_access_restrictions(&self, edge_idx: u32, modes: Access) -> Vec<AccessRestriction> {
        self.restrictions
            .iter()
            .filter(|r| r.edge_index == edge_idx && r.modes & modes != 0)
            .cloned()
            .collect()
    }

    /// Raw restriction records in file order (patcher path).
    pub fn access_restrictions(&self) -> &[AccessRestriction] {
        &self.restrictions
    }

    pub fn admin_info(&self, idx: u16) -> Result<AdminInfo> {
        let rec = self
            .admins
            .get(idx as usize)
            .with_context(|| format!("admin index {} out of range", idx))?;
        Ok(AdminInfo {
            country_text: self.read_text(rec.country_text_offset)?.to_string(),
            state_text: self.read_text(rec.state_text_offset)?.to_string(),
            country_iso: iso_to_string(&rec.country_iso),
            state_iso: iso_to_string(&rec.state_iso),
        })
    }

    pub fn admins(&self) -> &[AdminRecord] {
        &self.admins
    }

    pub(crate) fn edgeinfo_blob(&self) -> &[u8] {
        &self.edgeinfo
    }

    pub(crate) fn text_blob(&self) -> &[u8] {
        &self.text
    }

    fn read_text(&self, offset: u32) -> Result<&str> {
        let pos = offset as usize;
        if pos + 2 > self.text.len() {
            bail!("text offset {} out of range", offset);
        }
        let len = u16::from_le_bytes(self.text[pos..pos + 2].try_into().unwrap()) as usize;
        if pos + 2 + len > self.text.len() {
            bail!("text entry at {} truncated", offset);
        }
        std::str::from_utf8(&self.text[pos + 2..pos + 2 + len]).context("invalid utf8 in textlist")
    }
}
