//! Writable tile assembly and in-place rewrite.
//!
//! Two acquisition modes: a fresh builder for emitting a brand new
//! tile, and an open-existing builder that decodes a tile so the
//! patcher can rewrite it with `update`. Appended strings, admins, and
//! edge-info entries are deduplicated while building.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::geo::LatLon;
use crate::graph::{DirectedEdge, GraphId, NodeInfo};

use super::header::TileHeader;
use super::records::{iso_from_str, AccessRestriction, AdminRecord, Sign, SignInfo};
use super::tile::Tile;
use super::tile_path;

pub struct TileBuilder {
    path: PathBuf,
    header: TileHeader,
    nodes: Vec<NodeInfo>,
    directededges: Vec<DirectedEdge>,
    signs: Vec<Sign>,
    restrictions: Vec<AccessRestriction>,
    admins: Vec<AdminRecord>,
    admin_dedup: HashMap<(String, String), u16>,
    edgeinfo_buf: Vec<u8>,
    edgeinfo_dedup: HashMap<(u32, u64, u64), u32>,
    text_buf: Vec<u8>,
    text_dedup: HashMap<String, u32>,
}

impl TileBuilder {
    /// Acquire a writable tile. With `create` a fresh, empty tile is
    /// started; otherwise the existing file is opened and decoded for
    /// rewriting.
    pub fn open(tile_dir: &Path, id: GraphId, create: bool) -> Result<TileBuilder> {
        if create {
            Ok(TileBuilder::new_tile(tile_dir, id))
        } else {
            TileBuilder::from_existing(tile_dir, id)
        }
    }

    pub fn new_tile(tile_dir: &Path, id: GraphId) -> TileBuilder {
        TileBuilder {
            path: tile_path(tile_dir, id.tile_base()),
            header: TileHeader::new(id.tile_base()),
            nodes: Vec::new(),
            directededges: Vec::new(),
            signs: Vec::new(),
            restrictions: Vec::new(),
            admins: Vec::new(),
            admin_dedup: HashMap::new(),
            edgeinfo_buf: Vec::new(),
            edgeinfo_dedup: HashMap::new(),
            text_buf: Vec::new(),
            text_dedup: HashMap::new(),
        }
    }

    pub fn from_existing(tile_dir: &Path, id: GraphId) -> Result<TileBuilder> {
        let tile = Tile::read(tile_dir, id)?;
        Ok(TileBuilder {
            path: tile_path(tile_dir, id.tile_base()),
            header: tile.header().clone(),
            nodes: tile.nodes().to_vec(),
            directededges: tile.directededges().to_vec(),
            signs: tile.signs().to_vec(),
            restrictions: tile.access_restrictions().to_vec(),
            admins: tile.admins().to_vec(),
            admin_dedup: HashMap::new(),
            edgeinfo_buf: tile.edgeinfo_blob().to_vec(),
            edgeinfo_dedup: HashMap::new(),
            text_buf: tile.text_blob().to_vec(),
            text_dedup: HashMap::new(),
        })
    }

    pub fn header(&self) -> &TileHeader {
        &self.header
    }

    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<NodeInfo> {
        &mut self.nodes
    }

    pub fn node(&self, id: u32) -> &NodeInfo {
        &self.nodes[id as usize]
    }

    pub fn directededges(&self) -> &[DirectedEdge] {
        &self.directededges
    }

    pub fn directededges_mut(&mut self) -> &mut Vec<DirectedEdge> {
        &mut self.directededges
    }

    pub fn directededge(&self, idx: u32) -> &DirectedEdge {
        &self.directededges[idx as usize]
    }

    pub fn sign(&self, i: u32) -> &Sign {
        &self.signs[i as usize]
    }

    pub fn access_restriction(&self, i: u32) -> &AccessRestriction {
        &self.restrictions[i as usize]
    }

    /// Intern a string in the text list, returning its offset.
    fn add_text(&mut self, s: &str) -> u32 {
        if let Some(&off) = self.text_dedup.get(s) {
            return off;
        }
        let off = self.text_buf.len() as u32;
        self.text_buf
            .extend_from_slice(&(s.len() as u16).to_le_bytes());
        self.text_buf.extend_from_slice(s.as_bytes());
        self.text_dedup.insert(s.to_string(), off);
        off
    }

    /// Add an admin record, deduplicated by country/state text.
    /// Returns the admin index.
    pub fn add_admin(
        &mut self,
        country_text: &str,
        state_text: &str,
        country_iso: &str,
        state_iso: &str,
    ) -> u16 {
        let key = (country_text.to_string(), state_text.to_string());
        if let Some(&idx) = self.admin_dedup.get(&key) {
            return idx;
        }
        let idx = self.admins.len() as u16;
        let country_text_offset = self.add_text(country_text);
        let state_text_offset = self.add_text(state_text);
        self.admins.push(AdminRecord {
            country_iso: iso_from_str(country_iso),
            state_iso: iso_from_str(state_iso),
            country_text_offset,
            state_text_offset,
        });
        self.admin_dedup.insert(key, idx);
        idx
    }

    /// Add an edge-info entry for the edge between `node_a` and
    /// `node_b`, keyed by `idx` so that parallel edges between the same
    /// nodes stay distinct. If the same key was added before, the
    /// existing offset is returned and the `bool` is false.
    pub fn add_edge_info(
        &mut self,
        idx: u32,
        node_a: GraphId,
        node_b: GraphId,
        wayid: i64,
        shape: &[LatLon],
        names: &[String],
    ) -> (u32, bool) {
        // Key on the unordered node pair so both directions share one
        // entry.
        let (lo, hi) = if node_a.value() <= node_b.value() {
            (node_a.value(), node_b.value())
        } else {
            (node_b.value(), node_a.value())
        };
        if let Some(&off) = self.edgeinfo_dedup.get(&(idx, lo, hi)) {
            return (off, false);
        }

        let name_offsets: Vec<u32> = names.iter().map(|n| self.add_text(n)).collect();

        let off = self.edgeinfo_buf.len() as u32;
        self.edgeinfo_buf.extend_from_slice(&wayid.to_le_bytes());
        self.edgeinfo_buf
            .extend_from_slice(&(names.len() as u16).to_le_bytes());
        self.edgeinfo_buf
            .extend_from_slice(&(shape.len() as u16).to_le_bytes());
        for noff in name_offsets {
            self.edgeinfo_buf.extend_from_slice(&noff.to_le_bytes());
        }
        for (lat, lon) in shape {
            self.edgeinfo_buf
                .extend_from_slice(&((lat * 1e6).round() as i32).to_le_bytes());
            self.edgeinfo_buf
                .extend_from_slice(&((lon * 1e6).round() as i32).to_le_bytes());
        }
        self.edgeinfo_dedup.insert((idx, lo, hi), off);
        (off, true)
    }

    /// Append sign records owned by `edge_index`.
    pub fn add_signs(&mut self, edge_index: u32, signs: &[SignInfo]) {
        for s in signs {
            let text_offset = self.add_text(&s.text);
            self.signs.push(Sign {
                edge_index,
                sign_type: s.sign_type,
                text_offset,
            });
        }
    }

    pub fn add_access_restriction(&mut self, restriction: AccessRestriction) {
        self.restrictions.push(restriction);
    }

    /// Serialize and write the tile. Returns the file size in bytes.
    pub fn store_tile_data(mut self) -> Result<usize> {
        let mut header = self.header.clone();
        header.node_count = self.nodes.len() as u32;
        header.directed_edge_count = self.directededges.len() as u32;
        header.sign_count = self.signs.len() as u32;
        header.access_restriction_count = self.restrictions.len() as u32;
        header.admin_count = self.admins.len() as u32;
        header.complex_restriction_count = 0;

        let fixed = Self::fixed_sections_size(&header);
        header.edgeinfo_offset = fixed as u32;
        header.textlist_offset = (fixed + self.edgeinfo_buf.len()) as u32;
        header.complex_restriction_offset =
            (fixed + self.edgeinfo_buf.len() + self.text_buf.len()) as u32;

        self.header = header;
        self.write()
    }

    /// Rewrite the tile with patched vectors and a caller-updated
    /// header (the patcher path). Counts and moved offsets in the
    /// header must agree with the supplied data.
    pub fn update(
        mut self,
        header: TileHeader,
        nodes: Vec<NodeInfo>,
        directededges: Vec<DirectedEdge>,
        signs: Vec<Sign>,
        restrictions: Vec<AccessRestriction>,
    ) -> Result<usize> {
        if header.node_count as usize != nodes.len()
            || header.directed_edge_count as usize != directededges.len()
        {
            bail!(
                "update: header counts ({} nodes, {} edges) disagree with data ({}, {})",
                header.node_count,
                header.directed_edge_count,
                nodes.len(),
                directededges.len()
            );
        }
        let fixed = Self::fixed_sections_size(&TileHeader {
            sign_count: signs.len() as u32,
            access_restriction_count: restrictions.len() as u32,
            admin_count: self.admins.len() as u32,
            ..header.clone()
        });
        if header.edgeinfo_offset as usize != fixed {
            bail!(
                "update: edgeinfo offset {} does not match recomputed section layout {}",
                header.edgeinfo_offset,
                fixed
            );
        }

        self.header = header;
        self.nodes = nodes;
        self.directededges = directededges;
        self.signs = signs;
        self.restrictions = restrictions;
        self.write()
    }

    fn fixed_sections_size(header: &TileHeader) -> usize {
        TileHeader::ENCODED_SIZE
            + header.node_count as usize * NodeInfo::ENCODED_SIZE
            + header.directed_edge_count as usize * DirectedEdge::ENCODED_SIZE
            + header.sign_count as usize * Sign::ENCODED_SIZE
            + header.access_restriction_count as usize * AccessRestriction::ENCODED_SIZE
            + header.admin_count as usize * AdminRecord::ENCODED_SIZE
    }

    fn write(self) -> Result<usize> {
        let mut out = Vec::new();
        self.header.encode(&mut out);
        for n in &self.nodes {
            n.encode(&mut out);
        }
        for e in &self.directededges {
            e.encode(&mut out);
        }
        for s in &self.signs {
            s.encode(&mut out);
        }
        for r in &self.restrictions {
            r.encode(&mut out);
        }
        for a in &self.admins {
            a.encode(&mut out);
        }
        debug_assert_eq!(out.len(), self.header.edgeinfo_offset as usize);
        out.extend_from_slice(&self.edgeinfo_buf);
        out.extend_from_slice(&self.text_buf);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating tile directory {}", parent.display()))?;
        }
        fs::write(&self.path, &out)
            .with_context(|| format!("writing tile {}", self.path.display()))?;
        Ok(out.len())
    }
}
