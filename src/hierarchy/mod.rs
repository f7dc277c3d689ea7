//! The hierarchy builder: derives successive coarser levels from the
//! base level, starting at the local level. Each new level keeps only
//! the nodes and edges important enough for its classification cutoff,
//! collapses chains of contracted nodes into shortcut edges, and is
//! wired to the level below with transition edges in both directions.

pub mod assemble;
pub mod contract;
pub mod patch;
pub mod promote;
pub mod shortcut;

use std::collections::HashMap;

use anyhow::{bail, Result};
use log::{debug, info};

use crate::config::Config;
use crate::elevation::{HgtSampler, Sampler};
use crate::graph::GraphId;
use crate::tile::TileReader;

pub use assemble::form_tiles_in_new_level;
pub use contract::can_contract;
pub use patch::connect_base_to_new_level;
pub use promote::nodes_in_new_level;

/// A node placed in a tile of the new level. `contract` marks nodes
/// whose through-edges are replaced by a pair of shortcuts.
#[derive(Debug, Clone, Copy)]
pub struct NewNode {
    pub base_node: GraphId,
    pub contract: bool,
}

/// The two (incoming, outgoing) base edge pairs a shortcut uses to
/// cross a contracted node. Incoming edges are given as the opposing
/// edge of the node's own outgoing edge.
#[derive(Debug, Clone)]
pub struct EdgePairs {
    pub edge1: (GraphId, GraphId),
    pub edge2: (GraphId, GraphId),
}

/// A (base node, new node) pairing used when patching a base tile
/// with an upward transition edge.
#[derive(Debug, Clone, Copy)]
pub struct NodeConnection {
    pub base_node: GraphId,
    pub new_node: GraphId,
}

/// Mutable state for one level transition. Reset between levels; no
/// component outside this module mutates it once promotion completes.
#[derive(Debug, Default)]
pub struct Context {
    /// Per new-tile vectors of promoted nodes, indexed by new tile id.
    pub tiled_nodes: Vec<Vec<NewNode>>,
    /// Base GraphId value -> GraphId on the new level.
    pub node_map: HashMap<u64, GraphId>,
    /// New GraphId value -> edge pairs, for contracted nodes only.
    pub contractions: HashMap<u64, EdgePairs>,
    pub contract_count: u32,
    pub shortcut_count: u32,
}

impl Context {
    /// New-level GraphId for a base node, or the invalid id when the
    /// node was not promoted.
    pub fn mapped(&self, base_node: GraphId) -> GraphId {
        self.node_map
            .get(&base_node.value())
            .copied()
            .unwrap_or_else(GraphId::invalid)
    }

    pub fn new_node(&self, new_id: GraphId) -> &NewNode {
        &self.tiled_nodes[new_id.tile() as usize][new_id.id() as usize]
    }
}

pub struct HierarchyBuilder;

impl HierarchyBuilder {
    /// Build every level of the hierarchy above the base level.
    pub fn build(config: &Config) -> Result<()> {
        let mut reader = match config.hierarchy.cache_budget_bytes {
            Some(budget) => TileReader::with_budget(&config.hierarchy.tile_dir, budget),
            None => TileReader::new(&config.hierarchy.tile_dir),
        };
        let hierarchy = reader.tile_hierarchy().clone();
        if hierarchy.levels().len() < 2 {
            bail!(
                "bad tile hierarchy: need at least 2 levels, have {}",
                hierarchy.levels().len()
            );
        }

        let sampler: Option<Box<dyn Sampler>> = match &config.additional_data.elevation {
            Some(dir) => {
                let s = HgtSampler::from_dir(dir)?;
                info!("loaded {} elevation tiles", s.tile_count());
                Some(Box::new(s))
            }
            None => None,
        };

        // Walk level pairs from the finest (base) level upward.
        let levels = hierarchy.levels();
        for i in (1..levels.len()).rev() {
            let base_level = &levels[i];
            let new_level = &levels[i - 1];
            info!(
                "building hierarchy level {}, base level is {}",
                new_level.name, base_level.name
            );

            let mut ctx = Context {
                tiled_nodes: vec![Vec::new(); new_level.grid.tile_count() as usize],
                ..Default::default()
            };

            nodes_in_new_level(base_level, new_level, &mut ctx, &mut reader)?;
            debug!(
                "can contract {} nodes out of {} promoted",
                ctx.contract_count,
                ctx.node_map.len()
            );

            form_tiles_in_new_level(new_level, &mut ctx, &mut reader, sampler.as_deref())?;

            // New tiles are complete before any base tile is touched,
            // so all reads of the old level are done by the time the
            // patcher rewrites it.
            connect_base_to_new_level(new_level, &mut ctx, &mut reader)?;

            info!(
                "finished level {} with {} promoted nodes, {} shortcuts",
                new_level.name,
                ctx.node_map.len(),
                ctx.shortcut_count
            );
        }
        Ok(())
    }
}
