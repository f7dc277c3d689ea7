//! Node promotion: decide which base nodes appear on the new level.

use anyhow::{bail, Result};

use crate::graph::GraphId;
use crate::tile::{TileLevel, TileReader};

use super::contract::can_contract;
use super::{Context, NewNode};

/// Scan every base tile and collect the nodes that exist in the new
/// level: a node is promoted iff its best road class is within the new
/// level's cutoff. Contractibility is decided in the same pass since
/// it needs the same base tile in cache.
///
/// Also enforces the clean-base precondition: a base tile that already
/// carries upward transition edges was produced by a previous build,
/// and building on top of it would corrupt the edge lists.
pub fn nodes_in_new_level(
    base_level: &TileLevel,
    new_level: &TileLevel,
    ctx: &mut Context,
    reader: &mut TileReader,
) -> Result<()> {
    let ntiles = base_level.grid.tile_count();
    for base_tile_id in 0..ntiles {
        if reader.over_committed() {
            reader.clear();
        }

        // Skip if no tile exists (the common case).
        let Some(tile) = reader.get_tile(GraphId::new(base_tile_id, base_level.level, 0)) else {
            continue;
        };
        if tile.header().node_count == 0 {
            continue;
        }

        if tile.directededges().iter().any(|e| e.trans_up()) {
            bail!(
                "base tile {}/{} already contains upward transition edges; \
                 the hierarchy must be built from a clean base level",
                base_level.level,
                base_tile_id
            );
        }

        let mut base_node = GraphId::new(base_tile_id, base_level.level, 0);
        for i in 0..tile.header().node_count {
            let nodeinfo = tile.node(i);
            if nodeinfo.best_road_class <= new_level.importance {
                let new_tile_id = new_level.grid.tile_id(nodeinfo.lat, nodeinfo.lon);
                let new_node = GraphId::new(
                    new_tile_id,
                    new_level.level,
                    ctx.tiled_nodes[new_tile_id as usize].len() as u32,
                );
                let contract = can_contract(
                    &tile,
                    nodeinfo,
                    base_node,
                    new_node,
                    new_level.importance,
                    ctx,
                    reader,
                );
                ctx.tiled_nodes[new_tile_id as usize].push(NewNode {
                    base_node,
                    contract,
                });
                ctx.node_map.insert(base_node.value(), new_node);
            }
            base_node = base_node.next();
        }
    }
    Ok(())
}
