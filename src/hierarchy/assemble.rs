//! Tile assembly for the new level: emit one coarser tile at a time
//! with shortcut edges, surviving edges, and downward transitions.

use std::collections::HashMap;

use anyhow::Result;
use log::{debug, error, warn};

use crate::elevation::{grade_for_shape, Sampler};
use crate::graph::edge::FLAT_GRADE;
use crate::graph::{DirectedEdge, GraphId, NodeInfo, RoadClass, ALL_ACCESS};
use crate::tile::{AccessRestriction, Tile, TileBuilder, TileLevel, TileReader};

use super::shortcut::{connect_edge, WalkState};
use super::{Context, EdgePairs, NewNode};

/// Whether `edge` is recorded as an entering (inbound) edge of the
/// contracted node `node` in its edge pairs.
fn is_entering_edge(
    node: GraphId,
    edge: GraphId,
    contractions: &HashMap<u64, EdgePairs>,
) -> bool {
    match contractions.get(&node.value()) {
        Some(pairs) => pairs.edge1.0 == edge || pairs.edge2.0 == edge,
        None => {
            warn!("no edge pairs found for contracted node {}", node);
            false
        }
    }
}

/// Add shortcut edges leaving `newnode`, where chains of contracted
/// neighbors allow them. Records, per starting base edge local index,
/// the 1-based shortcut index assigned, so the survivor pass can mark
/// superseded edges.
#[allow(clippy::too_many_arguments)]
fn add_shortcut_edges(
    newnode: NewNode,
    nodea: GraphId,
    baseni: &NodeInfo,
    tile: &Tile,
    rcc: RoadClass,
    builder: &mut TileBuilder,
    shortcuts: &mut HashMap<u32, u32>,
    ctx: &mut Context,
    reader: &mut TileReader,
    sampler: Option<&dyn Sampler>,
) -> Result<()> {
    // The pair of exiting edges at this node, when contracted. A
    // shortcut never starts with an edge that another shortcut exits
    // through.
    let own_pairs = if newnode.contract {
        ctx.contractions.get(&nodea.value()).cloned()
    } else {
        None
    };

    let mut shortcut = 0u32;
    let mut base_edge_id = GraphId::new(
        newnode.base_node.tile(),
        newnode.base_node.level(),
        baseni.edge_index,
    );
    for i in 0..baseni.edge_count {
        let this_edge_id = base_edge_id;
        base_edge_id = base_edge_id.next();

        // Skip edges above the road class cutoff, transition edges,
        // and shortcuts in the base level. Only downward transitions
        // exist at this point.
        let directededge = tile.directededge(this_edge_id.id());
        if directededge.classification > rcc
            || directededge.trans_down()
            || directededge.is_shortcut()
        {
            continue;
        }

        if let Some(pairs) = &own_pairs {
            if pairs.edge1.1 == this_edge_id || pairs.edge2.1 == this_edge_id {
                continue;
            }
        }

        // A shortcut starts here iff the neighbor is a contracted node
        // and this edge enters it on a matching side. Entrance ramps
        // and the like can lead into a contracted node without being a
        // matching edge, so both checks are needed.
        let nodeb = ctx.mapped(directededge.end_node);
        if !nodeb.is_valid()
            || !ctx.new_node(nodeb).contract
            || !is_entering_edge(nodeb, this_edge_id, &ctx.contractions)
        {
            continue;
        }

        // Form the shortcut, seeded from this first base edge. If the
        // first edge traverses its shape backward, reverse it so the
        // accumulated shape is laid out forward.
        let mut newedge = directededge.clone();
        let mut length = newedge.length;
        let info = tile.edgeinfo(directededge.edgeinfo_offset)?;
        let mut shape = info.shape;
        if !directededge.forward() {
            shape.reverse();
        }

        // Names apply over all edges of the shortcut.
        let names = info.names;

        // Carry the first edge's access restriction records, keyed by
        // the index the shortcut edge is about to take.
        if newedge.access_restriction() {
            for res in tile.get_access_restrictions(this_edge_id.id(), ALL_ACCESS) {
                builder.add_access_restriction(AccessRestriction {
                    edge_index: builder.directededges().len() as u32,
                    ..res
                });
            }
        }

        // Walk the chain while the cursor node is contracted, keeping
        // the restriction mask and opposing local index of the last
        // edge connected.
        let mut state = WalkState::new(shape, nodeb);
        let mut next_edge_id = this_edge_id;
        while state.cursor.is_valid() && ctx.new_node(state.cursor).contract {
            let Some(pairs) = ctx.contractions.get(&state.cursor.value()) else {
                warn!("no edge pairs found for contracted node {}", state.cursor);
                break;
            };
            // The edge we arrived on must match one of the inbound
            // halves; take the paired outbound edge. Neither matching
            // happens when a shortcut enters another shortcut: the
            // chain ends there.
            if pairs.edge1.0 == next_edge_id {
                next_edge_id = pairs.edge1.1;
            } else if pairs.edge2.0 == next_edge_id {
                next_edge_id = pairs.edge2.1;
            } else {
                break;
            }

            match connect_edge(next_edge_id, &mut state, &ctx.node_map, reader) {
                Ok(len) => length += len,
                // Already logged; end the shortcut cleanly.
                Err(_) => break,
            }
        }

        // Register shape and names, keyed so that two distinct
        // shortcuts between the same endpoints stay apart.
        let idx = (length & 0xfffff) | (((state.shape.len() as u32) & 0xfff) << 20);
        let (edge_info_offset, added) =
            builder.add_edge_info(idx, nodea, state.cursor, -1, &state.shape, &names);
        newedge.edgeinfo_offset = edge_info_offset;

        // When a fresh entry was added the stored shape runs in this
        // edge's direction; otherwise the opposite shortcut stored it
        // first and this edge traverses it in reverse.
        let forward = added;
        newedge.set_forward(forward);

        // The shortcut carries the opposing local index and the
        // restriction mask of the last edge in the chain.
        newedge.opp_local_idx = state.opp_local_idx;
        newedge.restrictions = state.restrictions;
        newedge.length = length;
        newedge.end_node = state.cursor;
        match sampler {
            Some(sampler) => {
                let (grade, up, down) =
                    grade_for_shape(sampler, &state.shape, f64::from(length), forward);
                newedge.weighted_grade = grade;
                newedge.max_up_slope = up;
                newedge.max_down_slope = down;
            }
            None => {
                newedge.weighted_grade = FLAT_GRADE;
                newedge.max_up_slope = 0;
                newedge.max_down_slope = 0;
            }
        }
        newedge.curvature = 0;

        // Edges with exit information are never combined, so a
        // shortcut carrying one is a builder bug.
        if newedge.exit_sign() {
            error!("shortcut edge with exit signs at {}", nodea);
        }

        // Record the base edge index -> shortcut index association and
        // clear state that does not apply to a fresh shortcut.
        shortcuts.insert(i, shortcut + 1);
        newedge.shortcut = (shortcut + 1) as u8;
        newedge.superseded = 0;
        newedge.set_internal(false);

        builder.directededges_mut().push(newedge);
        ctx.shortcut_count += 1;
        shortcut += 1;
    }
    Ok(())
}

/// Emit every tile of the new level from the promoted node vectors.
pub fn form_tiles_in_new_level(
    new_level: &TileLevel,
    ctx: &mut Context,
    reader: &mut TileReader,
    sampler: Option<&dyn Sampler>,
) -> Result<()> {
    let tile_dir = reader.tile_dir().to_path_buf();
    let rcc = new_level.importance;
    reader.clear();

    for tileid in 0..ctx.tiled_nodes.len() {
        if ctx.tiled_nodes[tileid].is_empty() {
            continue;
        }
        if reader.over_committed() {
            reader.clear();
        }

        let tile_graph_id = GraphId::new(tileid as u32, new_level.level, 0);
        let mut builder = TileBuilder::open(&tile_dir, tile_graph_id, true)?;

        // Dummy admin at index 0, used when admins are absent.
        builder.add_admin("None", "None", "", "");

        for nodeid in 0..ctx.tiled_nodes[tileid].len() {
            let newnode = ctx.tiled_nodes[tileid][nodeid];
            let nodea = GraphId::new(tileid as u32, new_level.level, nodeid as u32);

            let Some(base_tile) = reader.get_tile(newnode.base_node) else {
                error!("base tile missing for promoted node {}", newnode.base_node);
                continue;
            };
            let baseni = base_tile.node(newnode.base_node.id()).clone();

            // Seed the new node from the base node; admin indices are
            // tile-local and must be re-resolved.
            let mut node = baseni.clone();
            node.edge_index = builder.directededges().len() as u32;
            node.admin_index = match base_tile.admin_info(baseni.admin_index) {
                Ok(admin) => builder.add_admin(
                    &admin.country_text,
                    &admin.state_text,
                    &admin.country_iso,
                    &admin.state_iso,
                ),
                Err(e) => {
                    error!("admin lookup failed for {}: {:#}", newnode.base_node, e);
                    0
                }
            };
            let edge_start = builder.directededges().len();

            // Shortcut edges come first.
            let mut shortcuts: HashMap<u32, u32> = HashMap::new();
            add_shortcut_edges(
                newnode,
                nodea,
                &baseni,
                &base_tile,
                rcc,
                &mut builder,
                &mut shortcuts,
                ctx,
                reader,
                sampler,
            )?;

            // Then the surviving directed edges of the base node,
            // filtered by the classification cutoff.
            let mut old_edge_id = GraphId::new(
                newnode.base_node.tile(),
                newnode.base_node.level(),
                baseni.edge_index,
            );
            for i in 0..baseni.edge_count {
                let this_edge_id = old_edge_id;
                old_edge_id = old_edge_id.next();

                let directededge = base_tile.directededge(this_edge_id.id());
                if directededge.classification > rcc
                    || directededge.trans_down()
                    || directededge.is_shortcut()
                {
                    continue;
                }

                let nodeb = ctx.mapped(directededge.end_node);
                if !nodeb.is_valid() {
                    error!(
                        "end node {} of surviving edge {} is not in the promotion map",
                        directededge.end_node, this_edge_id
                    );
                    continue;
                }

                let mut newedge = directededge.clone();
                newedge.end_node = nodeb;
                // Opposing edge indexes are set by a later validation
                // pass.
                newedge.opp_index = 0;

                // Exit signs move with the edge, re-keyed to its new
                // index.
                if directededge.exit_sign() {
                    let signs = base_tile.get_signs(this_edge_id.id());
                    if signs.is_empty() {
                        error!("base edge {} should have signs, but none found", this_edge_id);
                    }
                    builder.add_signs(builder.directededges().len() as u32, &signs);
                }

                if directededge.access_restriction() {
                    for res in
                        base_tile.get_access_restrictions(this_edge_id.id(), ALL_ACCESS)
                    {
                        builder.add_access_restriction(AccessRestriction {
                            edge_index: builder.directededges().len() as u32,
                            ..res
                        });
                    }
                }

                // Copy edge info into the new tile, keyed by length to
                // keep parallel edges between the same nodes apart.
                let info = base_tile.edgeinfo(directededge.edgeinfo_offset)?;
                let (edge_info_offset, _added) = builder.add_edge_info(
                    directededge.length,
                    nodea,
                    nodeb,
                    info.wayid,
                    &info.shape,
                    &info.names,
                );
                newedge.edgeinfo_offset = edge_info_offset;

                // Mark this edge superseded when a shortcut from this
                // node covers it.
                newedge.superseded = shortcuts.get(&i).copied().unwrap_or(0) as u8;

                builder.directededges_mut().push(newedge);
            }

            // The downward transition closes out the node's edge list.
            let mut downward = DirectedEdge::default();
            downward.end_node = newnode.base_node;
            downward.set_trans_down(true);
            downward.set_all_forward_access();
            builder.directededges_mut().push(downward);

            node.edge_count = (builder.directededges().len() - edge_start) as u32;
            builder.nodes_mut().push(node);
        }

        let bytes = builder.store_tile_data()?;
        debug!("created tile {}: {} bytes", tile_graph_id, bytes);
    }
    Ok(())
}
