//! Base-tile patching: append upward transition edges and fix up the
//! header and auxiliary tables.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use log::{debug, error};

use crate::graph::{DirectedEdge, GraphId};
use crate::tile::{TileBuilder, TileLevel, TileReader};

use super::{Context, NodeConnection};

/// Rewrite one base tile, appending an upward transition edge for each
/// connection. The node count is unchanged; the directed edge count
/// grows by exactly the number of connections. `connections` must be
/// sorted by base node id.
pub fn add_connections_to_base_tile(
    tile_dir: &Path,
    base_tile_id: u32,
    connections: &[NodeConnection],
) -> Result<()> {
    let base_level = connections[0].base_node.level();
    let base_tile = GraphId::new(base_tile_id, base_level, 0);
    let builder = TileBuilder::open(tile_dir, base_tile, false)?;

    // Copy the header, bump the directed edge count, and shift the two
    // offsets that sit behind the edge array. The (empty) complex
    // restriction section trails the text list here, so its offset
    // moves by the same amount.
    let existing = builder.header().clone();
    let added_size = (connections.len() * DirectedEdge::ENCODED_SIZE) as u32;
    let mut hdr = existing.clone();
    hdr.directed_edge_count = existing.directed_edge_count + connections.len() as u32;
    hdr.edgeinfo_offset = existing.edgeinfo_offset + added_size;
    hdr.textlist_offset = existing.textlist_offset + added_size;
    hdr.complex_restriction_offset = existing.complex_restriction_offset + added_size;

    // Directed edge index of the first sign record; if the tile has no
    // signs use a sentinel no edge will reach. Same for restrictions.
    let sign_count = existing.sign_count;
    let mut sign_idx = 0u32;
    let mut next_sign_edge = if sign_count > 0 {
        builder.sign(0).edge_index
    } else {
        existing.directed_edge_count + 1
    };
    let res_count = existing.access_restriction_count;
    let mut res_idx = 0u32;
    let mut next_res_edge = if res_count > 0 {
        builder.access_restriction(0).edge_index
    } else {
        existing.directed_edge_count + 1
    };

    // Walk the nodes in order, re-emitting their edges and consuming
    // sign/restriction records as their owning edge goes by. Records
    // are re-keyed by the number of transition edges appended so far.
    let mut n: u32 = 0;
    let mut next_connection_id = connections[0].base_node.id();
    let mut nodes = Vec::with_capacity(existing.node_count as usize);
    let mut directededges = Vec::with_capacity(hdr.directed_edge_count as usize);
    let mut signs = Vec::with_capacity(sign_count as usize);
    let mut restrictions = Vec::with_capacity(res_count as usize);

    for id in 0..existing.node_count {
        let mut node = builder.node(id).clone();

        let mut idx = node.edge_index;
        for _ in 0..node.edge_count {
            let edge = builder.directededge(idx).clone();
            let has_sign = edge.exit_sign();
            directededges.push(edge);

            while idx == next_sign_edge && sign_idx < sign_count {
                if !has_sign {
                    error!(
                        "sign records for edge {} but the directed edge has no sign flag",
                        idx
                    );
                }
                let mut sign = builder.sign(sign_idx).clone();
                sign.edge_index = idx + n;
                signs.push(sign);
                sign_idx += 1;
                next_sign_edge = if sign_idx >= sign_count {
                    0
                } else {
                    builder.sign(sign_idx).edge_index
                };
            }

            while idx == next_res_edge && res_idx < res_count {
                let mut res = builder.access_restriction(res_idx).clone();
                res.edge_index = idx + n;
                restrictions.push(res);
                res_idx += 1;
                next_res_edge = if res_idx >= res_count {
                    0
                } else {
                    builder.access_restriction(res_idx).edge_index
                };
            }

            idx += 1;
        }

        // Shift the node's first-edge index by the edges added so far.
        node.edge_index += n;

        // When a connection exists at this node, append the upward
        // transition as its last outgoing edge.
        if id == next_connection_id {
            node.edge_count += 1;

            let mut connection = DirectedEdge::default();
            connection.set_trans_up(true);
            connection.end_node = connections[n as usize].new_node;
            connection.set_all_forward_access();
            directededges.push(connection);

            n += 1;
            next_connection_id = if n as usize >= connections.len() {
                0
            } else {
                connections[n as usize].base_node.id()
            };
        }

        nodes.push(node);
    }

    if n as usize != connections.len() {
        error!(
            "added {} transition edges but {} connections were supplied for tile {}",
            n,
            connections.len(),
            base_tile
        );
    }
    if signs.len() != hdr.sign_count as usize {
        error!(
            "patched tile {} has {} sign records, header says {}",
            base_tile,
            signs.len(),
            hdr.sign_count
        );
    }
    if restrictions.len() != hdr.access_restriction_count as usize {
        error!(
            "patched tile {} has {} restriction records, header says {}",
            base_tile,
            restrictions.len(),
            hdr.access_restriction_count
        );
    }

    let bytes = builder.update(hdr, nodes, directededges, signs, restrictions)?;
    debug!("updated tile {}: {} bytes", base_tile, bytes);
    Ok(())
}

/// Connect base level nodes to their counterparts in the new level:
/// group the new level's nodes by originating base tile and patch each
/// base tile with its sorted connection list.
pub fn connect_base_to_new_level(
    new_level: &TileLevel,
    ctx: &mut Context,
    reader: &mut TileReader,
) -> Result<()> {
    for (tileid, newtile) in ctx.tiled_nodes.iter().enumerate() {
        if !newtile.is_empty() {
            let mut connections: BTreeMap<u32, Vec<NodeConnection>> = BTreeMap::new();
            for (id, newnode) in newtile.iter().enumerate() {
                connections
                    .entry(newnode.base_node.tile())
                    .or_default()
                    .push(NodeConnection {
                        base_node: newnode.base_node,
                        new_node: GraphId::new(tileid as u32, new_level.level, id as u32),
                    });
            }

            for (base_tile_id, conns) in connections.iter_mut() {
                conns.sort_by_key(|c| c.base_node.id());
                add_connections_to_base_tile(reader.tile_dir(), *base_tile_id, conns)?;
            }
        }

        if reader.over_committed() {
            reader.clear();
        }
    }
    Ok(())
}
