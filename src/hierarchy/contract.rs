//! Contractibility oracle: decides whether a promoted node can be
//! replaced by a single pair of through-shortcuts on the new level,
//! and records the edge pairs a shortcut uses to cross it.

use log::error;

use crate::geo::turn_degree;
use crate::graph::{
    DirectedEdge, GraphId, IntersectionType, NodeInfo, NodeType, RoadClass, Traversability,
};
use crate::tile::{Tile, TileReader};

use super::{Context, EdgePairs};

/// Maximum deviation from straight-through allowed for a contraction
/// when the node has other driveable edges, degrees.
const MAX_CONTRACTION_TURN: u16 = 60;

/// Whether two outbound edges at a node form the two halves of a
/// single through-road.
pub fn edges_match(tile: &Tile, edge1: &DirectedEdge, edge2: &DirectedEdge) -> bool {
    // Must lead to different nodes.
    if edge1.end_node == edge2.end_node {
        return false;
    }

    // Access must mirror: both edges are outbound, so one edge's
    // forward direction is the other's reverse.
    if edge1.forward_access != edge2.reverse_access
        || edge1.reverse_access != edge2.forward_access
    {
        return false;
    }

    // Neither edge may carry exit signs.
    if edge1.exit_sign() || edge2.exit_sign() {
        return false;
    }

    // Neither edge may be a roundabout.
    if edge1.roundabout() || edge2.roundabout() {
        return false;
    }

    // Classification, link, use, and attributes must match. Bridge and
    // tunnel are deliberately not compared: most overpasses are tagged
    // as bridges and comparing them loses shortcuts.
    if edge1.classification != edge2.classification
        || edge1.link() != edge2.link()
        || edge1.edge_use != edge2.edge_use
        || edge1.speed != edge2.speed
        || edge1.toll() != edge2.toll()
        || edge1.dest_only() != edge2.dest_only()
        || edge1.unpaved() != edge2.unpaved()
        || edge1.surface != edge2.surface
    {
        return false;
    }

    // Name sets must be equal as multisets; order does not matter.
    let names1 = match tile.get_names(edge1.edgeinfo_offset) {
        Ok(n) => n,
        Err(e) => {
            error!("edge info lookup failed while matching edges: {:#}", e);
            return false;
        }
    };
    let names2 = match tile.get_names(edge2.edgeinfo_offset) {
        Ok(n) => n,
        Err(e) => {
            error!("edge info lookup failed while matching edges: {:#}", e);
            return false;
        }
    };
    if names1.len() != names2.len() {
        return false;
    }
    let mut sorted1 = names1;
    let mut sorted2 = names2;
    sorted1.sort();
    sorted2.sort();
    sorted1 == sorted2
}

/// GraphId of the edge opposing `edge` (the reverse traversal between
/// the same two nodes). Resolved by scanning the end node's outbound
/// edges; returns the invalid id when no opposing edge is found.
pub fn opposing_edge_id(node: GraphId, edge: &DirectedEdge, reader: &mut TileReader) -> GraphId {
    let Some(tile) = reader.get_tile(edge.end_node) else {
        error!("opposing edge lookup: no tile for end node {}", edge.end_node);
        return GraphId::invalid();
    };
    let nodeinfo = tile.node(edge.end_node.id());

    let mut edge_id = GraphId::new(
        edge.end_node.tile(),
        edge.end_node.level(),
        nodeinfo.edge_index,
    );
    for idx in nodeinfo.edge_index..nodeinfo.edge_index + nodeinfo.edge_count {
        let candidate = tile.directededge(idx);
        if candidate.end_node == node
            && candidate.classification == edge.classification
            && candidate.length == edge.length
            && ((candidate.link() && edge.link()) || candidate.edge_use == edge.edge_use)
        {
            return edge_id;
        }
        edge_id = edge_id.next();
    }
    error!("opposing directed edge not found for {}", edge.end_node);
    GraphId::invalid()
}

/// ISO country code at the end node of an edge.
fn end_node_iso(edge: &DirectedEdge, reader: &mut TileReader) -> Option<String> {
    let tile = reader.get_tile(edge.end_node)?;
    let nodeinfo = tile.node(edge.end_node.id());
    match tile.admin_info(nodeinfo.admin_index) {
        Ok(admin) => Some(admin.country_iso),
        Err(e) => {
            error!("admin lookup failed at {}: {:#}", edge.end_node, e);
            None
        }
    }
}

/// Test whether `base_node` can be contracted into a shortcut on the
/// new level. On success the edge pairs for the node are stored under
/// `new_node` in the context.
pub fn can_contract(
    tile: &Tile,
    nodeinfo: &NodeInfo,
    base_node: GraphId,
    new_node: GraphId,
    rcc: RoadClass,
    ctx: &mut Context,
    reader: &mut TileReader,
) -> bool {
    if nodeinfo.edge_count < 2 {
        return false;
    }

    // Gates and toll booths must stay traversable as real nodes, and a
    // fork needs its maneuver point preserved.
    if nodeinfo.node_type == NodeType::Gate
        || nodeinfo.node_type == NodeType::TollBooth
        || nodeinfo.intersection == IntersectionType::Fork
    {
        return false;
    }

    // Edges from the base level that remain at this level. Downward
    // transitions and base-level shortcuts are never carried up.
    let mut edges: Vec<GraphId> = Vec::new();
    let mut edge_id = GraphId::new(base_node.tile(), base_node.level(), nodeinfo.edge_index);
    for idx in nodeinfo.edge_index..nodeinfo.edge_index + nodeinfo.edge_count {
        let de = tile.directededge(idx);
        if de.classification <= rcc && !de.trans_down() && !de.is_shortcut() {
            edges.push(edge_id);
        }
        edge_id = edge_id.next();
    }

    // The node must have exactly 2 edges at this level.
    if edges.len() != 2 {
        return false;
    }

    // Exactly one matching pair must exist among them.
    let mut matched: Option<(usize, usize)> = None;
    for i in 0..edges.len() - 1 {
        for j in i + 1..edges.len() {
            let edge1 = tile.directededge(edges[i].id());
            let edge2 = tile.directededge(edges[j].id());
            if edges_match(tile, edge1, edge2) {
                if matched.is_some() {
                    return false;
                }
                matched = Some((i, j));
            }
        }
    }
    let Some((mi, mj)) = matched else {
        return false;
    };

    // The outbound pair and their opposing (inbound) edges.
    let edge1 = tile.directededge(edges[mi].id()).clone();
    let edge2 = tile.directededge(edges[mj].id()).clone();
    let opp_edge1 = opposing_edge_id(base_node, &edge1, reader);
    let opp_edge2 = opposing_edge_id(base_node, &edge2, reader);
    if !opp_edge1.is_valid() || !opp_edge2.is_valid() {
        return false;
    }
    let Some(opp_dir_edge1) = reader
        .get_tile(opp_edge1)
        .map(|t| t.directededge(opp_edge1.id()).clone())
    else {
        return false;
    };
    let Some(opp_dir_edge2) = reader
        .get_tile(opp_edge2)
        .map(|t| t.directededge(opp_edge2.id()).clone())
    else {
        return false;
    };

    // Neither inbound edge may carry exit signs.
    if opp_dir_edge1.exit_sign() || opp_dir_edge2.exit_sign() {
        return false;
    }

    // No turn restriction from either inbound edge onto the other
    // outbound edge.
    if opp_dir_edge1.restrictions & (1 << edge2.local_edge_idx) != 0
        || opp_dir_edge2.restrictions & (1 << edge1.local_edge_idx) != 0
    {
        return false;
    }

    // The ISO country code at both end nodes must equal this node's.
    let iso = match tile.admin_info(nodeinfo.admin_index) {
        Ok(admin) => admin.country_iso,
        Err(e) => {
            error!("admin lookup failed at {}: {:#}", base_node, e);
            return false;
        }
    };
    let e1_iso = end_node_iso(&edge1, reader);
    let e2_iso = end_node_iso(&edge2, reader);
    if e1_iso.as_deref() != Some(iso.as_str()) || e2_iso.as_deref() != Some(iso.as_str()) {
        return false;
    }

    // If the continuation would be a real turn and other driveable
    // edges meet here (a crossing or a T), keep the node.
    if nodeinfo.local_edge_count > 2 {
        let driveable = (0..nodeinfo.local_edge_count)
            .filter(|&i| nodeinfo.local_driveability(i) != Traversability::None)
            .count();
        if driveable > 2 {
            let heading1 = (nodeinfo.heading(edge1.local_edge_idx) + 180) % 360;
            let degree = turn_degree(heading1, nodeinfo.heading(edge2.local_edge_idx));
            if degree > MAX_CONTRACTION_TURN && degree < 360 - MAX_CONTRACTION_TURN {
                return false;
            }
        }
    }

    // Store the pairs of base edges entering and exiting this node:
    // enter on the opposing side of one match, leave on the other.
    ctx.contractions.insert(
        new_node.value(),
        EdgePairs {
            edge1: (opp_edge1, edges[mj]),
            edge2: (opp_edge2, edges[mi]),
        },
    );
    ctx.contract_count += 1;
    true
}
