//! Shortcut chain walking: append one base edge to a growing shortcut.

use std::collections::HashMap;

use anyhow::{anyhow, Context as _, Result};
use log::error;

use crate::geo::LatLon;
use crate::graph::GraphId;
use crate::tile::TileReader;

/// Running state of a shortcut being stitched together. The
/// restriction mask and opposing local index always reflect the last
/// edge appended, which is what the finished shortcut must carry.
#[derive(Debug)]
pub struct WalkState {
    pub shape: Vec<LatLon>,
    /// New-level id of the node the walk currently ends at.
    pub cursor: GraphId,
    pub opp_local_idx: u8,
    pub restrictions: u8,
}

impl WalkState {
    pub fn new(shape: Vec<LatLon>, cursor: GraphId) -> WalkState {
        WalkState {
            shape,
            cursor,
            opp_local_idx: 0,
            restrictions: 0,
        }
    }
}

/// Append the base edge `edge_id` to the walk: extend the shape
/// (dropping the duplicated seam point), advance the cursor to the new
/// level id of the edge's end node, and take over the edge's
/// restriction mask and opposing local index. Returns the edge length
/// in meters.
///
/// A lookup miss is logged and returned as an error so the caller can
/// terminate the shortcut cleanly rather than emit bad geometry.
pub fn connect_edge(
    edge_id: GraphId,
    state: &mut WalkState,
    node_map: &HashMap<u64, GraphId>,
    reader: &mut TileReader,
) -> Result<u32> {
    let tile = reader
        .get_tile(edge_id)
        .ok_or_else(|| anyhow!("no tile for edge {}", edge_id))?;
    let edge = tile.directededge(edge_id.id());

    state.opp_local_idx = edge.opp_local_idx;
    state.restrictions = edge.restrictions;

    // Edge shape is stored in its forward orientation; reverse it when
    // the edge traverses the shape backward.
    let info = tile
        .edgeinfo(edge.edgeinfo_offset)
        .with_context(|| format!("decoding shape of edge {}", edge_id))?;
    let mut edge_shape = info.shape;
    if !edge.forward() {
        edge_shape.reverse();
    }

    // The first point duplicates the last point of the prior edge.
    state.shape.extend(edge_shape.into_iter().skip(1));

    match node_map.get(&edge.end_node.value()) {
        Some(&mapped) => state.cursor = mapped,
        None => {
            error!(
                "end node {} of edge {} is not in the promotion map",
                edge.end_node, edge_id
            );
            return Err(anyhow!("unpromoted end node on shortcut chain"));
        }
    }
    Ok(edge.length)
}
