//! Shared test fixture: builds a small base-level tile set from a
//! plain node/edge description.

use std::collections::HashMap;
use std::path::Path;

use butterfly_hierarchy::geo::haversine_distance;
use butterfly_hierarchy::graph::{
    DirectedEdge, GraphId, IntersectionType, NodeInfo, NodeType, RoadClass, Traversability,
    ALL_ACCESS,
};
use butterfly_hierarchy::tile::{
    AccessRestriction, AccessRestrictionKind, SignInfo, SignType, Tile, TileBuilder,
    TileHierarchy,
};

pub struct NodeSpec {
    lat: f64,
    lon: f64,
    country_iso: String,
    node_type: NodeType,
    intersection: IntersectionType,
}

pub struct EdgeSpec {
    a: usize,
    b: usize,
    classification: RoadClass,
    speed: u8,
    names: Vec<String>,
    wayid: i64,
}

/// Declarative road network; `store` lays it out as base-level tiles.
#[derive(Default)]
pub struct GraphFixture {
    nodes: Vec<NodeSpec>,
    edges: Vec<EdgeSpec>,
    // After traversing a->b, turning into b->c is forbidden.
    turn_restrictions: Vec<(usize, usize, usize)>,
    // Exit sign text on the directed edge a->b.
    exit_signs: Vec<(usize, usize, String)>,
    // Access restriction (max height value) on the directed edge a->b.
    access_restrictions: Vec<(usize, usize, u64)>,
}

impl GraphFixture {
    pub fn new() -> GraphFixture {
        GraphFixture::default()
    }

    pub fn add_node(&mut self, lat: f64, lon: f64, country_iso: &str) -> usize {
        self.nodes.push(NodeSpec {
            lat,
            lon,
            country_iso: country_iso.to_string(),
            node_type: NodeType::Street,
            intersection: IntersectionType::Regular,
        });
        self.nodes.len() - 1
    }

    pub fn set_node_type(&mut self, node: usize, node_type: NodeType) {
        self.nodes[node].node_type = node_type;
    }

    pub fn set_intersection(&mut self, node: usize, intersection: IntersectionType) {
        self.nodes[node].intersection = intersection;
    }

    /// Add a bidirectional road between two nodes.
    pub fn add_road(&mut self, a: usize, b: usize, classification: RoadClass, names: &[&str]) {
        let wayid = 1000 + self.edges.len() as i64;
        self.edges.push(EdgeSpec {
            a,
            b,
            classification,
            speed: 90,
            names: names.iter().map(|n| n.to_string()).collect(),
            wayid,
        });
    }

    pub fn restrict_turn(&mut self, a: usize, b: usize, c: usize) {
        self.turn_restrictions.push((a, b, c));
    }

    pub fn exit_sign(&mut self, a: usize, b: usize, text: &str) {
        self.exit_signs.push((a, b, text.to_string()));
    }

    pub fn access_restriction(&mut self, a: usize, b: usize, value: u64) {
        self.access_restrictions.push((a, b, value));
    }

    /// Write the base-level tiles under `tile_dir`. Returns the base
    /// GraphId of each fixture node, in fixture order.
    pub fn store(&self, tile_dir: &Path) -> Vec<GraphId> {
        let hierarchy = TileHierarchy::standard();
        let base_level = hierarchy.levels().last().unwrap();

        // Assign ids: nodes keep fixture order within their tile.
        let mut per_tile: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut node_ids = Vec::with_capacity(self.nodes.len());
        for (n, spec) in self.nodes.iter().enumerate() {
            let tile_id = base_level.grid.tile_id(spec.lat, spec.lon);
            let members = per_tile.entry(tile_id).or_default();
            node_ids.push(GraphId::new(
                tile_id,
                base_level.level,
                members.len() as u32,
            ));
            members.push(n);
        }

        // Outgoing adjacency in edge declaration order: (other node,
        // edge spec index, runs in spec direction).
        let mut outgoing: Vec<Vec<(usize, usize, bool)>> = vec![Vec::new(); self.nodes.len()];
        for (e, spec) in self.edges.iter().enumerate() {
            outgoing[spec.a].push((spec.b, e, true));
            outgoing[spec.b].push((spec.a, e, false));
        }
        let local_idx = |n: usize, e: usize| -> u8 {
            outgoing[n].iter().position(|&(_, oe, _)| oe == e).unwrap() as u8
        };

        let mut tile_ids: Vec<u32> = per_tile.keys().copied().collect();
        tile_ids.sort_unstable();
        for tile_id in tile_ids {
            let members = &per_tile[&tile_id];
            let mut builder =
                TileBuilder::new_tile(tile_dir, GraphId::new(tile_id, base_level.level, 0));
            builder.add_admin("None", "None", "", "");

            for &n in members {
                let spec = &self.nodes[n];
                let admin_index =
                    builder.add_admin(&spec.country_iso, "", &spec.country_iso, "");

                let mut node = NodeInfo {
                    lat: spec.lat,
                    lon: spec.lon,
                    edge_index: builder.directededges().len() as u32,
                    edge_count: outgoing[n].len() as u32,
                    admin_index,
                    timezone: 0,
                    best_road_class: outgoing[n]
                        .iter()
                        .map(|&(_, e, _)| self.edges[e].classification)
                        .min()
                        .unwrap_or(RoadClass::ServiceOther),
                    local_edge_count: outgoing[n].len().min(8) as u8,
                    node_type: spec.node_type,
                    intersection: spec.intersection,
                    ..Default::default()
                };
                for (k, &(other, _, _)) in outgoing[n].iter().take(8).enumerate() {
                    node.headings[k] = bearing(
                        (spec.lat, spec.lon),
                        (self.nodes[other].lat, self.nodes[other].lon),
                    );
                    node.driveability[k] = Traversability::Both;
                }
                builder.nodes_mut().push(node);

                for &(other, e, in_spec_direction) in &outgoing[n] {
                    let espec = &self.edges[e];
                    let other_spec = &self.nodes[other];
                    let length = haversine_distance(
                        spec.lat,
                        spec.lon,
                        other_spec.lat,
                        other_spec.lon,
                    )
                    .round()
                    .max(1.0) as u32;

                    let mut edge = DirectedEdge::default();
                    edge.end_node = node_ids[other];
                    edge.length = length;
                    edge.classification = espec.classification;
                    edge.speed = espec.speed;
                    edge.forward_access = ALL_ACCESS;
                    edge.reverse_access = ALL_ACCESS;
                    edge.set_forward(in_spec_direction);
                    edge.local_edge_idx = local_idx(n, e);
                    edge.opp_local_idx = local_idx(other, e);

                    // Turn restrictions live on the edge entering the
                    // via node, as a mask over its outbound local
                    // indices.
                    for &(ra, rb, rc) in &self.turn_restrictions {
                        if ra == n && rb == other {
                            let forbidden =
                                outgoing[rb].iter().position(|&(o, _, _)| o == rc).unwrap();
                            edge.restrictions |= 1 << forbidden;
                        }
                    }

                    // Shape is stored in spec direction.
                    let shape = [
                        (self.nodes[espec.a].lat, self.nodes[espec.a].lon),
                        (self.nodes[espec.b].lat, self.nodes[espec.b].lon),
                    ];
                    let (offset, _) = builder.add_edge_info(
                        length,
                        node_ids[n],
                        node_ids[other],
                        espec.wayid,
                        &shape,
                        &espec.names,
                    );
                    edge.edgeinfo_offset = offset;

                    let edge_index = builder.directededges().len() as u32;
                    for (sa, sb, text) in &self.exit_signs {
                        if *sa == n && *sb == other {
                            edge.set_exit_sign(true);
                            builder.add_signs(
                                edge_index,
                                &[SignInfo {
                                    sign_type: SignType::ExitNumber,
                                    text: text.clone(),
                                }],
                            );
                        }
                    }
                    for (aa, ab, value) in &self.access_restrictions {
                        if *aa == n && *ab == other {
                            edge.set_access_restriction(true);
                            builder.add_access_restriction(AccessRestriction {
                                edge_index,
                                kind: AccessRestrictionKind::MaxHeight,
                                modes: ALL_ACCESS,
                                value: *value,
                            });
                        }
                    }

                    builder.directededges_mut().push(edge);
                }
            }

            builder.store_tile_data().unwrap();
        }

        node_ids
    }
}

/// Initial bearing in whole degrees from one point toward another.
fn bearing(from: (f64, f64), to: (f64, f64)) -> u16 {
    let lat1 = from.0.to_radians();
    let lat2 = to.0.to_radians();
    let dlon = (to.1 - from.1).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let deg = y.atan2(x).to_degrees();
    (((deg + 360.0) % 360.0).round() as u16) % 360
}

/// The directed edges of one node as (tile edge index, edge) pairs.
pub fn edges_of(tile: &Tile, node_id: u32) -> Vec<(u32, DirectedEdge)> {
    let node = tile.node(node_id);
    (node.edge_index..node.edge_index + node.edge_count)
        .map(|idx| (idx, tile.directededge(idx).clone()))
        .collect()
}

/// Sum of the base lengths of the fixture edges along a node path.
pub fn path_length(tile_dir: &Path, node_ids: &[GraphId]) -> u32 {
    let mut total = 0;
    for pair in node_ids.windows(2) {
        let tile = Tile::read(tile_dir, pair[0]).unwrap();
        let edges = edges_of(&tile, pair[0].id());
        let (_, edge) = edges
            .iter()
            .find(|(_, e)| e.end_node == pair[1])
            .expect("fixture edge between adjacent path nodes");
        total += edge.length;
    }
    total
}
