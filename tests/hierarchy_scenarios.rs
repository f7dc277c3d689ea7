//! End-to-end hierarchy builds over small synthetic road networks.
//!
//! Each test lays out base-level tiles with the fixture, runs the full
//! builder, and re-reads the emitted tiles through the codec.

mod common;

use std::path::Path;

use butterfly_hierarchy::config::Config;
use butterfly_hierarchy::graph::{GraphId, IntersectionType, NodeType, RoadClass};
use butterfly_hierarchy::hierarchy::HierarchyBuilder;
use butterfly_hierarchy::tile::{Tile, TileHierarchy};
use tempfile::TempDir;

use common::{edges_of, path_length, GraphFixture};

fn build(tile_dir: &Path) {
    HierarchyBuilder::build(&Config::with_tile_dir(tile_dir)).unwrap();
}

fn arterial_tile_id(lat: f64, lon: f64) -> u32 {
    TileHierarchy::standard()
        .level(1)
        .unwrap()
        .grid
        .tile_id(lat, lon)
}

#[test]
fn test_straight_chain_collapses_to_shortcut() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St"]);
    // A no-u-turn at C: after B->C, the turn back into C->B is
    // forbidden. The shortcut must end up carrying this mask.
    g.restrict_turn(b, c, b);
    let ids = g.store(tmp.path());
    let expected_len = path_length(tmp.path(), &[ids[0], ids[1], ids[2]]);

    build(tmp.path());

    let t1 = arterial_tile_id(40.02, -76.40);
    let tile = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    assert_eq!(tile.header().node_count, 3);

    // A': shortcut to C' first, then the surviving edge to B', the
    // downward transition, and the upward transition added when the
    // highway level was built on top.
    let a_edges = edges_of(&tile, 0);
    assert_eq!(a_edges.len(), 4);
    let (_, shortcut) = &a_edges[0];
    assert!(shortcut.is_shortcut());
    assert_eq!(shortcut.shortcut, 1);
    assert_eq!(shortcut.end_node, GraphId::new(t1, 1, 2));
    assert_eq!(shortcut.length, expected_len);
    assert_eq!(shortcut.restrictions, 1, "mask of the last chain edge");
    assert_eq!(shortcut.opp_local_idx, 0);
    assert!(shortcut.forward());

    // Shortcut shape is the concatenated chain with seam points
    // dropped: A, B, C.
    let info = tile.edgeinfo(shortcut.edgeinfo_offset).unwrap();
    assert_eq!(info.shape.len(), 3);
    assert!((info.shape[0].0 - 40.01).abs() < 1e-5);
    assert!((info.shape[2].0 - 40.03).abs() < 1e-5);
    assert_eq!(info.names, vec!["Main St".to_string()]);
    assert_eq!(info.wayid, -1);

    // The surviving A'->B' edge is superseded by shortcut 1.
    let (_, survivor) = &a_edges[1];
    assert!(!survivor.is_shortcut());
    assert_eq!(survivor.end_node, GraphId::new(t1, 1, 1));
    assert_eq!(survivor.superseded, 1);
    let (_, down) = &a_edges[2];
    assert!(down.trans_down());
    assert_eq!(down.end_node, ids[0]);
    assert!(a_edges[3].1.trans_up());

    // C': the reverse shortcut back to A', sharing the stored shape
    // in reverse, with the mask of its own last chain edge (B->A,
    // unrestricted).
    let c_edges = edges_of(&tile, 2);
    let (_, reverse) = &c_edges[0];
    assert!(reverse.is_shortcut());
    assert_eq!(reverse.end_node, GraphId::new(t1, 1, 0));
    assert_eq!(reverse.length, expected_len);
    assert!(!reverse.forward());
    assert_eq!(reverse.edgeinfo_offset, shortcut.edgeinfo_offset);
    assert_eq!(reverse.restrictions, 0);

    // B' is carried with both through-edges; no shortcut starts at a
    // contracted node, so nothing there is superseded.
    let b_edges = edges_of(&tile, 1);
    assert_eq!(b_edges.len(), 4);
    assert!(b_edges.iter().all(|(_, e)| !e.is_shortcut()));
    assert_eq!(b_edges[0].1.superseded, 0);
    assert_eq!(b_edges[1].1.superseded, 0);
}

#[test]
fn test_promoted_nodes_gain_upward_transitions() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St"]);
    let ids = g.store(tmp.path());

    build(tmp.path());

    // Every promoted base node ends up with exactly one trans_up, as
    // its last outgoing edge, pointing at its new-level counterpart.
    let t1 = arterial_tile_id(40.02, -76.40);
    let base = Tile::read(tmp.path(), ids[0]).unwrap();
    for (i, &id) in ids.iter().enumerate() {
        let edges = edges_of(&base, id.id());
        let ups: Vec<_> = edges.iter().filter(|(_, e)| e.trans_up()).collect();
        assert_eq!(ups.len(), 1, "node {} should have one trans_up", i);
        let (_, last) = edges.last().unwrap();
        assert!(last.trans_up(), "trans_up is the last outgoing edge");
        assert_eq!(last.end_node, GraphId::new(t1, 1, i as u32));
    }

    // Round trip: the patched tile's trans_up count equals the number
    // of promoted nodes in it.
    let total_ups = base
        .directededges()
        .iter()
        .filter(|e| e.trans_up())
        .count();
    assert_eq!(total_ups, 3);
    assert_eq!(
        base.header().directed_edge_count,
        4 + 3,
        "two roads give four directed edges; three transitions appended"
    );

    // The chain contracts again onto the highway level, where the
    // arterial nodes in turn gain their own upward transitions.
    let arterial = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    assert_eq!(
        arterial
            .directededges()
            .iter()
            .filter(|e| e.trans_up())
            .count(),
        3
    );
    let t0 = TileHierarchy::standard()
        .level(0)
        .unwrap()
        .grid
        .tile_id(40.02, -76.40);
    let highway = Tile::read(tmp.path(), GraphId::new(t0, 0, 0)).unwrap();
    assert_eq!(highway.header().node_count, 3);
    assert!(highway.directededges().iter().any(|e| e.is_shortcut()));
}

#[test]
fn test_fork_blocks_contraction() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "US");
    let d = g.add_node(40.02, -76.38, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St"]);
    g.add_road(b, d, RoadClass::Tertiary, &["Spur Rd"]);
    g.set_intersection(b, IntersectionType::Fork);
    g.store(tmp.path());

    build(tmp.path());

    let t1 = arterial_tile_id(40.02, -76.40);
    let tile = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    assert_eq!(tile.header().node_count, 4);
    assert!(
        tile.directededges().iter().all(|e| !e.is_shortcut()),
        "a fork is never contracted"
    );
    // B' keeps all three simple edges (plus the two transitions).
    let b_edges = edges_of(&tile, 1);
    assert_eq!(b_edges.len(), 5);
}

#[test]
fn test_gate_blocks_contraction() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St"]);
    g.set_node_type(b, NodeType::Gate);
    g.store(tmp.path());

    build(tmp.path());

    let t1 = arterial_tile_id(40.02, -76.40);
    let tile = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    assert_eq!(tile.header().node_count, 3);
    assert!(
        tile.directededges().iter().all(|e| !e.is_shortcut()),
        "a gate must stay a real node"
    );
}

#[test]
fn test_country_border_blocks_contraction() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "CA");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St"]);
    g.store(tmp.path());

    build(tmp.path());

    let t1 = arterial_tile_id(40.02, -76.40);
    let tile = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    // B is promoted but not contracted: the country code changes at C.
    assert_eq!(tile.header().node_count, 3);
    assert!(tile.directededges().iter().all(|e| !e.is_shortcut()));
}

#[test]
fn test_turn_restriction_blocks_contraction() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St"]);
    // Entering B on A->B may not continue into B->C.
    g.restrict_turn(a, b, c);
    g.store(tmp.path());

    build(tmp.path());

    let t1 = arterial_tile_id(40.02, -76.40);
    let tile = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    assert_eq!(tile.header().node_count, 3);
    assert!(tile.directededges().iter().all(|e| !e.is_shortcut()));
}

#[test]
fn test_name_set_mismatch_blocks_contraction() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St", "US 1"]);
    g.store(tmp.path());

    build(tmp.path());

    let t1 = arterial_tile_id(40.02, -76.40);
    let tile = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    assert!(tile.directededges().iter().all(|e| !e.is_shortcut()));
}

#[test]
fn test_shortcut_chain_crosses_new_tile_boundary() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    // B sits in one arterial (1 degree) tile, C in the next one east.
    let a = g.add_node(40.1, -76.3, "US");
    let b = g.add_node(40.1, -76.1, "US");
    let c = g.add_node(40.1, -75.9, "US");
    let d = g.add_node(40.1, -75.7, "US");
    g.add_road(a, b, RoadClass::Primary, &["US 30"]);
    g.add_road(b, c, RoadClass::Primary, &["US 30"]);
    g.add_road(c, d, RoadClass::Primary, &["US 30"]);
    let ids = g.store(tmp.path());
    let expected_len = path_length(tmp.path(), &[ids[0], ids[1], ids[2], ids[3]]);

    build(tmp.path());

    let tx = arterial_tile_id(40.1, -76.3);
    let ty = arterial_tile_id(40.1, -75.9);
    assert_ne!(tx, ty);

    // The forward shortcut lives in A's tile and spans the whole
    // chain, across the new-tile boundary between B and C.
    let tile_x = Tile::read(tmp.path(), GraphId::new(tx, 1, 0)).unwrap();
    assert_eq!(tile_x.header().node_count, 2);
    let a_edges = edges_of(&tile_x, 0);
    let (_, shortcut) = &a_edges[0];
    assert!(shortcut.is_shortcut());
    assert_eq!(shortcut.end_node, GraphId::new(ty, 1, 1));
    assert_eq!(shortcut.length, expected_len);
    assert!(shortcut.forward());
    let info = tile_x.edgeinfo(shortcut.edgeinfo_offset).unwrap();
    assert_eq!(info.shape.len(), 4);

    // The reverse shortcut starts at D in the other tile and stores
    // its own shape there.
    let tile_y = Tile::read(tmp.path(), GraphId::new(ty, 1, 0)).unwrap();
    let d_edges = edges_of(&tile_y, 1);
    let (_, reverse) = &d_edges[0];
    assert!(reverse.is_shortcut());
    assert_eq!(reverse.end_node, GraphId::new(tx, 1, 0));
    assert_eq!(reverse.length, expected_len);
    assert!(reverse.forward(), "first entry in its own tile");
    let rev_info = tile_y.edgeinfo(reverse.edgeinfo_offset).unwrap();
    assert_eq!(rev_info.shape.len(), 4);
    // Laid out from D toward A.
    assert!((rev_info.shape[0].1 - (-75.7)).abs() < 1e-5);
    assert!((rev_info.shape[3].1 - (-76.3)).abs() < 1e-5);
}

#[test]
fn test_signs_and_restrictions_survive_patching() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    let c = g.add_node(40.03, -76.39, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.add_road(b, c, RoadClass::Primary, &["Main St"]);
    // The fork keeps B un-contracted so the sign-carrying edge
    // survives as a plain edge.
    g.set_intersection(b, IntersectionType::Fork);
    g.exit_sign(b, c, "12B");
    g.access_restriction(a, b, 410);
    let ids = g.store(tmp.path());

    build(tmp.path());

    // Patched base tile: records must still resolve to the edges that
    // own them after three transition edges were spliced in.
    let base = Tile::read(tmp.path(), ids[0]).unwrap();
    assert_eq!(base.header().sign_count, 1);
    assert_eq!(base.header().access_restriction_count, 1);

    let sign = &base.signs()[0];
    let signed_edge = base.directededge(sign.edge_index);
    assert!(signed_edge.exit_sign());
    assert_eq!(signed_edge.end_node, ids[2]);
    assert_eq!(base.get_signs(sign.edge_index)[0].text, "12B");

    let res = &base.access_restrictions()[0];
    let restricted_edge = base.directededge(res.edge_index);
    assert!(restricted_edge.access_restriction());
    assert_eq!(restricted_edge.end_node, ids[1]);
    assert_eq!(res.value, 410);

    // The records were also carried into the new level, re-keyed to
    // the surviving edges there.
    let t1 = arterial_tile_id(40.02, -76.40);
    let arterial = Tile::read(tmp.path(), GraphId::new(t1, 1, 0)).unwrap();
    assert_eq!(arterial.header().sign_count, 1);
    let sign = &arterial.signs()[0];
    assert!(arterial.directededge(sign.edge_index).exit_sign());
    assert_eq!(arterial.get_signs(sign.edge_index)[0].text, "12B");
    assert_eq!(arterial.header().access_restriction_count, 1);
    let res = &arterial.access_restrictions()[0];
    assert!(arterial.directededge(res.edge_index).access_restriction());
}

#[test]
fn test_rebuild_on_built_base_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut g = GraphFixture::new();
    let a = g.add_node(40.01, -76.41, "US");
    let b = g.add_node(40.02, -76.40, "US");
    g.add_road(a, b, RoadClass::Primary, &["Main St"]);
    g.store(tmp.path());

    build(tmp.path());

    // The builder assumes a clean base; a second run must refuse to
    // stack transitions on transitions.
    let err = HierarchyBuilder::build(&Config::with_tile_dir(tmp.path()))
        .expect_err("rebuilding on built output must fail");
    assert!(
        err.to_string().contains("clean base"),
        "unexpected error: {err:#}"
    );
}
