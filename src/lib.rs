//! Butterfly-Hierarchy: multi-level routing graph hierarchy builder
//!
//! Pipeline (one pass per level transition, finest to coarsest):
//! - Promote: scan base tiles, decide which nodes appear on the new level
//! - Contract: decide which promoted nodes collapse into shortcut chains
//! - Assemble: emit the coarser tiles (shortcuts, surviving edges,
//!   downward transitions)
//! - Patch: rewrite the base tiles to append upward transition edges
//!
//! Key principle: base tiles are the single source of truth. Every
//! coarser level is derived from them and wired back with transition
//! edges so a router can move between levels.

pub mod cli;
pub mod config;
pub mod elevation;
pub mod geo;
pub mod graph;
pub mod hierarchy;
pub mod tile;

pub use config::Config;
pub use graph::{DirectedEdge, GraphId, NodeInfo, RoadClass};
pub use hierarchy::HierarchyBuilder;
pub use tile::{Tile, TileBuilder, TileReader};
