//! Graph primitives: identifiers, road attribute enums, and the fixed
//! size node/edge records stored in tiles.

pub mod edge;
pub mod id;
pub mod node;
pub mod types;

pub use edge::DirectedEdge;
pub use id::GraphId;
pub use node::NodeInfo;
pub use types::{
    Access, IntersectionType, NodeType, RoadClass, Surface, Traversability, Use, ALL_ACCESS,
};
