//! Road attribute enums shared by nodes and directed edges.
//!
//! All of these have a stable `u8` encoding used by the tile codec.
//! `RoadClass` ordering matters: lower values are more important
//! roads, and a hierarchy level keeps an edge iff its class is <= the
//! level's importance cutoff.

/// Road classification, most important first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum RoadClass {
    Motorway = 0,
    Trunk = 1,
    Primary = 2,
    Secondary = 3,
    Tertiary = 4,
    Unclassified = 5,
    Residential = 6,
    ServiceOther = 7,
}

impl RoadClass {
    pub fn from_u8(v: u8) -> RoadClass {
        match v {
            0 => RoadClass::Motorway,
            1 => RoadClass::Trunk,
            2 => RoadClass::Primary,
            3 => RoadClass::Secondary,
            4 => RoadClass::Tertiary,
            5 => RoadClass::Unclassified,
            6 => RoadClass::Residential,
            _ => RoadClass::ServiceOther,
        }
    }
}

/// What an edge is used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Use {
    Road = 0,
    Ramp = 1,
    Turnpike = 2,
    Track = 3,
    Driveway = 4,
    Alley = 5,
    ParkingAisle = 6,
    Ferry = 7,
    RailFerry = 8,
    Other = 9,
}

impl Use {
    pub fn from_u8(v: u8) -> Use {
        match v {
            0 => Use::Road,
            1 => Use::Ramp,
            2 => Use::Turnpike,
            3 => Use::Track,
            4 => Use::Driveway,
            5 => Use::Alley,
            6 => Use::ParkingAisle,
            7 => Use::Ferry,
            8 => Use::RailFerry,
            _ => Use::Other,
        }
    }
}

/// Surface type, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Surface {
    PavedSmooth = 0,
    Paved = 1,
    PavedRough = 2,
    Compacted = 3,
    Dirt = 4,
    Gravel = 5,
    Path = 6,
    Impassable = 7,
}

impl Surface {
    pub fn from_u8(v: u8) -> Surface {
        match v {
            0 => Surface::PavedSmooth,
            1 => Surface::Paved,
            2 => Surface::PavedRough,
            3 => Surface::Compacted,
            4 => Surface::Dirt,
            5 => Surface::Gravel,
            6 => Surface::Path,
            _ => Surface::Impassable,
        }
    }
}

/// Node types that affect traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Street = 0,
    Gate = 1,
    TollBooth = 2,
    BorderControl = 3,
}

impl NodeType {
    pub fn from_u8(v: u8) -> NodeType {
        match v {
            0 => NodeType::Street,
            1 => NodeType::Gate,
            2 => NodeType::TollBooth,
            _ => NodeType::BorderControl,
        }
    }
}

/// Intersection shape at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IntersectionType {
    Regular = 0,
    Fork = 1,
    DeadEnd = 2,
}

impl IntersectionType {
    pub fn from_u8(v: u8) -> IntersectionType {
        match v {
            0 => IntersectionType::Regular,
            1 => IntersectionType::Fork,
            _ => IntersectionType::DeadEnd,
        }
    }
}

/// Whether a local edge can be driven, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Traversability {
    None = 0,
    Forward = 1,
    Backward = 2,
    Both = 3,
}

impl Traversability {
    pub fn from_u8(v: u8) -> Traversability {
        match v {
            1 => Traversability::Forward,
            2 => Traversability::Backward,
            3 => Traversability::Both,
            _ => Traversability::None,
        }
    }
}

/// Travel mode access bits.
pub type Access = u8;

pub const AUTO_ACCESS: Access = 1 << 0;
pub const TRUCK_ACCESS: Access = 1 << 1;
pub const BUS_ACCESS: Access = 1 << 2;
pub const BICYCLE_ACCESS: Access = 1 << 3;
pub const PEDESTRIAN_ACCESS: Access = 1 << 4;
pub const ALL_ACCESS: Access = 0x1f;
