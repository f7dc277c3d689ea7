//! Compact graph identifiers.
//!
//! A `GraphId` names a node or a directed edge within the tiled graph:
//! 3 bits of hierarchy level, 22 bits of tile id, 21 bits of index
//! within the tile, packed into a `u64`. The same packing is used on
//! disk, so ids round-trip through the codec without translation.

use std::cmp::Ordering;
use std::fmt;

const LEVEL_BITS: u32 = 3;
const TILE_BITS: u32 = 22;
const ID_BITS: u32 = 21;

const LEVEL_MASK: u64 = (1 << LEVEL_BITS) - 1;
const TILE_MASK: u64 = (1 << TILE_BITS) - 1;
const ID_MASK: u64 = (1 << ID_BITS) - 1;

/// Sentinel for "no such node/edge".
const INVALID: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u64);

impl GraphId {
    pub fn new(tile: u32, level: u8, id: u32) -> Self {
        debug_assert!(u64::from(level) <= LEVEL_MASK);
        debug_assert!(u64::from(tile) <= TILE_MASK);
        debug_assert!(u64::from(id) <= ID_MASK);
        GraphId(
            (u64::from(level) & LEVEL_MASK)
                | ((u64::from(tile) & TILE_MASK) << LEVEL_BITS)
                | ((u64::from(id) & ID_MASK) << (LEVEL_BITS + TILE_BITS)),
        )
    }

    pub fn invalid() -> Self {
        GraphId(INVALID)
    }

    pub fn from_value(value: u64) -> Self {
        GraphId(value)
    }

    /// The packed representation, usable as a map key.
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != INVALID
    }

    pub fn level(self) -> u8 {
        (self.0 & LEVEL_MASK) as u8
    }

    pub fn tile(self) -> u32 {
        ((self.0 >> LEVEL_BITS) & TILE_MASK) as u32
    }

    pub fn id(self) -> u32 {
        ((self.0 >> (LEVEL_BITS + TILE_BITS)) & ID_MASK) as u32
    }

    /// Id of the tile this object lives in (intra-tile index zeroed).
    pub fn tile_base(self) -> GraphId {
        GraphId::new(self.tile(), self.level(), 0)
    }

    /// Next object in the same tile.
    pub fn next(self) -> GraphId {
        GraphId::new(self.tile(), self.level(), self.id() + 1)
    }
}

impl PartialOrd for GraphId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.level(), self.tile(), self.id()).cmp(&(other.level(), other.tile(), other.id()))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}/{}/{}", self.level(), self.tile(), self.id())
        } else {
            write!(f, "invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let id = GraphId::new(794, 2, 12345);
        assert_eq!(id.tile(), 794);
        assert_eq!(id.level(), 2);
        assert_eq!(id.id(), 12345);
        assert!(id.is_valid());

        // Extremes of each field
        let max = GraphId::new((1 << 22) - 1, 7, (1 << 21) - 1);
        assert_eq!(max.tile(), (1 << 22) - 1);
        assert_eq!(max.level(), 7);
        assert_eq!(max.id(), (1 << 21) - 1);
    }

    #[test]
    fn test_invalid_sentinel() {
        let id = GraphId::invalid();
        assert!(!id.is_valid());
        assert!(GraphId::new(0, 0, 0).is_valid());
    }

    #[test]
    fn test_ordering_by_level_tile_id() {
        let a = GraphId::new(5, 0, 9);
        let b = GraphId::new(1, 1, 0);
        let c = GraphId::new(2, 1, 0);
        let d = GraphId::new(2, 1, 3);
        assert!(a < b, "level dominates tile");
        assert!(b < c, "tile dominates id");
        assert!(c < d);
    }

    #[test]
    fn test_next() {
        let id = GraphId::new(7, 1, 3);
        let n = id.next();
        assert_eq!(n.tile(), 7);
        assert_eq!(n.level(), 1);
        assert_eq!(n.id(), 4);
    }

    #[test]
    fn test_value_roundtrip() {
        let id = GraphId::new(123, 1, 456);
        assert_eq!(GraphId::from_value(id.value()), id);
    }
}
