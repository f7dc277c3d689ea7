//! Hierarchy levels and their tiling grids.

use crate::graph::RoadClass;

/// A regular lat/lon tiling of the world, row-major from the
/// southwest corner (-90, -180).
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    tile_size: f64,
    ncols: u32,
    nrows: u32,
}

impl TileGrid {
    pub fn new(tile_size: f64) -> TileGrid {
        assert!(tile_size > 0.0);
        TileGrid {
            tile_size,
            ncols: (360.0 / tile_size).round() as u32,
            nrows: (180.0 / tile_size).round() as u32,
        }
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    pub fn tile_count(&self) -> u32 {
        self.ncols * self.nrows
    }

    /// Tile id containing the given point. Points on a tile boundary
    /// belong to the tile to the north/east; the outermost row and
    /// column clamp so poles and the antimeridian stay addressable.
    pub fn tile_id(&self, lat: f64, lon: f64) -> u32 {
        let row = (((lat + 90.0) / self.tile_size) as u32).min(self.nrows - 1);
        let col = (((lon + 180.0) / self.tile_size) as u32).min(self.ncols - 1);
        row * self.ncols + col
    }
}

/// One level of the hierarchy: a name, a classification cutoff, and a
/// tiling grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLevel {
    pub level: u8,
    pub name: &'static str,
    /// Edges with classification <= this cutoff survive at the level.
    pub importance: RoadClass,
    pub grid: TileGrid,
}

/// The set of levels, ordered coarsest (level 0) to finest. The last
/// entry is the local/base level holding every node and edge.
#[derive(Debug, Clone)]
pub struct TileHierarchy {
    levels: Vec<TileLevel>,
}

impl TileHierarchy {
    /// The standard three-level hierarchy.
    pub fn standard() -> TileHierarchy {
        TileHierarchy {
            levels: vec![
                TileLevel {
                    level: 0,
                    name: "highway",
                    importance: RoadClass::Primary,
                    grid: TileGrid::new(4.0),
                },
                TileLevel {
                    level: 1,
                    name: "arterial",
                    importance: RoadClass::Tertiary,
                    grid: TileGrid::new(1.0),
                },
                TileLevel {
                    level: 2,
                    name: "local",
                    importance: RoadClass::ServiceOther,
                    grid: TileGrid::new(0.25),
                },
            ],
        }
    }

    /// Levels ordered coarsest first.
    pub fn levels(&self) -> &[TileLevel] {
        &self.levels
    }

    pub fn level(&self, level: u8) -> Option<&TileLevel> {
        self.levels.iter().find(|l| l.level == level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_corners() {
        let grid = TileGrid::new(1.0);
        assert_eq!(grid.tile_count(), 360 * 180);
        assert_eq!(grid.tile_id(-90.0, -180.0), 0);
        assert_eq!(grid.tile_id(-90.0, -179.5), 0);
        assert_eq!(grid.tile_id(-89.5, -180.0), 0);
        // One tile east
        assert_eq!(grid.tile_id(-90.0, -179.0), 1);
        // One row north
        assert_eq!(grid.tile_id(-89.0, -180.0), 360);
        // Extreme corner clamps into the last tile
        assert_eq!(grid.tile_id(90.0, 180.0), 360 * 180 - 1);
    }

    #[test]
    fn test_grid_known_tile() {
        // Harrisburg PA, 1 degree tiles: row = 40 + 90 = 130,
        // col = -77 + 180 = 103
        let grid = TileGrid::new(1.0);
        assert_eq!(grid.tile_id(40.27, -76.88), 130 * 360 + 103);
    }

    #[test]
    fn test_quarter_degree_grid() {
        let grid = TileGrid::new(0.25);
        assert_eq!(grid.tile_count(), 1440 * 720);
        let a = grid.tile_id(40.0, -76.5);
        let b = grid.tile_id(40.0, -76.25);
        assert_eq!(b, a + 1, "adjacent quarter-degree columns");
        let c = grid.tile_id(40.25, -76.5);
        assert_eq!(c, a + 1440, "one row north");
    }

    #[test]
    fn test_standard_hierarchy() {
        let h = TileHierarchy::standard();
        assert_eq!(h.levels().len(), 3);
        assert_eq!(h.levels()[0].name, "highway");
        assert_eq!(h.levels()[2].name, "local");
        // Cutoffs get strictly more permissive toward the base
        assert!(h.levels()[0].importance < h.levels()[1].importance);
        assert!(h.levels()[1].importance < h.levels()[2].importance);
        assert_eq!(h.level(1).unwrap().name, "arterial");
        assert!(h.level(5).is_none());
    }
}
