//! Cached tile reading.
//!
//! The reader owns a per-(level, tile) cache of decoded tiles with a
//! byte budget. Long passes check `over_committed` at tile boundaries
//! and `clear` the cache rather than evicting piecemeal; decoded tiles
//! are handed out as `Arc` so clearing never invalidates a tile a
//! caller is still holding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::error;

use crate::graph::GraphId;

use super::hierarchy::TileHierarchy;
use super::tile::Tile;
use super::tile_path;

/// Default cache budget in bytes.
const DEFAULT_CACHE_BUDGET: usize = 256 * 1024 * 1024;

pub struct TileReader {
    tile_dir: PathBuf,
    hierarchy: TileHierarchy,
    cache: HashMap<(u8, u32), Option<Arc<Tile>>>,
    cache_bytes: usize,
    budget_bytes: usize,
}

impl TileReader {
    pub fn new(tile_dir: &Path) -> TileReader {
        TileReader::with_budget(tile_dir, DEFAULT_CACHE_BUDGET)
    }

    pub fn with_budget(tile_dir: &Path, budget_bytes: usize) -> TileReader {
        TileReader {
            tile_dir: tile_dir.to_path_buf(),
            hierarchy: TileHierarchy::standard(),
            cache: HashMap::new(),
            cache_bytes: 0,
            budget_bytes,
        }
    }

    pub fn tile_dir(&self) -> &Path {
        &self.tile_dir
    }

    pub fn tile_hierarchy(&self) -> &TileHierarchy {
        &self.hierarchy
    }

    /// Fetch the tile containing `id`, reading and caching it if
    /// needed. Returns `None` when no tile file exists (a normal,
    /// common case) or when the file fails to decode (logged).
    pub fn get_tile(&mut self, id: GraphId) -> Option<Arc<Tile>> {
        let key = (id.level(), id.tile());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let path = tile_path(&self.tile_dir, id);
        let entry = if path.exists() {
            match Tile::read(&self.tile_dir, id) {
                Ok(tile) => {
                    self.cache_bytes += tile.byte_size();
                    Some(Arc::new(tile))
                }
                Err(e) => {
                    error!("failed to read tile {}: {:#}", id.tile_base(), e);
                    None
                }
            }
        } else {
            None
        };
        self.cache.insert(key, entry.clone());
        entry
    }

    /// True when the cache has outgrown its byte budget.
    pub fn over_committed(&self) -> bool {
        self.cache_bytes > self.budget_bytes
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.cache_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeInfo;
    use crate::tile::builder::TileBuilder;
    use tempfile::TempDir;

    fn store_empty_tile(dir: &Path, id: GraphId) {
        let mut b = TileBuilder::new_tile(dir, id);
        b.add_admin("None", "None", "", "");
        b.nodes_mut().push(NodeInfo::default());
        b.store_tile_data().unwrap();
    }

    #[test]
    fn test_get_tile_missing() {
        let tmp = TempDir::new().unwrap();
        let mut reader = TileReader::new(tmp.path());
        assert!(reader.get_tile(GraphId::new(12, 2, 0)).is_none());
    }

    #[test]
    fn test_get_tile_cached() {
        let tmp = TempDir::new().unwrap();
        let id = GraphId::new(12, 2, 0);
        store_empty_tile(tmp.path(), id);

        let mut reader = TileReader::new(tmp.path());
        let t1 = reader.get_tile(id).unwrap();
        let t2 = reader.get_tile(id).unwrap();
        assert!(Arc::ptr_eq(&t1, &t2), "second fetch comes from cache");
    }

    #[test]
    fn test_over_committed_and_clear() {
        let tmp = TempDir::new().unwrap();
        let id = GraphId::new(12, 2, 0);
        store_empty_tile(tmp.path(), id);

        // A 1-byte budget trips immediately once anything is cached.
        let mut reader = TileReader::with_budget(tmp.path(), 1);
        assert!(!reader.over_committed());
        reader.get_tile(id);
        assert!(reader.over_committed());
        reader.clear();
        assert!(!reader.over_committed());
        // Still readable after the clear
        assert!(reader.get_tile(id).is_some());
    }
}
