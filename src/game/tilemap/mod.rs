// src/game/tilemap/mod.rs
//! Sparse tile grid with cached, autotiled chunk images.
//!
//! Floor tiles render into square chunks on a dual grid offset by half a
//! tile. Wall tiles render into one-row chunks keyed by `(chunk_x, row)` so
//! they can overhang the rows above them and still depth-sort per row.

pub mod autotile;
pub mod chunk;
pub mod tileset;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, trace};

pub use autotile::TILE_BITMAPS;
pub use chunk::Chunk;
pub use tileset::{Tile, TileId, TileSet, EMPTY_TILE};

use chunk::ChunkBuilder;
use crate::config::SimConfig;
use crate::engine::camera::Camera;
use crate::engine::math::{tile_pos, vec2, TilePos, Vec2};
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Tilemap {
    tileset: Arc<TileSet>,
    tiles: HashMap<TilePos, TileId>,
    floor_chunks: HashMap<TilePos, Chunk>,
    wall_chunks: HashMap<TilePos, Chunk>,
    chunk_size: u32,
    tile_size: u32,
}

impl Tilemap {
    /// An empty map. `chunk_size` is in tiles, `tile_size` in pixels; both
    /// are clamped to at least 1.
    pub fn new(tileset: impl Into<Arc<TileSet>>, chunk_size: u32, tile_size: u32) -> Self {
        Self {
            tileset: tileset.into(),
            tiles: HashMap::new(),
            floor_chunks: HashMap::new(),
            wall_chunks: HashMap::new(),
            chunk_size: chunk_size.max(1),
            tile_size: tile_size.max(1),
        }
    }

    pub fn with_config(tileset: impl Into<Arc<TileSet>>, config: &SimConfig) -> Self {
        Self::new(tileset, config.chunk_size, config.tile_size)
    }

    /// Builds a map from rows of characters. `legend` maps characters to
    /// tile ids; anything else is left empty.
    pub fn from_ascii(
        tileset: impl Into<Arc<TileSet>>,
        chunk_size: u32,
        tile_size: u32,
        data: &str,
        legend: &[(char, TileId)],
    ) -> Result<Self> {
        let mut tiles = HashMap::new();
        for (y, line) in data.trim_matches('\n').lines().enumerate() {
            for (x, c) in line.chars().enumerate() {
                if let Some(&(_, id)) = legend.iter().find(|(key, _)| *key == c) {
                    tiles.insert(tile_pos(x as i32, y as i32), id);
                }
            }
        }

        let mut tilemap = Self::new(tileset, chunk_size, tile_size);
        tilemap.import(tiles)?;
        Ok(tilemap)
    }

    pub fn tileset(&self) -> &Arc<TileSet> {
        &self.tileset
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Top-left corner of a tile in world space.
    pub fn tile_to_world(&self, pos: TilePos) -> Vec2 {
        let ts = self.tile_size as f32;
        vec2(pos.x as f32 * ts, pos.y as f32 * ts)
    }

    /// The tile containing a world position. Floors, so `(-1, -1)` is in
    /// tile `(-1, -1)`.
    pub fn world_to_tile(&self, world: Vec2) -> TilePos {
        let ts = self.tile_size as f32;
        tile_pos((world.x / ts).floor() as i32, (world.y / ts).floor() as i32)
    }

    /// Tile id at `pos`, `EMPTY_TILE` if there is none.
    pub fn get_tile(&self, pos: TilePos) -> TileId {
        self.tiles.get(&pos).copied().unwrap_or(EMPTY_TILE)
    }

    pub fn get_tile_type(&self, pos: TilePos) -> Option<&Tile> {
        self.tileset.get(self.get_tile(pos))
    }

    pub fn is_blocking(&self, pos: TilePos) -> bool {
        self.get_tile_type(pos).is_some_and(|tile| tile.has_collision)
    }

    /// Writes `id` at `pos`, or clears the cell for `EMPTY_TILE`, then
    /// re-renders every chunk whose footprint or border holds the cell.
    pub fn set_tile(&mut self, pos: TilePos, id: TileId) -> Result<()> {
        if id == EMPTY_TILE {
            self.tiles.remove(&pos);
        } else if self.tileset.contains(id) {
            self.tiles.insert(pos, id);
        } else {
            return Err(Error::UnknownTile(id));
        }

        let mut floor_keys = HashSet::new();
        let mut wall_keys = HashSet::new();
        self.collect_chunk_keys(pos, &mut floor_keys, &mut wall_keys);

        trace!(
            "set tile ({}, {}) to {}, refreshing {} floor and {} wall chunks",
            pos.x,
            pos.y,
            id,
            floor_keys.len(),
            wall_keys.len()
        );
        self.refresh_chunks(floor_keys, wall_keys);
        Ok(())
    }

    /// Every non-empty cell.
    pub fn tiles(&self) -> &HashMap<TilePos, TileId> {
        &self.tiles
    }

    /// Replaces the whole grid and rebuilds every chunk. Fails without
    /// touching the map if any id is unknown.
    pub fn import(&mut self, tiles: impl IntoIterator<Item = (TilePos, TileId)>) -> Result<()> {
        let tiles: HashMap<TilePos, TileId> = tiles
            .into_iter()
            .filter(|&(_, id)| id != EMPTY_TILE)
            .collect();
        if let Some(&id) = tiles.values().find(|&&id| !self.tileset.contains(id)) {
            return Err(Error::UnknownTile(id));
        }

        let mut floor_keys = HashSet::new();
        let mut wall_keys = HashSet::new();
        for pos in tiles.keys() {
            self.collect_chunk_keys(*pos, &mut floor_keys, &mut wall_keys);
        }

        self.tiles = tiles;
        self.floor_chunks.clear();
        self.wall_chunks.clear();
        self.refresh_chunks(floor_keys, wall_keys);
        debug!(
            "imported {} tiles into {} floor and {} wall chunks",
            self.tiles.len(),
            self.floor_chunks.len(),
            self.wall_chunks.len()
        );
        Ok(())
    }

    pub fn floor_chunk(&self, key: TilePos) -> Option<&Chunk> {
        self.floor_chunks.get(&key)
    }

    pub fn wall_chunk(&self, key: TilePos) -> Option<&Chunk> {
        self.wall_chunks.get(&key)
    }

    pub fn floor_chunks(&self) -> &HashMap<TilePos, Chunk> {
        &self.floor_chunks
    }

    pub fn wall_chunks(&self) -> &HashMap<TilePos, Chunk> {
        &self.wall_chunks
    }

    // Floor chunks with a vertex on a corner of `pos`, and wall row chunks
    // holding `pos` or one of its eight neighbours
    fn collect_chunk_keys(
        &self,
        pos: TilePos,
        floor_keys: &mut HashSet<TilePos>,
        wall_keys: &mut HashSet<TilePos>,
    ) {
        let n = self.chunk_size as i32;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let x = (pos.x + dx).div_euclid(n);
                wall_keys.insert(tile_pos(x, pos.y + dy));
                if dx <= 0 && dy <= 0 {
                    floor_keys.insert(tile_pos(x, (pos.y + dy).div_euclid(n)));
                }
            }
        }
    }

    // Re-renders the given chunks from scratch. Chunks left empty are dropped.
    fn refresh_chunks(&mut self, floor_keys: HashSet<TilePos>, wall_keys: HashSet<TilePos>) {
        let builder = ChunkBuilder {
            tiles: &self.tiles,
            tileset: &self.tileset,
            chunk_size: self.chunk_size,
            tile_size: self.tile_size,
        };

        for key in floor_keys {
            match builder.floor(key) {
                Some(chunk) => {
                    self.floor_chunks.insert(key, chunk);
                }
                None => {
                    self.floor_chunks.remove(&key);
                }
            }
        }
        for key in wall_keys {
            match builder.wall(key) {
                Some(chunk) => {
                    self.wall_chunks.insert(key, chunk);
                }
                None => {
                    self.wall_chunks.remove(&key);
                }
            }
        }
    }

    /// Queues the chunks overlapping the camera's view. Floors go to the
    /// unsorted layer, walls to the sorted layer keyed by their bottom edge.
    pub fn draw<'a>(&'a self, camera: &mut Camera<'a>) {
        let (view_min, view_max) = camera.view_bounds();
        let visible = |min: Vec2, width: u32, height: u32| {
            min.x < view_max.x
                && min.x + width as f32 > view_min.x
                && min.y < view_max.y
                && min.y + height as f32 > view_min.y
        };
        let n = self.chunk_size as i32;
        let half_tile = self.tile_size as f32 / 2.0;

        for (key, chunk) in &self.floor_chunks {
            let position = self.tile_to_world(*key * n) + vec2(half_tile, half_tile);
            if visible(position, chunk.width(), chunk.height()) {
                camera.add_to_unsorted(Cow::Borrowed(chunk.image()), position.x, position.y);
            }
        }

        for (key, chunk) in &self.wall_chunks {
            let mut position = self.tile_to_world(tile_pos(key.x * n, key.y));
            let height = chunk.height() as f32;
            position.y -= height - self.tile_size as f32;
            if visible(position, chunk.width(), chunk.height()) {
                camera.add_to_sorted(Cow::Borrowed(chunk.image()), position.x, position.y, height);
            }
        }
    }
}
