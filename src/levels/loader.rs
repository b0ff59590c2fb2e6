// src/levels/loader.rs
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::engine::math::tile_pos;
use crate::error::{Error, Result};
use crate::game::tilemap::{TileId, TileSet, Tilemap};

/// A tile map as stored on disk. Only the sparse tile grid is saved; chunk
/// images are rebuilt on load.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LevelData {
    pub tile_size: u32,
    pub chunk_size: u32,
    pub tiles: Vec<TileEntry>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEntry {
    pub x: i32,
    pub y: i32,
    pub id: TileId,
}

impl LevelData {
    /// Snapshot of a map's tiles, ordered by row then column so saved files
    /// are stable.
    pub fn from_tilemap(tilemap: &Tilemap) -> Self {
        let mut tiles: Vec<TileEntry> = tilemap
            .tiles()
            .iter()
            .map(|(pos, &id)| TileEntry { x: pos.x, y: pos.y, id })
            .collect();
        tiles.sort_by_key(|entry| (entry.y, entry.x));

        Self {
            tile_size: tilemap.tile_size(),
            chunk_size: tilemap.chunk_size(),
            tiles,
        }
    }

    /// Rebuilds the map against `tileset`. Fails on ids the set doesn't have.
    pub fn into_tilemap(self, tileset: impl Into<Arc<TileSet>>) -> Result<Tilemap> {
        if self.tile_size == 0 || self.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "level tile_size and chunk_size must be non-zero".into(),
            ));
        }
        let mut tilemap = Tilemap::new(tileset, self.chunk_size, self.tile_size);
        tilemap.import(self.tiles.into_iter().map(|entry| (tile_pos(entry.x, entry.y), entry.id)))?;
        Ok(tilemap)
    }
}

pub fn load_level(path: impl AsRef<Path>) -> Result<LevelData> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let level_data = serde_json::from_reader(reader)?;
    Ok(level_data)
}

pub fn save_level(path: impl AsRef<Path>, level: &LevelData) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, level)?;
    Ok(())
}

pub fn load_tilemap(path: impl AsRef<Path>, tileset: impl Into<Arc<TileSet>>) -> Result<Tilemap> {
    let path = path.as_ref();
    let tilemap = load_level(path)?.into_tilemap(tileset)?;
    info!("loaded {} tiles from {}", tilemap.tiles().len(), path.display());
    Ok(tilemap)
}

pub fn save_tilemap(path: impl AsRef<Path>, tilemap: &Tilemap) -> Result<()> {
    save_level(path, &LevelData::from_tilemap(tilemap))
}
