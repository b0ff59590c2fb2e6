// src/game/tilemap/chunk.rs
use std::collections::HashMap;

use image::RgbaImage;

use super::autotile::{variant_index, vertex_mask};
use super::tileset::{Tile, TileId, TileSet, EMPTY_TILE};
use crate::engine::camera::blit;
use crate::engine::math::{tile_pos, TilePos};

/// A pre-rendered block of tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    image: RgbaImage,
}

impl Chunk {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Renders chunk images from the current tile grid.
pub(super) struct ChunkBuilder<'a> {
    pub tiles: &'a HashMap<TilePos, TileId>,
    pub tileset: &'a TileSet,
    pub chunk_size: u32,
    pub tile_size: u32,
}

impl ChunkBuilder<'_> {
    fn get_tile(&self, pos: TilePos) -> TileId {
        self.tiles.get(&pos).copied().unwrap_or(EMPTY_TILE)
    }

    fn tile_type(&self, pos: TilePos) -> Option<&Tile> {
        self.tileset.get(self.get_tile(pos))
    }

    /// Floor chunk `key`, covering tiles `key * chunk_size` onwards on the
    /// half-tile dual grid. `None` if no floor tile touches it.
    pub fn floor(&self, key: TilePos) -> Option<Chunk> {
        let n = self.chunk_size as i32;
        let ts = self.tile_size as i64;
        let origin = key * n;
        let side = self.chunk_size * self.tile_size;
        let mut image = RgbaImage::new(side, side);
        let mut empty = true;

        // layered in id order, later types paint over earlier ones
        for tile in self.tileset.iter().filter(|tile| !tile.has_collision) {
            for y in 0..n {
                for x in 0..n {
                    let vertex = origin + tile_pos(x + 1, y + 1);
                    let mask = vertex_mask(vertex, |pos| self.get_tile(pos) == tile.id);
                    if mask == 0 {
                        continue;
                    }
                    empty = false;
                    let variant = tile.variant(variant_index(mask));
                    blit(&mut image, variant, x as i64 * ts, y as i64 * ts);
                }
            }
        }

        (!empty).then_some(Chunk { image })
    }

    /// Wall chunk `key = (chunk_x, row)`: one tile row, as tall as the
    /// tallest tile in the row and its one-column border. Wall tiles are
    /// anchored to the bottom. `None` if the row holds no wall tile.
    pub fn wall(&self, key: TilePos) -> Option<Chunk> {
        let n = self.chunk_size as i32;
        let ts = self.tile_size;
        let first = key.x * n;
        let row = key.y;

        let height = (first - 1..=first + n)
            .filter_map(|x| self.tile_type(tile_pos(x, row)))
            .map(Tile::variant_height)
            .fold(ts, u32::max);
        let mut image = RgbaImage::new(self.chunk_size * ts, height);
        let mut empty = true;

        for x in 0..n {
            let pos = tile_pos(first + x, row);
            let Some(tile) = self.tile_type(pos).filter(|tile| tile.has_collision) else {
                continue;
            };
            let Some(tile_image) = self.wall_tile_image(pos, tile) else {
                continue;
            };
            empty = false;
            let y = height as i64 - tile_image.height() as i64;
            blit(&mut image, &tile_image, x as i64 * ts as i64, y);
        }

        (!empty).then_some(Chunk { image })
    }

    // Assembles one wall tile from the variants at its four corners
    fn wall_tile_image(&self, pos: TilePos, tile: &Tile) -> Option<RgbaImage> {
        let (width, height) = tile.variant_size();
        let half = self.tile_size as i64 / 2;
        let ts = self.tile_size as i64;
        let mut image = RgbaImage::new(width, height);
        let mut altered = false;

        for vy in 0..2 {
            for vx in 0..2 {
                let mask = vertex_mask(pos + tile_pos(vx, vy), |p| self.get_tile(p) == tile.id);
                if mask == 0 {
                    continue;
                }
                altered = true;
                let x = vx as i64 * ts - half;
                let y = vy as i64 * ts - half;
                blit(&mut image, tile.variant(variant_index(mask)), x, y);
            }
        }

        altered.then_some(image)
    }
}
