// src/game/tilemap/autotile.rs
//! Marching-squares autotiling.
//!
//! A vertex is the corner shared by four tiles. Vertex `(x, y)` sits at the
//! top-left corner of tile `(x, y)`, so its neighbours are tiles
//! `(x-1, y-1)`, `(x, y-1)`, `(x-1, y)` and `(x, y)`.

use crate::engine::math::{tile_pos, TilePos};

pub const NORTH_WEST: u8 = 0x1;
pub const NORTH_EAST: u8 = 0x2;
pub const SOUTH_WEST: u8 = 0x4;
pub const SOUTH_EAST: u8 = 0x8;

/// Sheet variant for each 4-bit neighbour mask.
pub const TILE_BITMAPS: [usize; 16] = [
    12, // 0x0
    15, // 0x1
    8,  // 0x2
    9,  // 0x3
    0,  // 0x4
    11, // 0x5
    14, // 0x6
    7,  // 0x7
    13, // 0x8
    4,  // 0x9
    1,  // 0xA
    10, // 0xB
    3,  // 0xC
    2,  // 0xD
    5,  // 0xE
    6,  // 0xF
];

/// Mask of the four tiles around `vertex` for which `matches` holds.
pub fn vertex_mask(vertex: TilePos, matches: impl Fn(TilePos) -> bool) -> u8 {
    let corners = [
        (tile_pos(-1, -1), NORTH_WEST),
        (tile_pos(0, -1), NORTH_EAST),
        (tile_pos(-1, 0), SOUTH_WEST),
        (tile_pos(0, 0), SOUTH_EAST),
    ];
    corners
        .into_iter()
        .filter(|(offset, _)| matches(vertex + offset))
        .fold(0, |mask, (_, bit)| mask | bit)
}

pub fn variant_index(mask: u8) -> usize {
    TILE_BITMAPS[(mask & 0xF) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mask_selects_variant_six() {
        assert_eq!(variant_index(0xF), 6);
        assert_eq!(variant_index(0x0), 12);
        assert_eq!(variant_index(NORTH_WEST | SOUTH_EAST), 4);
    }

    #[test]
    fn table_is_a_permutation() {
        let mut seen = [false; 16];
        for index in TILE_BITMAPS {
            assert!(!seen[index]);
            seen[index] = true;
        }
    }

    #[test]
    fn mask_bits_follow_corner_order() {
        let vertex = tile_pos(3, 3);
        assert_eq!(vertex_mask(vertex, |p| p == tile_pos(2, 2)), NORTH_WEST);
        assert_eq!(vertex_mask(vertex, |p| p == tile_pos(3, 2)), NORTH_EAST);
        assert_eq!(vertex_mask(vertex, |p| p == tile_pos(2, 3)), SOUTH_WEST);
        assert_eq!(vertex_mask(vertex, |p| p == tile_pos(3, 3)), SOUTH_EAST);
        assert_eq!(vertex_mask(vertex, |_| true), 0xF);
    }
}
