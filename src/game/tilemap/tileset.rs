// src/game/tilemap/tileset.rs
use std::fmt;
use std::fs;
use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use log::{debug, error, warn};

/// Index of a tile type in its `TileSet`.
pub type TileId = i32;

/// Marks a cell with no tile.
pub const EMPTY_TILE: TileId = -1;

/// Sub-images per tile sheet, a 4x4 grid read row by row.
pub const VARIANT_COUNT: usize = 16;

const SHEET_GRID: u32 = 4;

// A tile type: its 16 autotile variants plus collision info
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    pub name: String,
    /// Walls block movement and are drawn with their overhang in row chunks.
    pub has_collision: bool,
    variants: Vec<RgbaImage>,
}

impl Tile {
    /// Slices `sheet` into its variants. A variant taller than `tile_size`
    /// makes the tile a wall.
    pub fn from_sheet(
        id: TileId,
        name: impl Into<String>,
        sheet: &RgbaImage,
        tile_size: u32,
    ) -> Self {
        let variants = slice_sheet(sheet);
        let has_collision = sheet.height() / SHEET_GRID > tile_size;
        Self {
            id,
            name: name.into(),
            has_collision,
            variants,
        }
    }

    /// Variant for an autotile index. Indices wrap at 16.
    pub fn variant(&self, index: usize) -> &RgbaImage {
        &self.variants[index % VARIANT_COUNT]
    }

    /// Width and height shared by every variant.
    pub fn variant_size(&self) -> (u32, u32) {
        self.variants[0].dimensions()
    }

    pub fn variant_height(&self) -> u32 {
        self.variant_size().1
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.has_collision { "wall" } else { "floor" };
        write!(f, "{}, a {} tile.", self.name, kind)
    }
}

/// Cuts a sheet into a 4x4 grid of equally sized images, row-major.
pub fn slice_sheet(sheet: &RgbaImage) -> Vec<RgbaImage> {
    let width = sheet.width() / SHEET_GRID;
    let height = sheet.height() / SHEET_GRID;
    let mut variants = Vec::with_capacity(VARIANT_COUNT);
    for y in 0..SHEET_GRID {
        for x in 0..SHEET_GRID {
            let variant = imageops::crop_imm(sheet, x * width, y * height, width, height);
            variants.push(variant.to_image());
        }
    }
    variants
}

/// Every tile type known to a tilemap, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    tiles: Vec<Tile>,
}

impl TileSet {
    /// Floor tile of [`TileSet::generated`].
    pub const GENERATED_FLOOR: TileId = 0;
    /// Wall tile of [`TileSet::generated`], twice as tall as it is wide.
    pub const GENERATED_WALL: TileId = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tile sliced from `sheet` and returns its id.
    pub fn push_sheet(
        &mut self,
        name: impl Into<String>,
        sheet: &RgbaImage,
        tile_size: u32,
    ) -> TileId {
        let id = self.tiles.len() as TileId;
        self.tiles.push(Tile::from_sheet(id, name, sheet, tile_size));
        id
    }

    /// Loads every image in `dir`, in file name order. Ids are assigned
    /// consecutively to the sheets that load; broken files are logged and
    /// skipped. A missing directory gives an empty set.
    pub fn load_dir(dir: impl AsRef<Path>, tile_size: u32) -> Self {
        let dir = dir.as_ref();
        let mut tileset = Self::new();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                error!("cannot read tile directory {}: {}", dir.display(), err);
                return tileset;
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let sheet = match image::open(&path) {
                Ok(image) => image.to_rgba8(),
                Err(err) => {
                    warn!("skipping tile sheet {}: {}", path.display(), err);
                    continue;
                }
            };
            if sheet.width() < SHEET_GRID
                || sheet.height() < SHEET_GRID
                || sheet.width() % SHEET_GRID != 0
                || sheet.height() % SHEET_GRID != 0
            {
                warn!(
                    "skipping tile sheet {}: {}x{} is not a 4x4 grid",
                    path.display(),
                    sheet.width(),
                    sheet.height()
                );
                continue;
            }
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = tileset.push_sheet(name, &sheet, tile_size);
            debug!("loaded tile {}", tileset.tiles[id as usize]);
        }
        tileset
    }

    /// A floor and a wall tile drawn procedurally, for when no assets are
    /// around. Variant `i` has blue channel `i * 16`.
    pub fn generated(tile_size: u32) -> Self {
        let mut tileset = Self::new();
        tileset.push_sheet(
            "generated_floor",
            &generated_sheet(tile_size, tile_size, [86, 140, 72]),
            tile_size,
        );
        tileset.push_sheet(
            "generated_wall",
            &generated_sheet(tile_size, tile_size * 2, [132, 118, 104]),
            tile_size,
        );
        tileset
    }

    /// `None` for `EMPTY_TILE` and for ids outside the set.
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        usize::try_from(id).ok().and_then(|index| self.tiles.get(index))
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

fn generated_sheet(width: u32, height: u32, [r, g, _]: [u8; 3]) -> RgbaImage {
    RgbaImage::from_fn(width * SHEET_GRID, height * SHEET_GRID, |x, y| {
        let index = (y / height) * SHEET_GRID + x / width;
        Rgba([r, g, (index * 16) as u8, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_slices_row_major() {
        let tileset = TileSet::generated(16);
        let floor = tileset.get(TileSet::GENERATED_FLOOR).unwrap();
        assert_eq!(floor.variant_size(), (16, 16));
        assert_eq!(floor.variant(0).get_pixel(0, 0)[2], 0);
        assert_eq!(floor.variant(5).get_pixel(15, 15)[2], 80);
        assert_eq!(floor.variant(15).get_pixel(3, 3)[2], 240);
    }

    #[test]
    fn tall_sheets_are_walls() {
        let tileset = TileSet::generated(16);
        assert!(!tileset.get(TileSet::GENERATED_FLOOR).unwrap().has_collision);

        let wall = tileset.get(TileSet::GENERATED_WALL).unwrap();
        assert!(wall.has_collision);
        assert_eq!(wall.variant_size(), (16, 32));
        assert_eq!(wall.to_string(), "generated_wall, a wall tile.");
    }

    #[test]
    fn unknown_ids_resolve_to_none() {
        let tileset = TileSet::generated(16);
        assert!(tileset.get(EMPTY_TILE).is_none());
        assert!(tileset.get(2).is_none());
        assert_eq!(tileset.len(), 2);
    }

    #[test]
    fn load_dir_sorts_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(64, 128, Rgba([1, 1, 1, 255]))
            .save(dir.path().join("b_wall.png"))
            .unwrap();
        RgbaImage::from_pixel(64, 64, Rgba([2, 2, 2, 255]))
            .save(dir.path().join("a_floor.png"))
            .unwrap();
        fs::write(dir.path().join("c_broken.png"), b"not a png").unwrap();

        let tileset = TileSet::load_dir(dir.path(), 16);
        assert_eq!(tileset.len(), 2);
        assert_eq!(tileset.get(0).unwrap().name, "a_floor");
        assert!(!tileset.get(0).unwrap().has_collision);
        assert_eq!(tileset.get(1).unwrap().name, "b_wall");
        assert!(tileset.get(1).unwrap().has_collision);
    }

    #[test]
    fn missing_directory_gives_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let tileset = TileSet::load_dir(dir.path().join("nope"), 16);
        assert!(tileset.is_empty());
    }
}
