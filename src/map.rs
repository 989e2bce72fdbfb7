//! Owned map model produced by the loader.

use crate::error::MapError;
use crate::loader::json_loader::{load_map, LoadOptions};
use crate::platform::{ImageDecoder, Platform};
use crate::spatial::TileId;
use crate::tileset::Tileset;
use std::path::{Path, PathBuf};

/// Fixed-size rectangular block of GIDs. `x`/`y` are in tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Left column of the chunk, in tiles.
    pub x: i32,
    /// Top row of the chunk, in tiles.
    pub y: i32,
    /// Cells per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Row-major cells, `width * height` of them.
    pub gids: Vec<TileId>,
}

impl Chunk {
    /// Map-grid coordinates of the cell at `index` (row-major).
    #[inline]
    pub fn cell_position(&self, index: usize) -> (i32, i32) {
        let w = self.width as usize;
        (self.x + (index % w) as i32, self.y + (index / w) as i32)
    }

    /// Non-empty cells with their index in the chunk.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, TileId)> + '_ {
        self.gids
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, gid)| !gid.is_empty())
    }
}

/// A tile layer with its cells split into chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Layer name from the editor.
    pub name: String,
    /// Editor visibility, parents included. Not used by the baker.
    pub visible: bool,
    /// Chunks in file order. Finite layers have exactly one.
    pub chunks: Vec<Chunk>,
}

impl TileLayer {
    /// Number of non-empty cells in the layer.
    pub fn tile_count(&self) -> usize {
        self.chunks.iter().map(|c| c.tiles().count()).sum()
    }
}

/// A tileset together with the first GID it owns in this map.
#[derive(Debug, Clone)]
pub struct TilesetRef {
    /// GID of the tileset's local tile 0.
    pub first_gid: u32,
    /// External tileset file, `None` for tilesets embedded in the map.
    pub source: Option<PathBuf>,
    /// The loaded tileset.
    pub tileset: Tileset,
}

impl TilesetRef {
    /// Whether `gid` (flip flags ignored) falls in this tileset's range.
    #[inline]
    pub fn owns(&self, gid: TileId) -> bool {
        let g = gid.clean();
        g >= self.first_gid && g - self.first_gid < self.tileset.tilecount
    }
}

/// Loaded tile map: tile layers in draw order and tilesets sorted by first GID.
#[derive(Debug, Clone)]
pub struct Map {
    /// Map grid cell width in pixels.
    pub tile_w: u32,
    /// Map grid cell height in pixels.
    pub tile_h: u32,
    /// Tile layers in draw order, groups flattened.
    pub layers: Vec<TileLayer>,
    /// Sorted by `first_gid`.
    pub tilesets: Vec<TilesetRef>,
}

impl Map {
    /// Load a map and all tilesets it references through `platform`.
    pub fn load(
        platform: &dyn Platform,
        decoder: &dyn ImageDecoder,
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<Self, MapError> {
        load_map(platform, decoder, path.as_ref(), options)
    }

    /// The tileset the baker draws from. Only the first one is consulted.
    #[inline]
    pub fn primary_tileset(&self) -> Option<&TilesetRef> {
        self.tilesets.first()
    }

    /// Tileset owning `gid` and the tileset-local index of the tile.
    pub fn tileset_for_gid(&self, gid: TileId) -> Option<(&TilesetRef, u32)> {
        if gid.is_empty() {
            return None;
        }
        let idx = self
            .tilesets
            .partition_point(|t| t.first_gid <= gid.clean());
        let ts = self.tilesets.get(idx.checked_sub(1)?)?;
        if ts.owns(gid) {
            Some((ts, gid.clean() - ts.first_gid))
        } else {
            None
        }
    }

    /// Number of non-empty cells across all layers.
    pub fn tile_count(&self) -> usize {
        self.layers.iter().map(TileLayer::tile_count).sum()
    }

    /// Number of chunks across all layers.
    pub fn chunk_count(&self) -> usize {
        self.layers.iter().map(|l| l.chunks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::DecodedImage;
    use crate::spatial::FLIP_H;

    fn tileset(tilecount: u32) -> Tileset {
        let image = DecodedImage {
            width: 32,
            height: 32,
            pixels: vec![0; 32 * 32 * 4],
        };
        Tileset::new("t", "t.png", image, 16, 16, 1.0, 0, 0, 2, tilecount).expect("tileset")
    }

    fn map() -> Map {
        Map {
            tile_w: 16,
            tile_h: 16,
            layers: vec![TileLayer {
                name: "ground".into(),
                visible: true,
                chunks: vec![Chunk {
                    x: -16,
                    y: 16,
                    width: 2,
                    height: 2,
                    gids: vec![TileId(1), TileId(0), TileId(5), TileId(0)],
                }],
            }],
            tilesets: vec![
                TilesetRef {
                    first_gid: 1,
                    source: None,
                    tileset: tileset(4),
                },
                TilesetRef {
                    first_gid: 5,
                    source: None,
                    tileset: tileset(4),
                },
            ],
        }
    }

    #[test]
    fn cell_position_is_row_major_on_chunk_width() {
        let chunk = Chunk {
            x: 10,
            y: 20,
            width: 4,
            height: 2,
            gids: vec![TileId(0); 8],
        };
        assert_eq!(chunk.cell_position(0), (10, 20));
        assert_eq!(chunk.cell_position(3), (13, 20));
        assert_eq!(chunk.cell_position(5), (11, 21));
    }

    #[test]
    fn tileset_for_gid_picks_owning_tileset() {
        let m = map();
        let (ts, local) = m.tileset_for_gid(TileId(6)).expect("owned");
        assert_eq!(ts.first_gid, 5);
        assert_eq!(local, 1);

        let (ts, local) = m.tileset_for_gid(TileId(2 | FLIP_H)).expect("owned");
        assert_eq!(ts.first_gid, 1);
        assert_eq!(local, 1);

        assert!(m.tileset_for_gid(TileId(0)).is_none());
        assert!(m.tileset_for_gid(TileId(9)).is_none());
    }

    #[test]
    fn counts_non_empty_cells() {
        let m = map();
        assert_eq!(m.tile_count(), 2);
        assert_eq!(m.chunk_count(), 1);
    }
}
