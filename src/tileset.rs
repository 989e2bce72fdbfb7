//! Tileset atlas geometry and per-tile collision metadata.

use crate::platform::DecodedImage;
use crate::spatial::Aabb;
use macroquad::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;

/// Largest atlas side a GPU texture can be created with.
pub const MAX_ATLAS_SIDE: u32 = u16::MAX as u32;

/// Collision boxes of one tile, in tile-local pixels (origin top-left, Y down).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileMetaInfo {
    /// Never empty: tiles without boxes have no entry.
    pub boxes: Vec<Aabb>,
}

impl TileMetaInfo {
    /// Number of collision boxes.
    #[inline]
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }
}

/// Image atlas with a regular grid plus per-tile collision metadata.
#[derive(Debug, Clone)]
pub struct Tileset {
    /// Tileset name from the editor.
    pub name: String,
    /// Atlas path as handed to the platform.
    pub image_path: PathBuf,
    /// Decoded atlas.
    pub image: DecodedImage,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// World width of one tile.
    pub tile_width_meters: f32,
    /// World height of one tile, from the pixel aspect ratio.
    pub tile_height_meters: f32,
    /// Pixels between neighbouring tiles.
    pub spacing: u32,
    /// Pixels around the tile grid.
    pub margin: u32,
    /// Tiles per atlas row.
    pub columns: u32,
    /// Number of tiles; local indices run from 0 to `tilecount - 1`.
    pub tilecount: u32,
    meta: HashMap<u32, TileMetaInfo>,
}

impl Tileset {
    /// Builds a tileset without collision metadata. `tile_height_meters`
    /// follows the pixel aspect ratio of a tile.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        image_path: impl Into<PathBuf>,
        image: DecodedImage,
        tile_w: u32,
        tile_h: u32,
        tile_width_meters: f32,
        spacing: u32,
        margin: u32,
        columns: u32,
        tilecount: u32,
    ) -> Result<Self, String> {
        if tile_w == 0 || tile_h == 0 {
            return Err(format!("tile size must be non-zero, got {tile_w}x{tile_h}"));
        }
        if columns == 0 {
            return Err("columns must be non-zero".to_owned());
        }
        if image.width == 0 || image.height == 0 {
            return Err(format!(
                "image must be non-empty, got {}x{}",
                image.width, image.height
            ));
        }
        if image.width > MAX_ATLAS_SIDE || image.height > MAX_ATLAS_SIDE {
            return Err(format!(
                "image is {}x{}, textures are limited to {MAX_ATLAS_SIDE} px per side",
                image.width, image.height
            ));
        }
        let p2m = tile_width_meters / tile_w as f32;
        if !(p2m > 0.0 && p2m.is_finite()) {
            return Err(format!(
                "pixels-to-meters factor must be positive and finite, got {p2m}"
            ));
        }

        Ok(Tileset {
            name: name.into(),
            image_path: image_path.into(),
            image,
            tile_w,
            tile_h,
            tile_width_meters,
            tile_height_meters: tile_width_meters * tile_h as f32 / tile_w as f32,
            spacing,
            margin,
            columns,
            tilecount,
            meta: HashMap::new(),
        })
    }

    /// Attach collision boxes to a local tile index. An empty list removes
    /// the entry, so `tile_meta_info` keeps returning `None` for tiles
    /// without geometry.
    pub fn set_tile_boxes(&mut self, local: u32, boxes: Vec<Aabb>) {
        if boxes.is_empty() {
            self.meta.remove(&local);
        } else {
            self.meta.insert(local, TileMetaInfo { boxes });
        }
    }

    /// Collision metadata for a local tile index, `None` when the tile has none.
    #[inline]
    pub fn tile_meta_info(&self, local: u32) -> Option<&TileMetaInfo> {
        self.meta.get(&local)
    }

    /// Whether `local` is a valid tile index.
    #[inline]
    pub fn contains_local(&self, local: u32) -> bool {
        local < self.tilecount
    }

    /// Authoritative conversion factor for every box derived from this tileset.
    #[inline]
    pub fn pixels_to_meters(&self) -> f32 {
        self.tile_width_meters / self.tile_w as f32
    }

    /// One tile's extent in normalised texture space.
    pub fn tile_size_01(&self) -> Vec2 {
        vec2(
            self.tile_w as f32 / self.image.width as f32,
            self.tile_h as f32 / self.image.height as f32,
        )
    }

    /// Texture-space origin of a tile's cell: `(col, row) * tile_size_01`.
    ///
    /// Ignores margin and spacing; exact only for tightly packed atlases.
    pub fn uv_origin(&self, local: u32) -> Vec2 {
        let col = local % self.columns;
        let row = local / self.columns;
        let size = self.tile_size_01();
        vec2(col as f32 * size.x, row as f32 * size.y)
    }

    /// Texture-space origin honouring margin and spacing.
    pub fn uv_origin_with_spacing(&self, local: u32) -> Vec2 {
        let col = local % self.columns;
        let row = local / self.columns;
        let sx = self.margin + col * (self.tile_w + self.spacing);
        let sy = self.margin + row * (self.tile_h + self.spacing);
        vec2(
            sx as f32 / self.image.width as f32,
            sy as f32 / self.image.height as f32,
        )
    }

    pub(crate) fn meta_len(&self) -> usize {
        self.meta.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> DecodedImage {
        DecodedImage {
            width: w,
            height: h,
            pixels: vec![0; (w * h * 4) as usize],
        }
    }

    fn tileset() -> Tileset {
        Tileset::new("t", "t.png", image(64, 32), 16, 16, 1.0, 0, 0, 4, 8).expect("tileset")
    }

    #[test]
    fn missing_meta_is_none() {
        let ts = tileset();
        assert!(ts.tile_meta_info(3).is_none());
    }

    #[test]
    fn meta_lookup_is_idempotent() {
        let mut ts = tileset();
        ts.set_tile_boxes(2, vec![Aabb::new(2.0, 2.0, 4.0, 4.0), Aabb::new(0.0, 8.0, 16.0, 8.0)]);
        let a = ts.tile_meta_info(2).cloned();
        let b = ts.tile_meta_info(2).cloned();
        assert_eq!(a, b);
        assert_eq!(a.map(|m| m.box_count()), Some(2));
    }

    #[test]
    fn empty_box_list_clears_entry() {
        let mut ts = tileset();
        ts.set_tile_boxes(1, vec![Aabb::new(0.0, 0.0, 1.0, 1.0)]);
        ts.set_tile_boxes(1, Vec::new());
        assert!(ts.tile_meta_info(1).is_none());
    }

    #[test]
    fn uv_origin_uses_column_and_row() {
        let ts = tileset();
        assert_eq!(ts.uv_origin(0), vec2(0.0, 0.0));
        assert_eq!(ts.uv_origin(1), vec2(0.25, 0.0));
        assert_eq!(ts.uv_origin(5), vec2(0.25, 0.5));
    }

    #[test]
    fn spacing_aware_origin_adds_margin_and_spacing() {
        let ts = Tileset::new("t", "t.png", image(100, 100), 16, 16, 1.0, 2, 1, 5, 25)
            .expect("tileset");
        // col 1, row 1 -> 1 + 1 * 18 = 19 px
        assert_eq!(ts.uv_origin_with_spacing(6), vec2(0.19, 0.19));
        // the simplified formula ignores both
        assert_eq!(ts.uv_origin(6), vec2(0.16, 0.16));
    }

    #[test]
    fn pixels_to_meters_is_width_ratio() {
        let ts = Tileset::new("t", "t.png", image(64, 64), 16, 32, 2.0, 0, 0, 4, 8)
            .expect("tileset");
        assert_eq!(ts.pixels_to_meters(), 0.125);
        assert_eq!(ts.tile_height_meters, 4.0);
    }

    #[test]
    fn rejects_degenerate_geometry() {
        assert!(Tileset::new("t", "t.png", image(64, 64), 0, 16, 1.0, 0, 0, 4, 8).is_err());
        assert!(Tileset::new("t", "t.png", image(64, 64), 16, 16, 0.0, 0, 0, 4, 8).is_err());
        assert!(Tileset::new("t", "t.png", image(64, 64), 16, 16, f32::NAN, 0, 0, 4, 8).is_err());
        assert!(Tileset::new("t", "t.png", image(64, 64), 16, 16, 1.0, 0, 0, 0, 8).is_err());
        assert!(Tileset::new("t", "t.png", image(0, 64), 16, 16, 1.0, 0, 0, 4, 8).is_err());
        assert!(Tileset::new("t", "t.png", image(70_000, 1), 16, 1, 1.0, 0, 0, 4, 8).is_err());
    }
}
