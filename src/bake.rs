//! Flattens a loaded [`Map`] into per-instance arrays for the GPU.
//!
//! Baking runs in two passes over the same layer/chunk/cell order: the
//! first counts tiles and collision boxes, the second fills arrays that
//! were allocated with exactly those counts.

use crate::map::{Chunk, Map, TilesetRef};
use crate::spatial::{Aabb, TileId};
use log::{debug, warn};
use macroquad::prelude::*;

/// Sizes found by the counting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BakeCounts {
    /// Tile instances from the primary tileset.
    pub tiles: usize,
    /// Collision boxes attached to those tiles.
    pub boxes: usize,
    /// Non-empty cells owned by a tileset other than the primary one.
    pub skipped: usize,
}

/// Instance data for the tile and collision-box draws.
///
/// `tile_transforms[i]` and `tile_uv_offsets[i]` describe the same tile;
/// `boxes[i]` and `box_transforms[i]` the same box. All positions are in
/// world meters, Y up.
#[derive(Debug, Clone, Default)]
pub struct BakedGeometry {
    /// Model matrix per tile, mapping the unit quad onto the tile.
    pub tile_transforms: Vec<Mat4>,
    /// Atlas origin per tile, in normalised texture space.
    pub tile_uv_offsets: Vec<Vec2>,
    /// Collision boxes in world meters.
    pub boxes: Vec<Aabb>,
    /// Model matrix per collision box.
    pub box_transforms: Vec<Mat4>,
}

impl BakedGeometry {
    /// Number of tile instances.
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tile_transforms.len()
    }

    /// Number of collision boxes.
    #[inline]
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Baked collision boxes overlapping `query`.
    pub fn boxes_overlapping<'a>(&'a self, query: &'a Aabb) -> impl Iterator<Item = &'a Aabb> + 'a {
        self.boxes.iter().filter(move |b| b.intersects(query))
    }
}

/// World position (meters) of the bottom-left corner of a map cell.
///
/// Map rows grow downward while world Y grows upward, hence the sign flip.
#[inline]
pub fn tile_world_position(center: Vec2, tile_map_x: i32, tile_map_y: i32, ts: &TilesetRef) -> Vec2 {
    vec2(
        center.x + tile_map_x as f32 * ts.tileset.tile_width_meters,
        center.y - tile_map_y as f32 * ts.tileset.tile_height_meters,
    )
}

/// Convert a tile-local pixel box (top-left origin, Y down) into world
/// meters relative to the tile's world position.
#[inline]
pub fn box_to_world(tile_world: Vec2, local: &Aabb, ts: &TilesetRef) -> Aabb {
    let p2m = ts.tileset.pixels_to_meters();
    let tile_h_px = ts.tileset.tile_h as f32;
    Aabb {
        position: vec2(
            tile_world.x + local.position.x * p2m,
            tile_world.y + (tile_h_px - local.position.y - local.size.y) * p2m,
        ),
        size: local.size * p2m,
    }
}

fn visit_cells<'m>(map: &'m Map, mut f: impl FnMut(&'m Chunk, usize, TileId)) {
    for layer in &map.layers {
        for chunk in &layer.chunks {
            for (index, gid) in chunk.tiles() {
                f(chunk, index, gid);
            }
        }
    }
}

/// First pass: how many tile instances and collision boxes `bake` will emit.
pub fn count(map: &Map) -> BakeCounts {
    let mut counts = BakeCounts::default();
    let Some(ts) = map.primary_tileset() else {
        visit_cells(map, |_, _, _| counts.skipped += 1);
        return counts;
    };

    visit_cells(map, |_, _, gid| {
        if !ts.owns(gid) {
            counts.skipped += 1;
            return;
        }
        counts.tiles += 1;
        if let Some(meta) = ts.tileset.tile_meta_info(gid.clean() - ts.first_gid) {
            counts.boxes += meta.box_count();
        }
    });
    counts
}

/// Bake every tile of the primary tileset, hidden layers included.
/// `center` is the world position (meters) of map cell (0, 0).
pub fn bake(map: &Map, center: Vec2) -> BakedGeometry {
    let counts = count(map);
    if counts.skipped > 0 {
        warn!(
            "Skipping {} tiles that do not belong to the primary tileset",
            counts.skipped
        );
    }

    let mut out = BakedGeometry {
        tile_transforms: Vec::with_capacity(counts.tiles),
        tile_uv_offsets: Vec::with_capacity(counts.tiles),
        boxes: Vec::with_capacity(counts.boxes),
        box_transforms: Vec::with_capacity(counts.boxes),
    };

    let Some(ts) = map.primary_tileset() else {
        return out;
    };
    let tile_scale = vec3(ts.tileset.tile_width_meters, ts.tileset.tile_height_meters, 1.0);

    visit_cells(map, |chunk, index, gid| {
        if !ts.owns(gid) {
            return;
        }
        assert!(
            out.tile_transforms.len() < counts.tiles,
            "tile instances exceed the counted {}",
            counts.tiles
        );

        let (tile_map_x, tile_map_y) = chunk.cell_position(index);
        let world = tile_world_position(center, tile_map_x, tile_map_y, ts);

        out.tile_transforms.push(
            Mat4::from_translation(vec3(world.x, world.y, 0.0)) * Mat4::from_scale(tile_scale),
        );

        let local = gid.clean() - ts.first_gid;
        out.tile_uv_offsets.push(ts.tileset.uv_origin(local));

        if let Some(meta) = ts.tileset.tile_meta_info(local) {
            for local_box in &meta.boxes {
                assert!(
                    out.boxes.len() < counts.boxes,
                    "collision boxes exceed the counted {}",
                    counts.boxes
                );
                let world_box = box_to_world(world, local_box, ts);
                out.box_transforms.push(world_box.transform());
                out.boxes.push(world_box);
            }
        }
    });

    assert_eq!(out.tile_transforms.len(), counts.tiles);
    assert_eq!(out.boxes.len(), counts.boxes);
    debug!(
        "Baked {} tile instances and {} collision boxes",
        out.tile_count(),
        out.box_count()
    );
    out
}
