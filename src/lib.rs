#![warn(missing_docs)]

//! Tiled JSON maps baked into instanced draws for Macroquad.
//!
//! [`Map::load`] reads a chunked map and its tilesets, [`bake`] turns every
//! tile and collision rectangle into a per-instance transform, and
//! [`FrameDriver`] uploads the result once and draws it every frame.

/// Two-pass baking of tiles and collision boxes into instance arrays.
pub mod bake;
/// Runtime settings loaded from JSON.
pub mod config;
/// Error types for loading, rendering and frame setup.
pub mod error;
/// Per-frame driver: one-time setup, zoom input and draws.
pub mod frame;
/// Map file readers.
pub mod loader {
    /// Tiled JSON (`.json`/`.tmj`, `.tsj`) reader.
    pub mod json_loader;
}
/// Loaded map model.
pub mod map;
/// Host file access, diagnostics and image decoding.
pub mod platform;
/// Backend-neutral GPU surface, camera and miniquad backend.
pub mod render;
/// GIDs and axis-aligned boxes.
pub mod spatial;
/// Tileset atlas geometry and per-tile collision metadata.
pub mod tileset;

pub use bake::{bake, BakeCounts, BakedGeometry};
pub use config::GameConfig;
pub use error::{FrameError, MapError, RenderError};
pub use frame::{FrameDriver, FrameInput, FrameParams, Scene};
pub use loader::json_loader::{load_map, LoadOptions, TILE_WIDTH_METERS_PROPERTY};
pub use map::{Chunk, Map, TileLayer, TilesetRef};
pub use platform::{DecodedImage, FsPlatform, ImageDecoder, MacroquadImageDecoder, Platform};
pub use render::{Camera, MiniquadRenderer, Renderer};
pub use spatial::{Aabb, TileFlip, TileId};
pub use tileset::{TileMetaInfo, Tileset};
