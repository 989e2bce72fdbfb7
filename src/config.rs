//! Game settings.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime settings for the frame driver and loader.
///
/// Every field has a default, so a config file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Map file, relative to the platform's asset root.
    pub map_path: PathBuf,
    /// Vertex shader of the tile program.
    pub tile_vertex_shader: PathBuf,
    /// Fragment shader of the tile program.
    pub tile_fragment_shader: PathBuf,
    /// Vertex shader of the collision-box program.
    pub box_vertex_shader: PathBuf,
    /// Fragment shader of the collision-box program.
    pub box_fragment_shader: PathBuf,
    /// Width of the visible world at zoom 1.0.
    pub screen_width_meters: f32,
    /// World width of one tile unless the tileset overrides it.
    pub tile_width_meters: f32,
    /// Zoom applied once initialization finishes.
    pub default_zoom: f32,
    /// Lower zoom bound; smaller values magnify.
    pub min_zoom: f32,
    /// Zoom change per frame while a zoom key is held.
    pub zoom_step: f32,
    /// Background clear colour, 0..=255 per channel.
    pub clear_color: [u8; 3],
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            map_path: PathBuf::from("maps/map01.json"),
            tile_vertex_shader: PathBuf::from("shaders/tile.vert"),
            tile_fragment_shader: PathBuf::from("shaders/tile.frag"),
            box_vertex_shader: PathBuf::from("shaders/box.vert"),
            box_fragment_shader: PathBuf::from("shaders/box.frag"),
            screen_width_meters: 20.0,
            tile_width_meters: 1.0,
            default_zoom: 1.0,
            min_zoom: 0.1,
            zoom_step: 0.001,
            clear_color: [29, 33, 45],
        }
    }
}

impl GameConfig {
    /// Parse and validate a config document. Missing keys keep their defaults.
    pub fn from_json_str(txt: &str) -> anyhow::Result<Self> {
        let cfg: GameConfig = serde_json::from_str(txt).context("Parsing game config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        Self::from_json_str(&txt).with_context(|| format!("Loading config {}", path.display()))
    }

    /// Background colour normalised to 0..=1, alpha 1.
    pub fn clear_color_rgba(&self) -> [f32; 4] {
        let [r, g, b] = self.clear_color;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(self.min_zoom > 0.0 && self.min_zoom.is_finite()) {
            anyhow::bail!("min_zoom must be positive, got {}", self.min_zoom);
        }
        if !(self.screen_width_meters > 0.0 && self.screen_width_meters.is_finite()) {
            anyhow::bail!(
                "screen_width_meters must be positive, got {}",
                self.screen_width_meters
            );
        }
        if !(self.tile_width_meters > 0.0 && self.tile_width_meters.is_finite()) {
            anyhow::bail!(
                "tile_width_meters must be positive, got {}",
                self.tile_width_meters
            );
        }
        Ok(())
    }
}
