// src/loader/json_loader.rs
//! Reads Tiled JSON maps and tilesets into the owned [`Map`] model.

use crate::error::MapError;
use crate::map::{Chunk, Map, TileLayer, TilesetRef};
use crate::platform::{ImageDecoder, Platform};
use crate::spatial::{Aabb, TileId};
use crate::tileset::Tileset;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

/// Tileset custom property overriding [`LoadOptions::tile_width_meters`].
pub const TILE_WIDTH_METERS_PROPERTY: &str = "tileWidthInMeters";

/// Knobs the loader takes from the game configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// World width of one tile for tilesets that do not say otherwise.
    pub tile_width_meters: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            tile_width_meters: 1.0,
        }
    }
}

#[derive(Deserialize)]
struct JsonMap {
    tilewidth: u32,
    tileheight: u32,
    layers: Vec<JsonLayer>,
    tilesets: Vec<JsonTilesetRef>,
}

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    data: Option<Vec<u32>>,
    #[serde(default)]
    chunks: Option<Vec<JsonChunk>>,
    /// Children of a "group" layer.
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct JsonChunk {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    data: Vec<u32>,
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    /// Fields of an embedded tileset.
    #[serde(flatten)]
    inline: serde_json::Map<String, JsonValue>,
}

#[derive(Deserialize)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    tilewidth: u32,
    tileheight: u32,
    tilecount: u32,
    columns: u32,
    image: String,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    objectgroup: JsonObjectGroup,
}

#[derive(Deserialize, Default)]
struct JsonObjectGroup {
    #[serde(default)]
    objects: Vec<JsonObject>,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    /// Degrees clockwise around the object's top-left corner.
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    polygon: Option<JsonValue>,
    #[serde(default)]
    polyline: Option<JsonValue>,
    #[serde(default)]
    gid: Option<u32>,
}

impl JsonObject {
    fn as_rect(&self) -> Option<Aabb> {
        let plain = self.rotation == 0.0
            && !self.point
            && !self.ellipse
            && self.polygon.is_none()
            && self.polyline.is_none()
            && self.gid.is_none();
        (plain && self.width > 0.0 && self.height > 0.0)
            .then(|| Aabb::new(self.x, self.y, self.width, self.height))
    }
}

fn check_extension(path: &Path, allowed: &[&str]) -> Result<(), MapError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if allowed.contains(&ext) => Ok(()),
        _ => Err(MapError::UnsupportedFormat(path.display().to_string())),
    }
}

fn read_text(platform: &dyn Platform, path: &Path) -> Result<String, MapError> {
    platform
        .read_text_file(path)
        .map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"))
}

/// Read and decode a map plus every tileset and atlas image it references.
///
/// Paths are handed to `platform` as-is; tileset paths are relative to the
/// map file and image paths relative to their tileset file.
pub fn load_map(
    platform: &dyn Platform,
    decoder: &dyn ImageDecoder,
    path: &Path,
    options: &LoadOptions,
) -> Result<Map, MapError> {
    check_extension(path, &["json", "tmj"])?;

    let txt = read_text(platform, path)?;
    let j: JsonMap = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let map_dir = parent_dir(path);

    let mut tilesets = Vec::with_capacity(j.tilesets.len());
    for ts in j.tilesets {
        let tileset_ref = match ts.source {
            Some(source) => {
                let ts_path = map_dir.join(&source);
                check_extension(&ts_path, &["json", "tsj"])?;
                let ext_txt = read_text(platform, &ts_path)?;
                let ext: JsonTileset =
                    serde_json::from_str(&ext_txt).map_err(|source| MapError::Json {
                        path: ts_path.clone(),
                        source,
                    })?;
                TilesetRef {
                    first_gid: ts.firstgid,
                    tileset: build_tileset(platform, decoder, ext, &ts_path, options)?,
                    source: Some(ts_path),
                }
            }
            None => {
                let embedded: JsonTileset = serde_json::from_value(JsonValue::Object(ts.inline))
                    .map_err(|source| MapError::Json {
                        path: path.to_path_buf(),
                        source,
                    })?;
                TilesetRef {
                    first_gid: ts.firstgid,
                    tileset: build_tileset(platform, decoder, embedded, path, options)?,
                    source: None,
                }
            }
        };
        tilesets.push(tileset_ref);
    }

    // Sort by first_gid so GID lookups can binary search
    tilesets.sort_by_key(|t| t.first_gid);

    let mut layers = Vec::with_capacity(j.layers.len());
    for l in j.layers {
        collect_tile_layers(l, true, &mut layers)?;
    }

    let map = Map {
        tile_w: j.tilewidth,
        tile_h: j.tileheight,
        layers,
        tilesets,
    };
    validate_gids(&map)?;

    info!(
        "Loaded map {}: {} tile layers, {} chunks, {} tilesets",
        path.display(),
        map.layers.len(),
        map.chunk_count(),
        map.tilesets.len()
    );
    Ok(map)
}

/// The tileset's own meter width if it sets the property, else the default.
fn meter_width_property(
    properties: &[JsonProperty],
    ts_path: &Path,
    options: &LoadOptions,
) -> Result<f32, MapError> {
    let Some(prop) = properties.iter().find(|p| p.name == TILE_WIDTH_METERS_PROPERTY) else {
        return Ok(options.tile_width_meters);
    };
    match prop.value.as_f64() {
        Some(v) if v > 0.0 && v.is_finite() => Ok(v as f32),
        _ => Err(MapError::InvalidTileset {
            path: ts_path.to_path_buf(),
            reason: format!(
                "property '{}' must be a positive number, got {}",
                TILE_WIDTH_METERS_PROPERTY, prop.value
            ),
        }),
    }
}

fn build_tileset(
    platform: &dyn Platform,
    decoder: &dyn ImageDecoder,
    ext: JsonTileset,
    ts_path: &Path,
    options: &LoadOptions,
) -> Result<Tileset, MapError> {
    let tile_width_meters = meter_width_property(&ext.properties, ts_path, options)?;

    let img_path = parent_dir(ts_path).join(&ext.image);
    let bytes = platform
        .read_binary_file(&img_path)
        .map_err(|source| MapError::Io {
            path: img_path.clone(),
            source,
        })?;
    let image = decoder.decode(&bytes).map_err(|reason| MapError::Image {
        path: img_path.clone(),
        reason,
    })?;

    let mut tileset = Tileset::new(
        ext.name,
        img_path,
        image,
        ext.tilewidth,
        ext.tileheight,
        tile_width_meters,
        ext.spacing,
        ext.margin,
        ext.columns,
        ext.tilecount,
    )
    .map_err(|reason| MapError::InvalidTileset {
        path: ts_path.to_path_buf(),
        reason,
    })?;

    for tile in ext.tiles {
        if !tileset.contains_local(tile.id) {
            return Err(MapError::InvalidTileset {
                path: ts_path.to_path_buf(),
                reason: format!(
                    "tile {} is outside the tile count {}",
                    tile.id, tileset.tilecount
                ),
            });
        }
        let total = tile.objectgroup.objects.len();
        let boxes: Vec<Aabb> = tile
            .objectgroup
            .objects
            .iter()
            .filter_map(JsonObject::as_rect)
            .collect();
        if boxes.len() < total {
            debug!(
                "Tile {} in {}: skipped {} rotated or non-rectangle collision shapes",
                tile.id,
                ts_path.display(),
                total - boxes.len()
            );
        }
        tileset.set_tile_boxes(tile.id, boxes);
    }

    debug!(
        "Tileset '{}': {} tiles, {} with collision boxes",
        tileset.name,
        tileset.tilecount,
        tileset.meta_len()
    );
    Ok(tileset)
}

fn collect_tile_layers(
    l: JsonLayer,
    parent_visible: bool,
    out: &mut Vec<TileLayer>,
) -> Result<(), MapError> {
    let visible = parent_visible && l.visible;
    match l.kind.as_deref().unwrap_or("tilelayer") {
        "tilelayer" => {
            let chunks = match (l.chunks, l.data) {
                (Some(chunks), _) => chunks
                    .into_iter()
                    .map(|c| make_chunk(&l.name, c.x, c.y, c.width, c.height, c.data))
                    .collect::<Result<Vec<_>, _>>()?,
                (None, Some(data)) => {
                    vec![make_chunk(&l.name, 0, 0, l.width, l.height, data)?]
                }
                (None, None) => {
                    return Err(MapError::InvalidMap(format!(
                        "Tile layer '{}' has neither chunks nor data",
                        l.name
                    )))
                }
            };
            out.push(TileLayer {
                name: l.name,
                visible,
                chunks,
            });
        }
        "group" => {
            for child in l.layers {
                collect_tile_layers(child, visible, out)?;
            }
        }
        other => debug!("Skipping {} layer '{}'", other, l.name),
    }
    Ok(())
}

fn make_chunk(
    layer: &str,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    data: Vec<u32>,
) -> Result<Chunk, MapError> {
    if width == 0 || height == 0 {
        return Err(MapError::InvalidMap(format!(
            "Layer '{layer}' has an empty chunk at ({x}, {y})"
        )));
    }
    if data.len() != (width as usize) * (height as usize) {
        return Err(MapError::InvalidMap(format!(
            "Layer '{layer}' chunk at ({x}, {y}) holds {} GIDs, expected {}x{}",
            data.len(),
            width,
            height
        )));
    }
    Ok(Chunk {
        x,
        y,
        width,
        height,
        gids: data.into_iter().map(TileId).collect(),
    })
}

fn validate_gids(map: &Map) -> Result<(), MapError> {
    for layer in &map.layers {
        for chunk in &layer.chunks {
            for (_, gid) in chunk.tiles() {
                if map.tileset_for_gid(gid).is_none() {
                    return Err(MapError::InvalidTileGid {
                        layer: layer.name.clone(),
                        gid: gid.clean(),
                    });
                }
            }
        }
    }
    Ok(())
}
