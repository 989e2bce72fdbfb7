// tests/load_tests.rs

use std::path::Path;
use tiled_instancer::{
    bake, load_map, DecodedImage, FsPlatform, GameConfig, ImageDecoder, LoadOptions, Map,
    MapError,
};

/// Pretends every image is the 64x32 demo atlas.
struct AtlasDecoder;

impl ImageDecoder for AtlasDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, String> {
        if !bytes.starts_with(b"\x89PNG") {
            return Err("not a png".into());
        }
        Ok(DecodedImage {
            width: 64,
            height: 32,
            pixels: vec![0; 64 * 32 * 4],
        })
    }
}

fn load_demo_map() -> Result<Map, MapError> {
    let platform = FsPlatform::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"));
    Map::load(&platform, &AtlasDecoder, "maps/map01.json", &LoadOptions::default())
}

#[test]
fn demo_map_loads_with_group_layers() -> anyhow::Result<()> {
    let map = load_demo_map()?;
    assert_eq!((map.tile_w, map.tile_h), (16, 16));
    let names: Vec<_> = map.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["ground", "props"]);
    assert_eq!(map.chunk_count(), 5);

    let ts = map.primary_tileset().expect("demo map has a tileset");
    assert_eq!(ts.first_gid, 1);
    assert_eq!(ts.tileset.columns, 4);
    assert_eq!(ts.tileset.tilecount, 8);
    assert_eq!(ts.tileset.tile_width_meters, 1.0);
    // ellipse objects are not collision boxes
    assert_eq!(ts.tileset.tile_meta_info(5).map(|m| m.box_count()), Some(2));
    assert!(ts.tileset.tile_meta_info(4).is_none());
    Ok(())
}

#[test]
fn demo_map_bakes_every_cell() -> anyhow::Result<()> {
    let map = load_demo_map()?;
    let counts = tiled_instancer::bake::count(&map);
    assert_eq!(counts.tiles, 433);
    assert_eq!(counts.boxes, 434);
    assert_eq!(counts.skipped, 0);
    assert_eq!(map.tile_count(), counts.tiles);

    let baked = bake(&map, screen_center());
    assert_eq!(baked.tile_count(), counts.tiles);
    assert_eq!(baked.tile_uv_offsets.len(), counts.tiles);
    assert_eq!(baked.box_count(), counts.boxes);
    assert_eq!(baked.box_transforms.len(), counts.boxes);
    Ok(())
}

fn screen_center() -> macroquad::prelude::Vec2 {
    macroquad::prelude::vec2(10.0, 5.625)
}

#[test]
fn demo_config_parses() -> anyhow::Result<()> {
    let cfg = GameConfig::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/config.json"))?;
    assert_eq!(cfg.map_path, Path::new("maps/map01.json"));
    assert_eq!(cfg.min_zoom, 0.1);
    assert_eq!(cfg.clear_color, [29, 33, 45]);
    Ok(())
}

#[test]
fn unsupported_format() {
    let platform = FsPlatform::new(".");
    let err = load_map(&platform, &AtlasDecoder, Path::new("foo.tmx"), &LoadOptions::default())
        .unwrap_err();
    match err {
        MapError::UnsupportedFormat(path) => assert_eq!(path, "foo.tmx"),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn missing_map_file_is_io_error() {
    let platform = FsPlatform::new(std::env::temp_dir());
    let err = load_map(
        &platform,
        &AtlasDecoder,
        Path::new("no_such_map_tiled_instancer.json"),
        &LoadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, MapError::Io { .. }));
}
