//! Per-frame entry point: one-time GPU setup, then input, camera and two
//! instanced draws every frame.

use crate::bake::{bake, BakedGeometry};
use crate::config::GameConfig;
use crate::error::{FrameError, MapError};
use crate::loader::json_loader::LoadOptions;
use crate::map::Map;
use crate::platform::{ImageDecoder, Platform};
use crate::render::layout::{InstanceData, QUAD_INDICES};
use crate::render::{
    Camera, DrawCall, InstancedMeshDesc, MeshId, ProgramDesc, ProgramId, Renderer,
    TextureHandle, UniformKind, UniformSpec, UniformValue,
};
use log::info;
use macroquad::prelude::Vec2;
use std::path::Path;

/// View-projection matrix uniform, shared by both programs.
pub const U_VP: &str = "u_VP";
/// Size of one tile in normalised texture space.
pub const U_TILE_SIZE: &str = "u_TileSize";
/// Atlas sampler of the tile program.
pub const U_TILESET: &str = "u_Tileset";

const TILE_UNIFORMS: [UniformSpec; 2] = [
    UniformSpec { name: U_VP, kind: UniformKind::Mat4 },
    UniformSpec { name: U_TILE_SIZE, kind: UniformKind::Float2 },
];
const BOX_UNIFORMS: [UniformSpec; 1] = [UniformSpec { name: U_VP, kind: UniformKind::Mat4 }];

/// Held-key state for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Zoom in.
    pub left: bool,
    /// Zoom out.
    pub right: bool,
}

/// What the host hands over every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameParams {
    /// Framebuffer width in pixels.
    pub screen_width: u32,
    /// Framebuffer height in pixels.
    pub screen_height: u32,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    /// Keys held this frame.
    pub input: FrameInput,
}

/// Everything created during initialization. Lives until the driver drops.
pub struct Scene {
    /// The loaded map.
    pub map: Map,
    /// CPU copy of the uploaded instance data.
    pub geometry: BakedGeometry,
    /// Zoom state; metrics fixed at setup.
    pub camera: Camera,
    /// Value of the tile-size uniform.
    pub tile_size_01: Vec2,
    /// Tile shader program.
    pub tile_program: ProgramId,
    /// Collision-box shader program.
    pub box_program: ProgramId,
    /// Quad plus per-tile model and UV streams.
    pub tile_mesh: MeshId,
    /// Quad plus per-box model stream.
    pub box_mesh: MeshId,
    /// Atlas of the primary tileset.
    pub tileset_texture: TextureHandle,
}

enum DriverState {
    Uninitialized,
    Initialized(Box<Scene>),
}

/// Owns the game state and turns host frames into draw calls.
///
/// Nothing is loaded until the first frame, which needs the screen size.
pub struct FrameDriver {
    config: GameConfig,
    platform: Box<dyn Platform>,
    decoder: Box<dyn ImageDecoder>,
    state: DriverState,
}

impl FrameDriver {
    /// Create an uninitialized driver. No file is touched yet.
    pub fn new(
        config: GameConfig,
        platform: Box<dyn Platform>,
        decoder: Box<dyn ImageDecoder>,
    ) -> Self {
        FrameDriver {
            config,
            platform,
            decoder,
            state: DriverState::Uninitialized,
        }
    }

    /// Settings the driver was created with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Whether the one-time setup has completed.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, DriverState::Initialized(_))
    }

    /// State built during setup, `None` before the first frame.
    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            DriverState::Initialized(scene) => Some(scene),
            DriverState::Uninitialized => None,
        }
    }

    /// Run one frame. The first call initializes; an initialization failure
    /// is printed through the platform and then aborts.
    pub fn update_and_render(&mut self, renderer: &mut dyn Renderer, params: &FrameParams) {
        if !self.is_initialized() {
            if let Err(err) = self.try_initialize(renderer, params.screen_width, params.screen_height) {
                self.platform.print_output(&format!("{err}\n"));
                panic!("frame driver initialization failed: {err}");
            }
        }

        let DriverState::Initialized(scene) = &mut self.state else {
            unreachable!("initialized above");
        };

        scene
            .camera
            .apply_zoom_input(params.input.left, params.input.right, self.config.zoom_step);

        renderer.begin_frame();
        let vp = scene.camera.view_projection();

        renderer.draw_instanced(&DrawCall {
            program: scene.tile_program,
            mesh: scene.tile_mesh,
            texture: Some(scene.tileset_texture),
            uniforms: &[UniformValue::Mat4(vp), UniformValue::Float2(scene.tile_size_01)],
            instances: scene.geometry.tile_count() as u32,
        });
        renderer.draw_instanced(&DrawCall {
            program: scene.box_program,
            mesh: scene.box_mesh,
            texture: None,
            uniforms: &[UniformValue::Mat4(vp)],
            instances: scene.geometry.box_count() as u32,
        });
        renderer.end_frame();
    }

    /// Build both programs, load the map, upload the atlas and instance buffers.
    /// Does nothing when already initialized.
    pub fn try_initialize(
        &mut self,
        renderer: &mut dyn Renderer,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<(), FrameError> {
        if self.is_initialized() {
            return Ok(());
        }
        let cfg = &self.config;

        let mut camera = Camera::new(screen_width, screen_height, cfg.screen_width_meters, cfg.min_zoom);

        let tile_program = self.build_program(
            renderer,
            "tiles",
            &cfg.tile_vertex_shader,
            &cfg.tile_fragment_shader,
            &TILE_UNIFORMS,
            &[U_TILESET],
        )?;
        let box_program = self.build_program(
            renderer,
            "tile boxes",
            &cfg.box_vertex_shader,
            &cfg.box_fragment_shader,
            &BOX_UNIFORMS,
            &[],
        )?;

        let options = LoadOptions {
            tile_width_meters: cfg.tile_width_meters,
        };
        let map = Map::load(self.platform.as_ref(), self.decoder.as_ref(), &cfg.map_path, &options)?;
        let primary = map
            .primary_tileset()
            .ok_or_else(|| MapError::InvalidMap("Map has no tilesets".into()))?;
        let tileset_texture = renderer.create_texture_rgba8(&primary.tileset.image);
        let tile_size_01 = primary.tileset.tile_size_01();

        let geometry = bake(&map, camera.screen_center());
        let instances = InstanceData::from_baked(&geometry);

        let tile_mesh = renderer.create_instanced_mesh(&InstancedMeshDesc {
            label: "tiles",
            program: tile_program,
            indices: &QUAD_INDICES,
            streams: &instances.tile_streams(),
        });
        let box_mesh = renderer.create_instanced_mesh(&InstancedMeshDesc {
            label: "tile boxes",
            program: box_program,
            indices: &QUAD_INDICES,
            streams: &instances.box_streams(),
        });

        renderer.set_clear_color(cfg.clear_color_rgba());
        camera.set_zoom(cfg.default_zoom);

        info!(
            "Initialized {} renderer: {} tiles, {} collision boxes",
            renderer.backend(),
            geometry.tile_count(),
            geometry.box_count()
        );

        self.state = DriverState::Initialized(Box::new(Scene {
            map,
            geometry,
            camera,
            tile_size_01,
            tile_program,
            box_program,
            tile_mesh,
            box_mesh,
            tileset_texture,
        }));
        Ok(())
    }

    fn read_shader(&self, path: &Path) -> Result<String, FrameError> {
        self.platform
            .read_text_file(path)
            .map_err(|source| FrameError::ShaderSource {
                path: path.to_path_buf(),
                source,
            })
    }

    fn build_program(
        &self,
        renderer: &mut dyn Renderer,
        name: &str,
        vertex_path: &Path,
        fragment_path: &Path,
        uniforms: &[UniformSpec],
        textures: &[&'static str],
    ) -> Result<ProgramId, FrameError> {
        let vertex_source = self.read_shader(vertex_path)?;
        let fragment_source = self.read_shader(fragment_path)?;
        let program = renderer.create_program(&ProgramDesc {
            name,
            vertex_source: &vertex_source,
            fragment_source: &fragment_source,
            uniforms,
            textures,
        })?;
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::platform::DecodedImage;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;
    use std::rc::Rc;

    struct MemPlatform {
        files: HashMap<PathBuf, Vec<u8>>,
        output: Rc<RefCell<String>>,
    }

    impl Platform for MemPlatform {
        fn read_text_file(&self, path: &Path) -> io::Result<String> {
            let bytes = self.read_binary_file(path)?;
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }

        fn read_binary_file(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
        }

        fn print_output(&self, text: &str) {
            self.output.borrow_mut().push_str(text);
        }
    }

    struct SolidDecoder;

    impl ImageDecoder for SolidDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<DecodedImage, String> {
            Ok(DecodedImage {
                width: 32,
                height: 32,
                pixels: vec![255; 32 * 32 * 4],
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Program(String),
        Texture(u32, u32),
        Mesh(String, usize),
        ClearColor([f32; 4]),
        Begin,
        Draw(ProgramId, Option<TextureHandle>, usize, u32),
        End,
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<Call>,
        reject_program: Option<&'static str>,
        programs: u32,
        meshes: u32,
    }

    impl Renderer for RecordingRenderer {
        fn backend(&self) -> &'static str {
            "recording"
        }

        fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, RenderError> {
            if self.reject_program == Some(desc.name) {
                return Err(RenderError::Shader {
                    program: desc.name.to_owned(),
                    log: "0:1: syntax error".into(),
                });
            }
            self.calls.push(Call::Program(desc.name.to_owned()));
            self.programs += 1;
            Ok(ProgramId(self.programs - 1))
        }

        fn create_texture_rgba8(&mut self, image: &DecodedImage) -> TextureHandle {
            self.calls.push(Call::Texture(image.width, image.height));
            TextureHandle(7)
        }

        fn create_instanced_mesh(&mut self, desc: &InstancedMeshDesc<'_>) -> MeshId {
            self.calls.push(Call::Mesh(desc.label.to_owned(), desc.streams.len()));
            self.meshes += 1;
            MeshId(self.meshes - 1)
        }

        fn set_clear_color(&mut self, rgba: [f32; 4]) {
            self.calls.push(Call::ClearColor(rgba));
        }

        fn begin_frame(&mut self) {
            self.calls.push(Call::Begin);
        }

        fn draw_instanced(&mut self, call: &DrawCall<'_>) {
            self.calls.push(Call::Draw(
                call.program,
                call.texture,
                call.uniforms.len(),
                call.instances,
            ));
        }

        fn end_frame(&mut self) {
            self.calls.push(Call::End);
        }
    }

    const MAP: &str = r#"{
      "tilewidth":16, "tileheight":16, "infinite":true,
      "layers":[{"type":"tilelayer","name":"ground",
        "chunks":[{"x":0,"y":0,"width":2,"height":2,"data":[1,0,2,0]}]}],
      "tilesets":[{"firstgid":1,"source":"tileset.json"}]
    }"#;

    const TILESET: &str = r#"{
      "name":"terrain","tilewidth":16,"tileheight":16,"tilecount":4,"columns":2,
      "image":"tiles.png",
      "tiles":[{"id":1,"objectgroup":{"objects":[{"id":1,"x":2,"y":2,"width":4,"height":4}]}}]
    }"#;

    fn driver(with_shaders: bool) -> (FrameDriver, Rc<RefCell<String>>) {
        let config = GameConfig {
            map_path: "maps/map.json".into(),
            ..GameConfig::default()
        };
        let mut files: HashMap<PathBuf, Vec<u8>> = HashMap::new();
        files.insert("maps/map.json".into(), MAP.into());
        files.insert("maps/tileset.json".into(), TILESET.into());
        files.insert("maps/tiles.png".into(), b"png".to_vec());
        if with_shaders {
            for path in [
                &config.tile_vertex_shader,
                &config.tile_fragment_shader,
                &config.box_vertex_shader,
                &config.box_fragment_shader,
            ] {
                files.insert(path.clone(), b"void main() {}".to_vec());
            }
        }
        let output = Rc::new(RefCell::new(String::new()));
        let platform = MemPlatform {
            files,
            output: Rc::clone(&output),
        };
        (
            FrameDriver::new(config, Box::new(platform), Box::new(SolidDecoder)),
            output,
        )
    }

    fn params(left: bool, right: bool) -> FrameParams {
        FrameParams {
            screen_width: 800,
            screen_height: 600,
            delta_time: 1.0 / 60.0,
            input: FrameInput { left, right },
        }
    }

    #[test]
    fn first_frame_initializes_once_and_draws_twice() {
        let (mut driver, _) = driver(true);
        let mut renderer = RecordingRenderer::default();

        driver.update_and_render(&mut renderer, &params(false, false));
        assert!(driver.is_initialized());
        let setup = renderer
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Program(_) | Call::Texture(..) | Call::Mesh(..)))
            .count();
        assert_eq!(setup, 5);
        assert!(renderer.calls.contains(&Call::Mesh("tiles".into(), 3)));
        assert!(renderer.calls.contains(&Call::Mesh("tile boxes".into(), 2)));
        assert!(renderer
            .calls
            .contains(&Call::ClearColor([29.0 / 255.0, 33.0 / 255.0, 45.0 / 255.0, 1.0])));

        let frame: Vec<_> = renderer.calls.iter().skip_while(|c| **c != Call::Begin).cloned().collect();
        assert_eq!(
            frame,
            vec![
                Call::Begin,
                Call::Draw(ProgramId(0), Some(TextureHandle(7)), 2, 2),
                Call::Draw(ProgramId(1), None, 1, 1),
                Call::End,
            ]
        );

        renderer.calls.clear();
        driver.update_and_render(&mut renderer, &params(false, false));
        assert_eq!(renderer.calls.len(), 4);
    }

    #[test]
    fn held_keys_step_the_zoom() {
        let (mut driver, _) = driver(true);
        let mut renderer = RecordingRenderer::default();

        driver.update_and_render(&mut renderer, &params(true, false));
        let zoom = driver.scene().map(|s| s.camera.zoom);
        assert!((zoom.unwrap_or_default() - 0.999).abs() < 1e-6);

        driver.update_and_render(&mut renderer, &params(false, true));
        driver.update_and_render(&mut renderer, &params(false, true));
        let zoom = driver.scene().map(|s| s.camera.zoom);
        assert!((zoom.unwrap_or_default() - 1.001).abs() < 1e-6);
    }

    #[test]
    fn scene_is_centred_on_the_screen() {
        let (mut driver, _) = driver(true);
        let mut renderer = RecordingRenderer::default();
        driver
            .try_initialize(&mut renderer, 800, 600)
            .expect("initialization");

        let scene = driver.scene().expect("scene");
        assert_eq!(scene.camera.screen_center(), vec2_of(10.0, 7.5));
        assert_eq!(scene.geometry.tile_count(), 2);
        assert_eq!(scene.tile_size_01, vec2_of(0.5, 0.5));
        // map cell (0, 0) lands on the screen centre
        assert_eq!(scene.geometry.tile_transforms[0].w_axis.truncate().truncate(), vec2_of(10.0, 7.5));
    }

    fn vec2_of(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn missing_shader_is_a_typed_error() {
        let (mut driver, _) = driver(false);
        let mut renderer = RecordingRenderer::default();
        let err = driver
            .try_initialize(&mut renderer, 800, 600)
            .expect_err("shader files are missing");
        assert!(matches!(err, FrameError::ShaderSource { .. }));
        assert!(!driver.is_initialized());
    }

    #[test]
    fn shader_failure_prints_log_then_panics() {
        let (mut driver, output) = driver(true);
        let mut renderer = RecordingRenderer {
            reject_program: Some("tile boxes"),
            ..RecordingRenderer::default()
        };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            driver.update_and_render(&mut renderer, &params(false, false));
        }));
        assert!(result.is_err());
        assert!(output.borrow().contains("syntax error"));
        assert!(!renderer.calls.contains(&Call::Begin));
    }
}
