//! [`Renderer`] over macroquad's internal miniquad context.
//!
//! Must only be used from inside a macroquad frame; every call flushes
//! macroquad's own batched geometry before issuing raw miniquad commands.

use super::{
    AttributeFormat, DrawCall, InstancedMeshDesc, MeshId, ProgramDesc, ProgramId, Renderer,
    StepMode, TextureHandle, UniformKind,
};
use crate::error::RenderError;
use crate::platform::DecodedImage;
use log::debug;
use macroquad::color::Color;
use macroquad::miniquad::{
    self as mq, BlendFactor, BlendState, BlendValue, BufferLayout, BufferSource, BufferType,
    BufferUsage, Equation, MipmapFilterMode, PassAction, PipelineParams, RenderingBackend,
    ShaderMeta, ShaderSource, UniformBlockLayout, UniformDesc, UniformType, VertexFormat,
    VertexStep,
};
use macroquad::window::{clear_background, get_internal_gl};

struct ProgramEntry {
    shader: mq::ShaderId,
}

struct MeshEntry {
    pipeline: mq::Pipeline,
    bindings: mq::Bindings,
    index_count: i32,
}

/// Renderer that issues raw miniquad commands between macroquad's own draws.
pub struct MiniquadRenderer {
    programs: Vec<ProgramEntry>,
    meshes: Vec<MeshEntry>,
    textures: Vec<mq::TextureId>,
    clear_color: Color,
    uniform_scratch: Vec<f32>,
}

impl Default for MiniquadRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniquadRenderer {
    /// Empty renderer with a black clear colour.
    pub fn new() -> Self {
        MiniquadRenderer {
            programs: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            clear_color: Color::new(0.0, 0.0, 0.0, 1.0),
            uniform_scratch: Vec::with_capacity(32),
        }
    }

    fn with_context<R>(f: impl FnOnce(&mut dyn RenderingBackend) -> R) -> R {
        let mut gl = unsafe { get_internal_gl() };
        gl.flush();
        f(gl.quad_context)
    }
}

fn uniform_type(kind: UniformKind) -> UniformType {
    match kind {
        UniformKind::Float2 => UniformType::Float2,
        UniformKind::Mat4 => UniformType::Mat4,
    }
}

fn vertex_format(format: AttributeFormat) -> VertexFormat {
    match format {
        AttributeFormat::Float2 => VertexFormat::Float2,
        AttributeFormat::Float4 => VertexFormat::Float4,
        AttributeFormat::Mat4 => VertexFormat::Mat4,
    }
}

impl Renderer for MiniquadRenderer {
    fn backend(&self) -> &'static str {
        "miniquad"
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, RenderError> {
        let meta = ShaderMeta {
            images: desc.textures.iter().map(|s| s.to_string()).collect(),
            uniforms: UniformBlockLayout {
                uniforms: desc
                    .uniforms
                    .iter()
                    .map(|u| UniformDesc::new(u.name, uniform_type(u.kind)))
                    .collect(),
            },
        };
        let shader = Self::with_context(|ctx| {
            ctx.new_shader(
                ShaderSource::Glsl {
                    vertex: desc.vertex_source,
                    fragment: desc.fragment_source,
                },
                meta,
            )
        })
        .map_err(|err| RenderError::Shader {
            program: desc.name.to_owned(),
            log: format!("{err:?}"),
        })?;

        self.programs.push(ProgramEntry { shader });
        debug!("Built shader program '{}'", desc.name);
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn create_texture_rgba8(&mut self, image: &DecodedImage) -> TextureHandle {
        // Tileset::new caps both sides at MAX_ATLAS_SIDE
        let (width, height) = (image.width as u16, image.height as u16);
        let texture = Self::with_context(|ctx| {
            let texture = ctx.new_texture_from_rgba8(width, height, &image.pixels);
            ctx.texture_set_filter(texture, mq::FilterMode::Nearest, MipmapFilterMode::None);
            texture
        });
        self.textures.push(texture);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn create_instanced_mesh(&mut self, desc: &InstancedMeshDesc<'_>) -> MeshId {
        let shader = self.programs[desc.program.0 as usize].shader;

        let layouts: Vec<BufferLayout> = desc
            .streams
            .iter()
            .map(|s| BufferLayout {
                stride: s.stride as i32,
                step_func: match s.step {
                    StepMode::PerVertex => VertexStep::PerVertex,
                    StepMode::PerInstance => VertexStep::PerInstance,
                },
                step_rate: 1,
            })
            .collect();
        let attributes: Vec<mq::VertexAttribute> = desc
            .streams
            .iter()
            .enumerate()
            .flat_map(|(buffer_index, s)| {
                s.attributes.iter().map(move |a| {
                    mq::VertexAttribute::with_buffer(a.name, vertex_format(a.format), buffer_index)
                })
            })
            .collect();

        let entry = Self::with_context(|ctx| {
            let vertex_buffers = desc
                .streams
                .iter()
                .map(|s| {
                    ctx.new_buffer(
                        BufferType::VertexBuffer,
                        BufferUsage::Immutable,
                        BufferSource::slice(s.bytes),
                    )
                })
                .collect();
            let index_buffer = ctx.new_buffer(
                BufferType::IndexBuffer,
                BufferUsage::Immutable,
                BufferSource::slice(desc.indices),
            );
            let pipeline = ctx.new_pipeline(
                &layouts,
                &attributes,
                shader,
                PipelineParams {
                    color_blend: Some(BlendState::new(
                        Equation::Add,
                        BlendFactor::Value(BlendValue::SourceAlpha),
                        BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
                    )),
                    ..Default::default()
                },
            );
            MeshEntry {
                pipeline,
                bindings: mq::Bindings {
                    vertex_buffers,
                    index_buffer,
                    images: Vec::new(),
                },
                index_count: desc.indices.len() as i32,
            }
        });

        self.meshes.push(entry);
        debug!("Created instanced mesh '{}'", desc.label);
        MeshId(self.meshes.len() as u32 - 1)
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = Color::new(rgba[0], rgba[1], rgba[2], rgba[3]);
    }

    fn begin_frame(&mut self) {
        clear_background(self.clear_color);
    }

    fn draw_instanced(&mut self, call: &DrawCall<'_>) {
        if call.instances == 0 {
            return;
        }

        self.uniform_scratch.clear();
        for value in call.uniforms {
            value.write_floats(&mut self.uniform_scratch);
        }

        let mesh = &mut self.meshes[call.mesh.0 as usize];
        mesh.bindings.images.clear();
        if let Some(texture) = call.texture {
            mesh.bindings.images.push(self.textures[texture.0 as usize]);
        }

        let uniforms = &self.uniform_scratch;
        Self::with_context(|ctx| {
            ctx.begin_default_pass(PassAction::Nothing);
            ctx.apply_pipeline(&mesh.pipeline);
            ctx.apply_bindings(&mesh.bindings);
            ctx.apply_uniforms_from_bytes(
                uniforms.as_ptr() as *const u8,
                uniforms.len() * std::mem::size_of::<f32>(),
            );
            ctx.draw(0, mesh.index_count, call.instances as i32);
            ctx.end_render_pass();
        });
    }

    fn end_frame(&mut self) {}
}

