//! GPU command surface consumed by the frame driver.
//!
//! The core only talks to [`Renderer`]; each graphics backend provides one
//! implementation. Resources are referred to by small copyable handles.

/// Zoomable orthographic camera.
pub mod camera;
/// Vertex and instance buffer layout.
pub mod layout;
/// Renderer over macroquad's miniquad context.
pub mod miniquad_backend;

use crate::error::RenderError;
use crate::platform::DecodedImage;
use macroquad::prelude::{Mat4, Vec2};

pub use camera::Camera;
pub use miniquad_backend::MiniquadRenderer;

/// Handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Handle to an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to an instanced mesh (buffers plus pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Type of a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    /// `vec2`
    Float2,
    /// `mat4`
    Mat4,
}

/// Declared uniform of a program. Values are supplied in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSpec {
    /// GLSL identifier.
    pub name: &'static str,
    /// GLSL type.
    pub kind: UniformKind,
}

/// Uniform value supplied with a draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `vec2` value.
    Float2(Vec2),
    /// `mat4` value.
    Mat4(Mat4),
}

impl UniformValue {
    /// The kind this value must be declared with.
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float2(_) => UniformKind::Float2,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Append the value as tightly packed floats (matrices column-major).
    pub fn write_floats(&self, out: &mut Vec<f32>) {
        match self {
            UniformValue::Float2(v) => out.extend_from_slice(&[v.x, v.y]),
            UniformValue::Mat4(m) => out.extend_from_slice(&m.to_cols_array()),
        }
    }
}

/// Everything needed to build a shader program.
pub struct ProgramDesc<'a> {
    /// Used in diagnostics only.
    pub name: &'a str,
    /// Vertex shader source.
    pub vertex_source: &'a str,
    /// Fragment shader source.
    pub fragment_source: &'a str,
    /// Uniforms in the order draw calls supply them.
    pub uniforms: &'a [UniformSpec],
    /// Sampler names, bound in order to the draw call's texture slots.
    pub textures: &'a [&'static str],
}

/// Format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    /// Two floats.
    Float2,
    /// Four floats.
    Float4,
    /// Four consecutive vec4 columns.
    Mat4,
}

impl AttributeFormat {
    /// Floats read per vertex or instance.
    pub fn floats(self) -> usize {
        match self {
            AttributeFormat::Float2 => 2,
            AttributeFormat::Float4 => 4,
            AttributeFormat::Mat4 => 16,
        }
    }

    /// Attribute slots occupied (a mat4 spans four).
    pub fn slots(self) -> u32 {
        match self {
            AttributeFormat::Mat4 => 4,
            _ => 1,
        }
    }
}

/// How often a stream advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Advances once per vertex.
    PerVertex,
    /// Advances once per instance (divisor 1).
    PerInstance,
}

/// Vertex attribute binding. Backends that bind by index use `location`,
/// backends that bind by name use `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// GLSL identifier.
    pub name: &'static str,
    /// Attribute location of the first slot.
    pub location: u32,
    /// Layout of the attribute data.
    pub format: AttributeFormat,
}

/// One GPU buffer and the attributes read from it.
pub struct VertexStream<'a> {
    /// Per-vertex or per-instance.
    pub step: StepMode,
    /// Bytes between consecutive entries.
    pub stride: usize,
    /// Buffer contents.
    pub bytes: &'a [u8],
    /// Attributes read from this buffer.
    pub attributes: &'a [VertexAttribute],
}

impl VertexStream<'_> {
    /// Number of vertices (or instances) stored in the stream.
    pub fn len(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.bytes.len() / self.stride
        }
    }

    /// Whether the stream holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Static buffers for one instanced quad mesh.
pub struct InstancedMeshDesc<'a> {
    /// Used in diagnostics only.
    pub label: &'a str,
    /// Program the pipeline is built for.
    pub program: ProgramId,
    /// Triangle-list indices into the per-vertex stream.
    pub indices: &'a [u16],
    /// One entry per vertex buffer, in binding order.
    pub streams: &'a [VertexStream<'a>],
}

/// One instanced draw.
pub struct DrawCall<'a> {
    /// Must match the program the mesh was built for.
    pub program: ProgramId,
    /// Mesh to draw.
    pub mesh: MeshId,
    /// Bound to the program's first sampler.
    pub texture: Option<TextureHandle>,
    /// Values in the program's declaration order.
    pub uniforms: &'a [UniformValue],
    /// Instances to draw. Zero draws nothing.
    pub instances: u32,
}

/// Renderer trait for GPU backends.
pub trait Renderer {
    /// Backend identifier (e.g. "miniquad").
    fn backend(&self) -> &'static str;

    /// Compile and link a program. The error carries the compiler or linker log.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, RenderError>;

    /// Upload an RGBA8 image. Sampling is always nearest-neighbour.
    fn create_texture_rgba8(&mut self, image: &DecodedImage) -> TextureHandle;

    /// Create static vertex/instance buffers and their attribute layout.
    fn create_instanced_mesh(&mut self, desc: &InstancedMeshDesc<'_>) -> MeshId;

    /// Colour used by [`Renderer::begin_frame`], channels in 0..=1.
    fn set_clear_color(&mut self, rgba: [f32; 4]);

    /// Start a frame and clear the colour buffer.
    fn begin_frame(&mut self);

    /// Draw the mesh's indexed quad once per instance.
    fn draw_instanced(&mut self, call: &DrawCall<'_>);

    /// Finish the frame.
    fn end_frame(&mut self);
}
