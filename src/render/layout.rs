//! Fixed vertex and instance layout shared by both programs.

use super::{AttributeFormat, StepMode, VertexAttribute, VertexStream};
use crate::bake::BakedGeometry;
use bytemuck::{Pod, Zeroable};
use macroquad::prelude::{Mat4, Vec2};

/// Unit-quad vertex shared by every instance: position then UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// Corner of the unit quad.
    pub pos: [f32; 2],
    /// Texture coordinate within one tile cell.
    pub uv: [f32; 2],
}

impl QuadVertex {
    /// Size of one vertex.
    pub const STRIDE_BYTES: usize = 16;
}

/// UV V is flipped so image row 0 lands at the top of the quad.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0], uv: [0.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0], uv: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0], uv: [1.0, 1.0] },
    QuadVertex { pos: [1.0, 1.0], uv: [1.0, 0.0] },
];

/// Triangle-strip order of the quad above, as a triangle list.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 1, 3, 2];

/// One column-major `Mat4` per instance.
pub const MODEL_STRIDE_BYTES: usize = 64;
/// One `Vec2` per tile instance.
pub const UV_OFFSET_STRIDE_BYTES: usize = 8;

/// Quad corner: `xy` position, `zw` UV.
pub const A_VERTEX: VertexAttribute = VertexAttribute {
    name: "a_Vertex",
    location: 0,
    format: AttributeFormat::Float4,
};

/// Occupies locations 1 through 4.
pub const A_MODEL: VertexAttribute = VertexAttribute {
    name: "a_Model",
    location: 1,
    format: AttributeFormat::Mat4,
};

/// Atlas origin of the tile instance.
pub const A_UV_OFFSET: VertexAttribute = VertexAttribute {
    name: "a_UVOffset",
    location: 5,
    format: AttributeFormat::Float2,
};

/// [`QUAD_VERTICES`] as raw bytes.
pub fn quad_bytes() -> &'static [u8] {
    bytemuck::cast_slice(&QUAD_VERTICES)
}

/// Column-major floats, 16 per matrix.
pub fn flatten_transforms(transforms: &[Mat4]) -> Vec<f32> {
    transforms.iter().flat_map(|m| m.to_cols_array()).collect()
}

/// Two floats per vector.
pub fn flatten_vec2(values: &[Vec2]) -> Vec<f32> {
    values.iter().flat_map(|v| [v.x, v.y]).collect()
}

/// CPU copies of the instance buffers, kept alive while the renderer
/// uploads them.
pub struct InstanceData {
    /// Flattened tile model matrices.
    pub tile_models: Vec<f32>,
    /// Flattened tile atlas origins.
    pub tile_uv_offsets: Vec<f32>,
    /// Flattened collision-box model matrices.
    pub box_models: Vec<f32>,
}

impl InstanceData {
    /// Flatten baked geometry into upload-ready floats.
    pub fn from_baked(baked: &BakedGeometry) -> Self {
        InstanceData {
            tile_models: flatten_transforms(&baked.tile_transforms),
            tile_uv_offsets: flatten_vec2(&baked.tile_uv_offsets),
            box_models: flatten_transforms(&baked.box_transforms),
        }
    }

    /// Quad, per-instance model matrix, per-instance UV offset.
    pub fn tile_streams(&self) -> [VertexStream<'_>; 3] {
        [
            quad_stream(),
            VertexStream {
                step: StepMode::PerInstance,
                stride: MODEL_STRIDE_BYTES,
                bytes: bytemuck::cast_slice(&self.tile_models),
                attributes: std::slice::from_ref(&A_MODEL),
            },
            VertexStream {
                step: StepMode::PerInstance,
                stride: UV_OFFSET_STRIDE_BYTES,
                bytes: bytemuck::cast_slice(&self.tile_uv_offsets),
                attributes: std::slice::from_ref(&A_UV_OFFSET),
            },
        ]
    }

    /// Quad and per-instance model matrix.
    pub fn box_streams(&self) -> [VertexStream<'_>; 2] {
        [
            quad_stream(),
            VertexStream {
                step: StepMode::PerInstance,
                stride: MODEL_STRIDE_BYTES,
                bytes: bytemuck::cast_slice(&self.box_models),
                attributes: std::slice::from_ref(&A_MODEL),
            },
        ]
    }
}

fn quad_stream() -> VertexStream<'static> {
    VertexStream {
        step: StepMode::PerVertex,
        stride: QuadVertex::STRIDE_BYTES,
        bytes: quad_bytes(),
        attributes: std::slice::from_ref(&A_VERTEX),
    }
}
