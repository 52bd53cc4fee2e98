use bytemuck::{Pod, Zeroable};

use crate::backend::{VertexAttribute, VertexLayout};
use crate::coords::Vec2;

/// Interleaved 2D vertex: model-space position + texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(pos: [f32; 2], uv: [f32; 2]) -> Self {
        Self { pos, uv }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }

    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<Vertex>() as u32,
        attributes: &[
            VertexAttribute { location: 0, components: 2, offset: 0 },
            VertexAttribute { location: 1, components: 2, offset: 8 },
        ],
    };
}

/// Unit quad centered on the origin, y down like logical pixel space.
/// Corners: TL, TR, BR, BL.
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex::new([-0.5, -0.5], [0.0, 0.0]),
    Vertex::new([0.5, -0.5], [1.0, 0.0]),
    Vertex::new([0.5, 0.5], [1.0, 1.0]),
    Vertex::new([-0.5, 0.5], [0.0, 1.0]),
];

/// Two triangles over [`QUAD_VERTICES`].
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];
