use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::paint::Color;

/// GPU-ready sprite vertex (32 bytes).
///
///  offset  0  position  [f32; 2]   loc 0
///  offset  8  uv        [f32; 2]   loc 1
///  offset 16  color     [f32; 4]   loc 2
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const SIZE: u64 = std::mem::size_of::<Vertex>() as u64;

    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // uv
        2 => Float32x4  // color
    ];

    #[inline]
    pub fn new(position: Vec2, uv: [f32; 2], color: Color) -> Self {
        Self {
            position: position.to_array(),
            uv,
            color: color.to_array(),
        }
    }

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// UVs assigned to quad corners 0..4, in push order.
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Index pattern for one quad, offset by 4 per quad in the shared index buffer.
pub const QUAD_INDEX_PATTERN: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Builds the shared index buffer contents for `quads` quads.
pub fn quad_indices(quads: u32) -> Vec<u16> {
    let mut out = Vec::with_capacity(quads as usize * 6);
    for q in 0..quads {
        // `RenderConfig::validate` keeps `quads * 4` within u16 range.
        let base = (q * 4) as u16;
        out.extend(QUAD_INDEX_PATTERN.iter().map(|i| base + i));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(Vertex::SIZE, 32);
    }

    #[test]
    fn indices_repeat_with_stride_four() {
        let idx = quad_indices(3);
        assert_eq!(idx.len(), 18);
        assert_eq!(&idx[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&idx[6..12], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(&idx[12..], &[8, 9, 10, 8, 10, 11]);
    }

    #[test]
    fn indices_cover_the_full_u16_range() {
        let idx = quad_indices(1 << 14);
        assert_eq!(*idx.last().unwrap(), u16::MAX);
    }
}
