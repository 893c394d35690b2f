use glam::Vec2;

use crate::paint::Color;

use super::backend::{DrawCall, RenderBackend};
use super::camera::Camera;
use super::texture::TextureId;
use super::vertex::{Vertex, QUAD_UVS};

/// Per-frame batching counters. Reset by [`QuadBatcher::begin_frame`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub quads: u32,
    pub dropped_quads: u32,
}

/// Host-side quad queue that flushes on texture change or when full.
///
/// Runs of quads sharing a texture become one indexed draw call.
#[derive(Debug)]
pub struct QuadBatcher {
    vertices: Vec<Vertex>,
    current: Option<TextureId>,
    max_vertices: usize,
    stats: FrameStats,
    warned_overflow: bool,
}

impl QuadBatcher {
    /// `max_vertices` must be a non-zero multiple of 4.
    pub fn new(max_vertices: u32) -> Self {
        debug_assert!(max_vertices >= 4 && max_vertices % 4 == 0);
        Self {
            vertices: Vec::with_capacity(max_vertices as usize),
            current: None,
            max_vertices: max_vertices as usize,
            stats: FrameStats::default(),
            warned_overflow: false,
        }
    }

    /// Queues one quad. Corners are pushed in order with UVs
    /// (0,0), (1,0), (1,1), (0,1).
    ///
    /// Flushes the pending batch first when `texture` differs from the batch
    /// texture or the queue cannot take four more vertices.
    pub fn push_quad<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        camera: &Camera,
        corners: [Vec2; 4],
        color: Color,
        texture: TextureId,
    ) {
        let texture_changed = self.current != Some(texture);
        let full = self.vertices.len() + 4 > self.max_vertices;

        if texture_changed || full {
            self.flush(backend, camera);
            self.current = Some(texture);
        }

        for (corner, uv) in corners.into_iter().zip(QUAD_UVS) {
            self.vertices.push(Vertex::new(corner, uv, color));
        }
    }

    /// Uploads the pending vertices and issues one indexed draw.
    ///
    /// No-op when empty. On vertex buffer overflow the pending geometry is
    /// dropped and an error is logged once per batcher.
    pub fn flush<B: RenderBackend>(&mut self, backend: &mut B, camera: &Camera) {
        if self.vertices.is_empty() {
            return;
        }

        let quads = (self.vertices.len() / 4) as u32;
        let Some(texture) = self.current else {
            self.vertices.clear();
            return;
        };

        let offset = match backend.append_vertices(&self.vertices) {
            Ok(offset) => offset,
            Err(e) => {
                if !self.warned_overflow {
                    log::error!("dropping {quads} quads this frame: {e}; raise max_batches");
                    self.warned_overflow = true;
                }
                self.stats.dropped_quads += quads;
                self.vertices.clear();
                return;
            }
        };

        backend.draw(DrawCall {
            texture,
            vertex_offset: offset,
            index_count: quads * 6,
            view_proj: camera.view_projection(),
        });

        self.stats.draw_calls += 1;
        self.stats.quads += quads;
        self.vertices.clear();
    }

    /// Starts a new frame: clears counters and forgets the batch texture.
    ///
    /// Geometry still pending from the previous frame is discarded.
    pub fn begin_frame(&mut self) {
        if !self.vertices.is_empty() {
            log::debug!("discarding {} unflushed vertices from previous frame", self.vertices.len());
            self.vertices.clear();
        }
        self.stats = FrameStats::default();
        self.current = None;
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[inline]
    pub fn pending_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn current_texture(&self) -> Option<TextureId> {
        self.current
    }
}
