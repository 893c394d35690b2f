//! Boundary between the batching core and the graphics backend.

use std::collections::HashSet;

use glam::Mat4;

use super::error::{RenderError, RenderResult};
use super::texture::{TextureId, TextureIdSource, TextureRef};
use super::vertex::Vertex;
use super::RenderConfig;

/// One indexed draw issued by a flush.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCall {
    pub texture: TextureId,
    /// Byte offset of the batch's first vertex in the frame vertex buffer.
    pub vertex_offset: u64,
    /// `(vertices / 4) * 6`.
    pub index_count: u32,
    pub view_proj: Mat4,
}

/// Operations the batching core needs from a graphics backend.
///
/// Implementations own the vertex/index buffers and pipeline for their whole
/// lifetime; only the rendering core writes through this trait.
pub trait RenderBackend {
    /// Limits the backend's buffers were sized for. The rendering core
    /// batches against these.
    fn config(&self) -> &RenderConfig;

    /// Resets the vertex append cursor. Called once at the start of a frame.
    fn begin_frame(&mut self);

    /// Appends `vertices` after the data already written this frame.
    ///
    /// Returns the byte offset of the first appended vertex, or
    /// [`RenderError::BufferOverflow`] when the frame buffer cannot hold them.
    /// Nothing is written on overflow.
    fn append_vertices(&mut self, vertices: &[Vertex]) -> RenderResult<u64>;

    /// Records an indexed draw over previously appended vertices.
    fn draw(&mut self, call: DrawCall);

    /// 1×1 opaque white texture used for untextured geometry.
    fn white_texture(&self) -> TextureRef;

    /// Whether `id` names a live texture.
    fn has_texture(&self, id: TextureId) -> bool;
}

/// Byte cursor over a fixed-capacity append-only buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AppendCursor {
    capacity: u64,
    used: u64,
}

impl AppendCursor {
    pub(crate) fn new(capacity: u64) -> Self {
        Self { capacity, used: 0 }
    }

    pub(crate) fn reset(&mut self) {
        self.used = 0;
    }

    /// Reserves `bytes`, returning the start offset.
    pub(crate) fn reserve(&mut self, bytes: u64) -> RenderResult<u64> {
        let available = self.capacity - self.used;
        if bytes > available {
            return Err(RenderError::BufferOverflow { requested: bytes, available });
        }
        let offset = self.used;
        self.used += bytes;
        Ok(offset)
    }

    pub(crate) fn capacity(&self) -> u64 {
        self.capacity
    }
}

/// Backend that records appends and draws without touching a GPU.
///
/// Used for headless runs (servers, tooling) and for exercising the batching
/// core in tests.
#[derive(Debug)]
pub struct HeadlessBackend {
    config: RenderConfig,
    cursor: AppendCursor,
    vertices: Vec<Vertex>,
    draws: Vec<DrawCall>,
    textures: HashSet<TextureId>,
    ids: TextureIdSource,
    white: TextureRef,
}

impl HeadlessBackend {
    pub fn new(config: &RenderConfig) -> Self {
        let mut ids = TextureIdSource::default();
        let white = TextureRef::new(ids.next(), 1, 1);
        let mut textures = HashSet::new();
        textures.insert(white.id);

        Self {
            config: config.clone(),
            cursor: AppendCursor::new(config.frame_vertex_capacity() * Vertex::SIZE),
            vertices: Vec::new(),
            draws: Vec::new(),
            textures,
            ids,
            white,
        }
    }

    /// Registers a texture of the given size; no pixel data is kept.
    pub fn create_texture(&mut self, width: u32, height: u32) -> RenderResult<TextureRef> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyTexture { width, height });
        }
        let id = self.ids.next();
        self.textures.insert(id);
        Ok(TextureRef::new(id, width, height))
    }

    pub fn destroy_texture(&mut self, id: TextureId) -> RenderResult<()> {
        if id == self.white.id || !self.textures.remove(&id) {
            return Err(RenderError::UnknownTexture(id));
        }
        Ok(())
    }

    /// Draw calls recorded since the last `begin_frame`.
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Vertices appended since the last `begin_frame`, in buffer order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertices belonging to `call`.
    pub fn vertices_of(&self, call: &DrawCall) -> &[Vertex] {
        let start = (call.vertex_offset / Vertex::SIZE) as usize;
        let count = call.index_count as usize / 6 * 4;
        &self.vertices[start..start + count]
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.cursor.capacity()
    }
}

impl RenderBackend for HeadlessBackend {
    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn begin_frame(&mut self) {
        self.cursor.reset();
        self.vertices.clear();
        self.draws.clear();
    }

    fn append_vertices(&mut self, vertices: &[Vertex]) -> RenderResult<u64> {
        let offset = self.cursor.reserve(vertices.len() as u64 * Vertex::SIZE)?;
        self.vertices.extend_from_slice(vertices);
        Ok(offset)
    }

    fn draw(&mut self, call: DrawCall) {
        self.draws.push(call);
    }

    fn white_texture(&self) -> TextureRef {
        self.white
    }

    fn has_texture(&self, id: TextureId) -> bool {
        self.textures.contains(&id)
    }
}
