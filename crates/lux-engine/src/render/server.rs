use glam::{Vec2, Vec3};

use crate::paint::Color;

use super::backend::RenderBackend;
use super::batch::{FrameStats, QuadBatcher};
use super::camera::Camera;
use super::error::RenderResult;
use super::handle::Handle;
use super::primitives;
use super::texture::{TextureId, TextureRef};
use super::visual::{Visual, VisualRegistry};
use super::RenderConfig;

/// Batched 2D rendering core.
///
/// Owns the visual registry, the camera, the host-side quad queue and the
/// graphics backend. Pass it by reference to whatever needs to draw; there is
/// no global instance.
///
/// Per frame: [`begin_frame`](Self::begin_frame), any immediate draws,
/// [`draw_all_visuals`](Self::draw_all_visuals), then
/// [`end_frame`](Self::end_frame) before the backend encodes the pass.
pub struct RenderingServer<B: RenderBackend> {
    backend: B,
    camera: Camera,
    visuals: VisualRegistry,
    batcher: QuadBatcher,

    // reused each frame by draw_all_visuals
    order: Vec<(TextureId, Handle)>,
}

impl<B: RenderBackend> RenderingServer<B> {
    /// Batches against the limits the backend was built with.
    pub fn new(backend: B) -> RenderResult<Self> {
        let config = backend.config();
        config.validate()?;
        let batcher = QuadBatcher::new(config.max_vertices);

        Ok(Self {
            backend,
            camera: Camera::default(),
            visuals: VisualRegistry::new(),
            batcher,
            order: Vec::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        self.backend.config()
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Counters for the frame in progress.
    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.batcher.stats()
    }

    // ── visuals ───────────────────────────────────────────────────────────

    pub fn new_visual(&mut self) -> Handle {
        self.visuals.create()
    }

    pub fn get_visual(&mut self, handle: Handle) -> RenderResult<&mut Visual> {
        self.visuals.get_mut(handle)
    }

    pub fn visual(&self, handle: Handle) -> RenderResult<&Visual> {
        self.visuals.get(handle)
    }

    /// Removes the visual; its handle may be returned by the next `new_visual`.
    pub fn delete_visual(&mut self, handle: Handle) -> RenderResult<()> {
        self.visuals.destroy(handle).map(|_| ())
    }

    #[inline]
    pub fn visuals(&self) -> &VisualRegistry {
        &self.visuals
    }

    // ── camera ────────────────────────────────────────────────────────────

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera.set_position(position);
    }

    pub fn set_camera_zoom(&mut self, zoom: f32) {
        self.camera.set_zoom(zoom);
    }

    pub fn set_camera_resolution(&mut self, size: Vec2) {
        self.camera.set_viewport_size(size);
    }

    #[inline]
    pub fn camera_position(&self) -> Vec3 {
        self.camera.position()
    }

    #[inline]
    pub fn camera_zoom(&self) -> f32 {
        self.camera.zoom()
    }

    #[inline]
    pub fn camera_resolution(&self) -> Vec2 {
        self.camera.viewport_size()
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Resets the backend append cursor and per-frame counters.
    pub fn begin_frame(&mut self) {
        self.backend.begin_frame();
        self.batcher.begin_frame();
    }

    /// Flushes anything queued after the last flush.
    pub fn end_frame(&mut self) {
        self.flush();
    }

    /// Queues every live visual, grouped by texture, then flushes.
    ///
    /// Visuals without a valid texture are skipped with a warning.
    pub fn draw_all_visuals(&mut self) {
        self.order.clear();
        self.order
            .extend(self.visuals.iter().map(|(h, v)| (v.texture.id, h)));
        // Stable: handle order is preserved within one texture group.
        self.order.sort_by_key(|&(tex, _)| tex);

        for i in 0..self.order.len() {
            let (_, handle) = self.order[i];
            let Ok(visual) = self.visuals.get(handle) else { continue };
            let visual = *visual;

            if visual.texture.is_null() {
                log::warn!("visual {handle} has no texture; skipped");
                continue;
            }
            if !self.backend.has_texture(visual.texture.id) {
                log::warn!("visual {handle} uses unknown texture {}; skipped", visual.texture.id);
                continue;
            }

            self.batcher.push_quad(
                &mut self.backend,
                &self.camera,
                visual.corners(),
                visual.color,
                visual.texture.id,
            );
        }

        self.flush();
    }

    /// Queues a quad. `texture = None` draws with the white texture.
    ///
    /// Null or unknown textures are skipped with a warning.
    pub fn push_quad(&mut self, corners: [Vec2; 4], color: Color, texture: Option<TextureRef>) {
        let id = match texture {
            None => self.backend.white_texture().id,
            Some(t) if t.is_null() => {
                log::warn!("push_quad with a null texture; skipped");
                return;
            }
            Some(t) => t.id,
        };

        if !self.backend.has_texture(id) {
            log::warn!("push_quad with unknown texture {id}; skipped");
            return;
        }

        self.batcher
            .push_quad(&mut self.backend, &self.camera, corners, color, id);
    }

    /// Submits the pending batch immediately.
    pub fn flush(&mut self) {
        self.batcher.flush(&mut self.backend, &self.camera);
    }

    // ── primitives ────────────────────────────────────────────────────────

    /// Line with the configured default thickness.
    pub fn draw_line(&mut self, p1: Vec2, p2: Vec2, color: Color) {
        let thickness = self.config().line_thickness;
        self.draw_line_thick(p1, p2, color, thickness);
    }

    /// Degenerate segments are silently ignored.
    pub fn draw_line_thick(&mut self, p1: Vec2, p2: Vec2, color: Color, thickness: f32) {
        if let Some(quad) = primitives::line_quad(p1, p2, thickness) {
            self.push_quad(quad, color, None);
        }
    }

    pub fn draw_point(&mut self, p: Vec2, color: Color, size: f32) {
        self.draw_rect(p, 0.0, Vec2::splat(size), color, true);
    }

    /// Rectangle centred on `center`, rotated by `rotation` radians.
    pub fn draw_rect(&mut self, center: Vec2, rotation: f32, size: Vec2, color: Color, filled: bool) {
        let corners = primitives::rect_corners(center, rotation, size);
        self.draw_corners(corners, color, filled);
    }

    /// Arbitrary local-space quad, rotated then moved to `position`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_quad(
        &mut self,
        p1: Vec2,
        p2: Vec2,
        p3: Vec2,
        p4: Vec2,
        position: Vec2,
        rotation: f32,
        color: Color,
        filled: bool,
    ) {
        let corners = primitives::rotate_translate([p1, p2, p3, p4], position, rotation);
        self.draw_corners(corners, color, filled);
    }

    /// Circle outline with the configured default segment count.
    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let segments = self.config().circle_segments;
        self.draw_circle_segments(center, radius, color, segments);
    }

    pub fn draw_circle_segments(&mut self, center: Vec2, radius: f32, color: Color, segments: u32) {
        for (a, b) in primitives::circle_segments(center, radius, segments) {
            self.draw_line(a, b, color);
        }
    }

    /// Immediate textured quad centred on `position`.
    pub fn draw_sprite(
        &mut self,
        texture: TextureRef,
        position: Vec2,
        size: Vec2,
        rotation: f32,
        color: Color,
    ) {
        let corners = primitives::rect_corners(position, rotation, size);
        self.push_quad(corners, color, Some(texture));
    }

    fn draw_corners(&mut self, corners: [Vec2; 4], color: Color, filled: bool) {
        if filled {
            self.push_quad(corners, color, None);
        } else {
            for (a, b) in primitives::outline_edges(corners) {
                self.draw_line(a, b, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessBackend, RenderError, Vertex};

    fn server() -> RenderingServer<HeadlessBackend> {
        server_with(RenderConfig::default())
    }

    fn server_with(config: RenderConfig) -> RenderingServer<HeadlessBackend> {
        RenderingServer::new(HeadlessBackend::new(&config)).unwrap()
    }

    fn textured_visual(
        s: &mut RenderingServer<HeadlessBackend>,
        tex: TextureRef,
        pos: Vec2,
    ) -> Handle {
        let h = s.new_visual();
        let v = s.get_visual(h).unwrap();
        v.size = Vec2::new(32.0, 32.0);
        v.texture = tex;
        v.set_transform(pos, 0.0, Vec2::ONE);
        h
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = RenderConfig { max_vertices: 10, ..Default::default() };
        assert!(matches!(
            RenderingServer::new(HeadlessBackend::new(&cfg)),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn batches_against_the_backend_limits() {
        let cfg = RenderConfig { max_vertices: 8, max_batches: 4, ..Default::default() };
        let mut s = server_with(cfg);
        assert_eq!(s.config().max_vertices, 8);

        s.begin_frame();
        for i in 0..6 {
            s.draw_point(Vec2::new(i as f32, 0.0), Color::WHITE, 1.0);
        }
        s.end_frame();

        let stats = s.stats();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.quads, 6);
        assert_eq!(stats.dropped_quads, 0);
        for call in s.backend().draws() {
            assert_eq!(s.backend().vertices_of(call).len(), 8);
        }
    }

    #[test]
    fn visuals_are_grouped_by_texture() {
        let mut s = server();
        let a = s.backend_mut().create_texture(8, 8).unwrap();
        let b = s.backend_mut().create_texture(8, 8).unwrap();

        // Interleaved in storage order.
        for i in 0..6 {
            let tex = if i % 2 == 0 { a } else { b };
            textured_visual(&mut s, tex, Vec2::new(i as f32 * 40.0, 0.0));
        }

        s.begin_frame();
        s.draw_all_visuals();

        let draws = s.backend().draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].texture, a.id);
        assert_eq!(draws[0].index_count, 18);
        assert_eq!(draws[1].texture, b.id);
        assert_eq!(draws[1].index_count, 18);
    }

    #[test]
    fn null_texture_visual_is_skipped() {
        let mut s = server();
        let tex = s.backend_mut().create_texture(4, 4).unwrap();
        let _blank = s.new_visual();
        textured_visual(&mut s, tex, Vec2::ZERO);

        s.begin_frame();
        s.draw_all_visuals();

        assert_eq!(s.backend().draws().len(), 1);
        assert_eq!(s.backend().draws()[0].index_count, 6);
    }

    #[test]
    fn destroyed_texture_visual_is_skipped() {
        let mut s = server();
        let tex = s.backend_mut().create_texture(4, 4).unwrap();
        textured_visual(&mut s, tex, Vec2::ZERO);
        s.backend_mut().destroy_texture(tex.id).unwrap();

        s.begin_frame();
        s.draw_all_visuals();
        assert!(s.backend().draws().is_empty());
    }

    #[test]
    fn deleted_visual_is_not_drawn() {
        let mut s = server();
        let tex = s.backend_mut().create_texture(4, 4).unwrap();
        let a = textured_visual(&mut s, tex, Vec2::ZERO);
        textured_visual(&mut s, tex, Vec2::ONE);
        s.delete_visual(a).unwrap();

        s.begin_frame();
        s.draw_all_visuals();
        assert_eq!(s.stats().quads, 1);
        assert_eq!(s.get_visual(a).unwrap_err(), RenderError::UnknownHandle(a));
    }

    #[test]
    fn visual_corners_reach_the_backend() {
        let mut s = server();
        let tex = s.backend_mut().create_texture(4, 4).unwrap();
        textured_visual(&mut s, tex, Vec2::new(100.0, 0.0));

        s.begin_frame();
        s.draw_all_visuals();

        let v: &[Vertex] = s.backend().vertices();
        assert_eq!(v[0].position, [84.0, -16.0]);
        assert_eq!(v[2].position, [116.0, 16.0]);
    }

    #[test]
    fn untextured_primitives_share_the_white_batch() {
        let mut s = server();
        s.begin_frame();

        s.draw_line(Vec2::ZERO, Vec2::new(10.0, 0.0), Color::RED);
        s.draw_rect(Vec2::ZERO, 0.0, Vec2::ONE, Color::GREEN, true);
        s.draw_point(Vec2::new(3.0, 3.0), Color::BLUE, 2.0);
        s.end_frame();

        let draws = s.backend().draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].texture, s.backend().white_texture().id);
        assert_eq!(draws[0].index_count, 18);
    }

    #[test]
    fn degenerate_line_pushes_nothing() {
        let mut s = server();
        s.begin_frame();
        let p = Vec2::new(7.0, 7.0);
        s.draw_line(p, p, Color::WHITE);
        s.end_frame();

        assert!(s.backend().vertices().is_empty());
        assert!(s.backend().draws().is_empty());
    }

    #[test]
    fn outlined_shapes_decompose_into_lines() {
        let mut s = server();
        s.begin_frame();
        s.draw_rect(Vec2::ZERO, 0.5, Vec2::new(10.0, 10.0), Color::WHITE, false);
        s.draw_circle(Vec2::ZERO, 5.0, Color::WHITE);
        s.draw_quad(
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(50.0, 50.0),
            0.0,
            Color::WHITE,
            false,
        );
        s.end_frame();

        // 4 rect edges + 32 circle chords + 4 quad edges.
        assert_eq!(s.stats().quads, 40);
        assert_eq!(s.stats().draw_calls, 1);
    }

    #[test]
    fn immediate_sprite_and_visuals_batch_in_submission_order() {
        let mut s = server();
        let tex = s.backend_mut().create_texture(4, 4).unwrap();
        textured_visual(&mut s, tex, Vec2::ZERO);

        s.begin_frame();
        s.draw_line(Vec2::ZERO, Vec2::ONE, Color::WHITE);
        s.draw_sprite(tex, Vec2::new(5.0, 5.0), Vec2::ONE, 0.0, Color::WHITE);
        s.draw_all_visuals();

        let draws = s.backend().draws();
        // white line, then sprite + visual sharing `tex`.
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[1].texture, tex.id);
        assert_eq!(draws[1].index_count, 12);
    }

    #[test]
    fn null_sprite_texture_is_skipped() {
        let mut s = server();
        s.begin_frame();
        s.draw_sprite(TextureRef::default(), Vec2::ZERO, Vec2::ONE, 0.0, Color::WHITE);
        s.end_frame();
        assert!(s.backend().draws().is_empty());
    }

    #[test]
    fn begin_frame_resets_buffer_offsets() {
        let mut s = server();
        for _ in 0..2 {
            s.begin_frame();
            s.draw_point(Vec2::ZERO, Color::WHITE, 1.0);
            s.end_frame();
            assert_eq!(s.backend().draws()[0].vertex_offset, 0);
            assert_eq!(s.stats().draw_calls, 1);
        }
    }

    #[test]
    fn camera_setters_feed_the_flush_matrix() {
        let mut s = server();
        s.set_camera_resolution(Vec2::new(640.0, 480.0));
        s.set_camera_zoom(2.0);
        s.set_camera_position(Vec3::new(10.0, 20.0, 0.0));

        assert_eq!(s.camera_zoom(), 2.0);
        assert_eq!(s.camera_resolution(), Vec2::new(640.0, 480.0));
        assert_eq!(s.camera_position(), Vec3::new(10.0, 20.0, 0.0));

        s.begin_frame();
        s.draw_point(Vec2::ZERO, Color::WHITE, 1.0);
        s.end_frame();
        assert_eq!(s.backend().draws()[0].view_proj, s.camera().view_projection());
    }

    #[test]
    fn overflowing_frame_drops_geometry_without_panicking() {
        let cfg = RenderConfig { max_vertices: 8, max_batches: 1, ..Default::default() };
        let mut s = server_with(cfg);
        s.begin_frame();
        for i in 0..5 {
            s.draw_point(Vec2::new(i as f32, 0.0), Color::WHITE, 1.0);
        }
        s.end_frame();

        let stats = s.stats();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.quads, 2);
        assert_eq!(stats.dropped_quads, 3);
    }
}
