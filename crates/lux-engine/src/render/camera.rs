//! 2D camera.
//!
//! Convention (used everywhere in the engine):
//! - World space is y-up. The camera position maps to the viewport centre.
//! - Projection space spans `[0, width] x [0, height]` with the origin at the
//!   bottom-left, near/far `[-1, 1]`.
//! - Screen (window) space is y-down with the origin at the top-left, in the
//!   same pixels as the viewport. Use [`Camera::screen_to_world`] for pointer input.

use glam::{Mat4, Vec2, Vec3};

/// Smallest accepted zoom; keeps the view matrix invertible.
pub const MIN_ZOOM: f32 = 1.0e-4;

/// Camera state with eagerly derived matrices.
///
/// Every setter recomputes `view` and `proj` before returning.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    zoom: f32,
    viewport: Vec2,
    view: Mat4,
    proj: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::new(1280.0, 720.0))
    }
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        let mut cam = Self {
            position: Vec3::ZERO,
            zoom: 1.0,
            viewport: sanitize_viewport(viewport),
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        };
        cam.update_matrices();
        cam
    }

    /// Only `x` and `y` move the view; `z` is stored but never reaches the
    /// near/far range.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_matrices();
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() { zoom.max(MIN_ZOOM) } else { 1.0 };
        self.update_matrices();
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport = sanitize_viewport(size);
        self.update_matrices();
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[inline]
    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.proj
    }

    /// Combined matrix uploaded with each flush.
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.proj * self.view
    }

    /// Converts a window position (top-left origin, y-down) to world space.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let projected = Vec2::new(screen.x, self.viewport.y - screen.y);
        (projected - self.viewport * 0.5) / self.zoom + self.position.truncate()
    }

    /// Converts a world position to window space (top-left origin, y-down).
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let projected = (world - self.position.truncate()) * self.zoom + self.viewport * 0.5;
        Vec2::new(projected.x, self.viewport.y - projected.y)
    }

    /// World-space axis-aligned bounds currently visible, as `(min, max)`.
    pub fn visible_world_rect(&self) -> (Vec2, Vec2) {
        let half = self.viewport * 0.5 / self.zoom;
        let c = self.position.truncate();
        (c - half, c + half)
    }

    // view = translate(center) * scale(zoom) * translate(-position.xy)
    fn update_matrices(&mut self) {
        let center = (self.viewport * 0.5).extend(0.0);
        self.view = Mat4::from_translation(center)
            * Mat4::from_scale(Vec3::new(self.zoom, self.zoom, 1.0))
            * Mat4::from_translation(-self.position.truncate().extend(0.0));
        self.proj = Mat4::orthographic_rh(0.0, self.viewport.x, 0.0, self.viewport.y, -1.0, 1.0);
    }
}

fn sanitize_viewport(size: Vec2) -> Vec2 {
    let fix = |v: f32| if v.is_finite() { v.max(1.0) } else { 1.0 };
    Vec2::new(fix(size.x), fix(size.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn view_matrix_order_is_fixed_regardless_of_setter_order() {
        let mut a = Camera::new(Vec2::new(800.0, 600.0));
        a.set_zoom(2.0);
        a.set_position(Vec3::ZERO);

        let mut b = Camera::new(Vec2::new(800.0, 600.0));
        b.set_position(Vec3::ZERO);
        b.set_zoom(2.0);

        let expected = Mat4::from_translation(Vec3::new(400.0, 300.0, 0.0))
            * Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0))
            * Mat4::from_translation(Vec3::ZERO);

        assert_eq!(a.view(), expected);
        assert_eq!(b.view(), expected);
    }

    #[test]
    fn setters_refresh_matrices_immediately() {
        let mut cam = Camera::default();
        let before = cam.view_projection();
        cam.set_viewport_size(Vec2::new(640.0, 480.0));
        assert_ne!(cam.view_projection(), before);
        assert_eq!(
            cam.projection(),
            Mat4::orthographic_rh(0.0, 640.0, 0.0, 480.0, -1.0, 1.0)
        );
    }

    #[test]
    fn camera_position_lands_on_screen_center() {
        let mut cam = Camera::new(Vec2::new(800.0, 600.0));
        cam.set_position(Vec3::new(120.0, -40.0, 0.0));
        cam.set_zoom(3.0);

        assert!(approx(cam.world_to_screen(Vec2::new(120.0, -40.0)), Vec2::new(400.0, 300.0)));

        let clip = cam.view_projection() * glam::Vec4::new(120.0, -40.0, 0.0, 1.0);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
    }

    #[test]
    fn world_is_y_up_screen_is_y_down() {
        let cam = Camera::new(Vec2::new(800.0, 600.0));
        // Top-left pixel is up-left of the origin in world space.
        assert!(approx(cam.screen_to_world(Vec2::ZERO), Vec2::new(-400.0, 300.0)));
        assert!(approx(cam.screen_to_world(Vec2::new(800.0, 600.0)), Vec2::new(400.0, -300.0)));
    }

    #[test]
    fn screen_world_round_trip_with_zoom_and_offset() {
        let mut cam = Camera::new(Vec2::new(1024.0, 768.0));
        cam.set_position(Vec3::new(33.0, 77.0, 0.0));
        cam.set_zoom(0.5);

        let screen = Vec2::new(10.0, 700.0);
        let back = cam.world_to_screen(cam.screen_to_world(screen));
        assert!(approx(back, screen));
    }

    #[test]
    fn camera_depth_never_clips_the_scene() {
        let mut cam = Camera::new(Vec2::new(800.0, 600.0));
        cam.set_position(Vec3::new(10.0, 20.0, 0.0));
        let flat = cam.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);

        for z in [2.0, -2.0, 0.5, 1000.0] {
            cam.set_position(Vec3::new(10.0, 20.0, z));
            let clip = cam.view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
            assert!((-1.0..=1.0).contains(&clip.z), "z={z} gives clip z {}", clip.z);
            assert_eq!(clip, flat);
            assert_eq!(cam.position().z, z);
        }
    }

    #[test]
    fn visible_rect_shrinks_with_zoom() {
        let mut cam = Camera::new(Vec2::new(800.0, 600.0));
        cam.set_position(Vec3::new(100.0, 50.0, 0.0));
        assert_eq!(
            cam.visible_world_rect(),
            (Vec2::new(-300.0, -250.0), Vec2::new(500.0, 350.0))
        );

        cam.set_zoom(2.0);
        let (min, max) = cam.visible_world_rect();
        assert!(approx(min, cam.screen_to_world(Vec2::new(0.0, 600.0))));
        assert!(approx(max, cam.screen_to_world(Vec2::new(800.0, 0.0))));
    }

    #[test]
    fn invalid_zoom_and_viewport_are_sanitized() {
        let mut cam = Camera::default();
        cam.set_zoom(0.0);
        assert_eq!(cam.zoom(), MIN_ZOOM);
        cam.set_zoom(f32::NAN);
        assert_eq!(cam.zoom(), 1.0);

        cam.set_viewport_size(Vec2::new(0.0, -5.0));
        assert_eq!(cam.viewport_size(), Vec2::ONE);
    }
}
