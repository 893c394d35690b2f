use glam::{Mat3, Vec2};

use crate::paint::Color;

use super::error::{RenderError, RenderResult};
use super::handle::{Handle, HandleAllocator};
use super::texture::TextureRef;

/// Per-object drawable state.
///
/// A fresh record has an identity transform, zero size, a null texture (so it
/// is not drawn until a texture is assigned) and a white tint.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Visual {
    /// Local-to-world transform applied to the size-scaled unit quad.
    pub transform: Mat3,
    pub size: Vec2,
    pub texture: TextureRef,
    pub color: Color,
}

impl Default for Visual {
    fn default() -> Self {
        Self {
            transform: Mat3::IDENTITY,
            size: Vec2::ZERO,
            texture: TextureRef::default(),
            color: Color::WHITE,
        }
    }
}

impl Visual {
    /// Sets the transform from translation, rotation (radians) and scale.
    pub fn set_transform(&mut self, position: Vec2, rotation: f32, scale: Vec2) {
        self.transform = Mat3::from_scale_angle_translation(scale, rotation, position);
    }

    /// World-space corners of the quad centred on the local origin.
    ///
    /// Order: bottom-left, bottom-right, top-right, top-left (local space).
    pub fn corners(&self) -> [Vec2; 4] {
        let w = self.size.x * 0.5;
        let h = self.size.y * 0.5;
        [
            Vec2::new(-w, -h),
            Vec2::new(w, -h),
            Vec2::new(w, h),
            Vec2::new(-w, h),
        ]
        .map(|p| self.transform.transform_point2(p))
    }
}

/// Handle-indexed store of visual records.
///
/// Slots are a dense `Vec` indexed by handle; freed slots are recycled through
/// the handle free-list.
#[derive(Debug, Default)]
pub struct VisualRegistry {
    slots: Vec<Option<Visual>>,
    handles: HandleAllocator,
}

impl VisualRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> Handle {
        let handle = self.handles.acquire();
        let idx = handle.index();

        if idx == self.slots.len() {
            self.slots.push(Some(Visual::default()));
        } else {
            debug_assert!(self.slots[idx].is_none(), "recycled handle {handle} still occupied");
            self.slots[idx] = Some(Visual::default());
        }

        handle
    }

    pub fn get(&self, handle: Handle) -> RenderResult<&Visual> {
        self.slots
            .get(handle.index())
            .and_then(Option::as_ref)
            .ok_or(RenderError::UnknownHandle(handle))
    }

    pub fn get_mut(&mut self, handle: Handle) -> RenderResult<&mut Visual> {
        self.slots
            .get_mut(handle.index())
            .and_then(Option::as_mut)
            .ok_or(RenderError::UnknownHandle(handle))
    }

    /// Removes the record and recycles its handle.
    pub fn destroy(&mut self, handle: Handle) -> RenderResult<Visual> {
        let visual = self
            .slots
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(RenderError::UnknownHandle(handle))?;

        self.handles.release(handle);
        Ok(visual)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.handles.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live records in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Visual)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (Handle::from_raw(i as u32), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn create_returns_default_record() {
        let mut reg = VisualRegistry::new();
        let h = reg.create();
        assert_eq!(*reg.get(h).unwrap(), Visual::default());
        assert!(reg.get(h).unwrap().texture.is_null());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn deleting_second_of_three_recycles_its_handle() {
        let mut reg = VisualRegistry::new();
        let _a = reg.create();
        let b = reg.create();
        let _c = reg.create();

        reg.destroy(b).unwrap();
        assert_eq!(reg.create(), b);
    }

    #[test]
    fn two_deletes_reuse_in_reverse_order() {
        let mut reg = VisualRegistry::new();
        let hs: Vec<_> = (0..4).map(|_| reg.create()).collect();

        reg.destroy(hs[0]).unwrap();
        reg.destroy(hs[2]).unwrap();

        assert_eq!(reg.create(), hs[2]);
        assert_eq!(reg.create(), hs[0]);
    }

    #[test]
    fn recycled_handle_starts_fresh() {
        let mut reg = VisualRegistry::new();
        let h = reg.create();
        reg.get_mut(h).unwrap().size = Vec2::new(9.0, 9.0);
        reg.destroy(h).unwrap();

        let again = reg.create();
        assert_eq!(again, h);
        assert_eq!(reg.get(again).unwrap().size, Vec2::ZERO);
    }

    #[test]
    fn unknown_handles_are_errors() {
        let mut reg = VisualRegistry::new();
        let h = reg.create();
        reg.destroy(h).unwrap();

        assert_eq!(reg.get(h), Err(RenderError::UnknownHandle(h)));
        assert!(reg.get_mut(Handle::from_raw(42)).is_err());
        assert_eq!(reg.destroy(h), Err(RenderError::UnknownHandle(h)));
        // A failed destroy must not push the handle into the free pool twice.
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn iter_skips_freed_slots() {
        let mut reg = VisualRegistry::new();
        let a = reg.create();
        let b = reg.create();
        let c = reg.create();
        reg.destroy(b).unwrap();

        let live: Vec<_> = reg.iter().map(|(h, _)| h).collect();
        assert_eq!(live, vec![a, c]);
    }

    #[test]
    fn corners_follow_transform() {
        let mut v = Visual { size: Vec2::new(4.0, 2.0), ..Default::default() };
        v.set_transform(Vec2::new(100.0, 50.0), 0.0, Vec2::splat(2.0));

        let c = v.corners();
        assert!(close(c[0], Vec2::new(96.0, 48.0)));
        assert!(close(c[2], Vec2::new(104.0, 52.0)));
    }
}
