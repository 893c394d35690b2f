use core::fmt;

/// Backend-assigned texture identity.
///
/// `TextureId::NULL` (zero) never names a live texture; visuals that still carry
/// it are skipped at draw time.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NULL: TextureId = TextureId(0);

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex{}", self.0)
    }
}

/// Ready-made texture reference handed to the rendering core.
///
/// Loading pixels into a GPU image is done by the caller (see
/// [`WgpuBackend::create_texture_rgba8`](crate::render::WgpuBackend::create_texture_rgba8)).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct TextureRef {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureRef {
    #[inline]
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.id.is_null()
    }
}

/// Monotonic id source for textures. Ids start at 1 so zero stays reserved.
#[derive(Debug)]
pub(crate) struct TextureIdSource {
    next: u32,
}

impl Default for TextureIdSource {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TextureIdSource {
    pub(crate) fn next(&mut self) -> TextureId {
        let id = TextureId(self.next);
        self.next = self.next.wrapping_add(1).max(1);
        id
    }
}

/// 1×1 opaque white pixel used for untextured geometry.
pub(crate) const WHITE_PIXEL: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Byte length of a tightly packed `width` x `height` RGBA8 image.
pub(crate) fn expected_rgba8_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}
