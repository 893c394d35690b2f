use crate::paint::Color;

use super::error::{RenderError, RenderResult};

/// Largest vertex count addressable by the 16-bit shared index buffer.
pub const MAX_INDEXABLE_VERTICES: u32 = 1 << 16;

/// Rendering core configuration.
///
/// `max_vertices` bounds one flush; the GPU vertex buffer holds
/// `max_vertices * max_batches` vertices per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Vertices per flush. Must be a non-zero multiple of 4.
    pub max_vertices: u32,

    /// Flushes that fit in the per-frame vertex buffer.
    pub max_batches: u32,

    /// Default segment count for [`RenderingServer::draw_circle`](super::RenderingServer::draw_circle).
    pub circle_segments: u32,

    /// Default line thickness in world units.
    pub line_thickness: f32,

    /// Clear color applied at the start of each frame's pass.
    pub clear_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_vertices: 10_000,
            max_batches: 20,
            circle_segments: 32,
            line_thickness: 1.0,
            clear_color: Color::rgb(0.1, 0.1, 0.1),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.max_vertices == 0 || self.max_vertices % 4 != 0 {
            return Err(RenderError::InvalidConfig("max_vertices must be a non-zero multiple of 4"));
        }
        if self.max_vertices > MAX_INDEXABLE_VERTICES {
            return Err(RenderError::InvalidConfig("max_vertices exceeds the 16-bit index range"));
        }
        if self.max_batches == 0 {
            return Err(RenderError::InvalidConfig("max_batches must be non-zero"));
        }
        Ok(())
    }

    /// Quads per flush.
    #[inline]
    pub fn max_quads(&self) -> u32 {
        self.max_vertices / 4
    }

    /// Vertex capacity of the whole per-frame GPU buffer.
    #[inline]
    pub fn frame_vertex_capacity(&self) -> u64 {
        self.max_vertices as u64 * self.max_batches as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = RenderConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.max_quads(), 2_500);
        assert_eq!(cfg.frame_vertex_capacity(), 200_000);
    }

    #[test]
    fn rejects_bad_vertex_counts() {
        for bad in [0, 6, MAX_INDEXABLE_VERTICES + 4] {
            let cfg = RenderConfig { max_vertices: bad, ..Default::default() };
            assert!(matches!(cfg.validate(), Err(RenderError::InvalidConfig(_))), "{bad}");
        }
    }

    #[test]
    fn rejects_zero_batches() {
        let cfg = RenderConfig { max_batches: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
