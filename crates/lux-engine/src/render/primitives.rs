//! Decomposition of debug-draw primitives into quads.
//!
//! Every primitive becomes one or more four-corner quads so the sprite batch
//! pipeline draws lines, rectangles and circles too.

use std::f32::consts::TAU;

use glam::{Mat2, Vec2};

/// Lines shorter than this produce no geometry.
pub const MIN_LINE_LENGTH: f32 = 1.0e-4;

/// Oriented quad covering the segment `p1 -> p2` with the given thickness.
///
/// Returns `None` for degenerate segments.
pub fn line_quad(p1: Vec2, p2: Vec2, thickness: f32) -> Option<[Vec2; 4]> {
    let dir = p2 - p1;
    let length = dir.length();
    if length < MIN_LINE_LENGTH || !length.is_finite() {
        return None;
    }

    let normal = Vec2::new(-dir.y, dir.x) / length;
    let offset = normal * (thickness * 0.5);

    Some([p1 - offset, p2 - offset, p2 + offset, p1 + offset])
}

/// Rotates `points` by `rotation` radians about the origin, then translates by `position`.
pub fn rotate_translate(points: [Vec2; 4], position: Vec2, rotation: f32) -> [Vec2; 4] {
    let rot = Mat2::from_angle(rotation);
    points.map(|p| position + rot * p)
}

/// Corners of a `size` rectangle centred on `center`, rotated by `rotation` radians.
///
/// Order: bottom-left, bottom-right, top-right, top-left (before rotation).
pub fn rect_corners(center: Vec2, rotation: f32, size: Vec2) -> [Vec2; 4] {
    let h = size * 0.5;
    let local = [
        Vec2::new(-h.x, -h.y),
        Vec2::new(h.x, -h.y),
        Vec2::new(h.x, h.y),
        Vec2::new(-h.x, h.y),
    ];
    rotate_translate(local, center, rotation)
}

/// Closed outline edges `(a, b)` of a quad, in corner order.
pub fn outline_edges(corners: [Vec2; 4]) -> [(Vec2, Vec2); 4] {
    [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ]
}

/// Chords of an N-gon approximating a circle.
///
/// `segments == 0` yields nothing; fewer than 3 segments are raised to 3.
pub fn circle_segments(
    center: Vec2,
    radius: f32,
    segments: u32,
) -> impl Iterator<Item = (Vec2, Vec2)> {
    let n = if segments == 0 { 0 } else { segments.max(3) };
    let step = if n == 0 { 0.0 } else { TAU / n as f32 };

    (0..n).map(move |i| {
        let a1 = i as f32 * step;
        let a2 = (i + 1) as f32 * step;
        (
            center + Vec2::from_angle(a1) * radius,
            center + Vec2::from_angle(a2) * radius,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn degenerate_line_has_no_quad() {
        let p = Vec2::new(3.0, 4.0);
        assert!(line_quad(p, p, 2.0).is_none());
        assert!(line_quad(p, p + Vec2::splat(1e-6), 2.0).is_none());
    }

    #[test]
    fn horizontal_line_offsets_vertically() {
        let q = line_quad(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0).unwrap();
        assert!(close(q[0], Vec2::new(0.0, -1.0)));
        assert!(close(q[1], Vec2::new(10.0, -1.0)));
        assert!(close(q[2], Vec2::new(10.0, 1.0)));
        assert!(close(q[3], Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn unrotated_rect_corners() {
        let c = rect_corners(Vec2::new(10.0, 20.0), 0.0, Vec2::new(4.0, 2.0));
        assert!(close(c[0], Vec2::new(8.0, 19.0)));
        assert!(close(c[2], Vec2::new(12.0, 21.0)));
    }

    #[test]
    fn quarter_turn_rect_swaps_extent() {
        let c = rect_corners(Vec2::ZERO, std::f32::consts::FRAC_PI_2, Vec2::new(4.0, 2.0));
        // (-2, -1) rotated 90° CCW is (1, -2).
        assert!(close(c[0], Vec2::new(1.0, -2.0)));
    }

    #[test]
    fn circle_closes_on_itself() {
        let segs: Vec<_> = circle_segments(Vec2::new(5.0, 5.0), 3.0, 32).collect();
        assert_eq!(segs.len(), 32);
        assert!(close(segs[0].0, Vec2::new(8.0, 5.0)));
        assert!(close(segs[31].1, segs[0].0));
        for w in segs.windows(2) {
            assert!(close(w[0].1, w[1].0));
        }
    }

    #[test]
    fn circle_segment_count_edges() {
        assert_eq!(circle_segments(Vec2::ZERO, 1.0, 0).count(), 0);
        assert_eq!(circle_segments(Vec2::ZERO, 1.0, 1).count(), 3);
    }

    #[test]
    fn outline_is_closed() {
        let c = rect_corners(Vec2::ZERO, 0.3, Vec2::ONE);
        let e = outline_edges(c);
        assert_eq!(e[3].1, e[0].0);
    }
}
