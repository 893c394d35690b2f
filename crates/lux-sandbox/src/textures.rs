//! Procedural sprite images, so the sandbox runs without asset files.

use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

/// `size` x `size` checkerboard with square cells of `cell` pixels.
pub fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> RgbaImage {
    let cell = cell.max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 { Rgba(a) } else { Rgba(b) }
    })
}

/// Filled circle on a transparent background with a one-pixel soft edge.
pub fn disc(size: u32, color: [u8; 3]) -> RgbaImage {
    let r = size as f32 * 0.5;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        let coverage = (r - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
        Rgba([color[0], color[1], color[2], (coverage * 255.0).round() as u8])
    })
}

/// Decodes a PNG from disk into RGBA8.
pub fn load(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("failed to load {}", path.display()))?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: [u8; 4] = [255, 255, 255, 255];
    const K: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn checkerboard_alternates_cells() {
        let img = checkerboard(8, 4, W, K);
        assert_eq!(img.get_pixel(0, 0).0, W);
        assert_eq!(img.get_pixel(4, 0).0, K);
        assert_eq!(img.get_pixel(4, 4).0, W);
        assert_eq!(img.as_raw().len(), 8 * 8 * 4);
    }

    #[test]
    fn disc_is_opaque_inside_and_clear_at_corners() {
        let img = disc(16, [200, 10, 10]);
        assert_eq!(img.get_pixel(8, 8).0[3], 255);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load(Path::new("definitely/not/here.png")).is_err());
    }
}
