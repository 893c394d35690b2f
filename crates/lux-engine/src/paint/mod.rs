//! Paint model shared by the renderer and callers.
//!
//! Colors are straight (non-premultiplied) RGBA; the sprite pipeline blends with
//! `SrcAlpha / OneMinusSrcAlpha`.

pub mod color;

pub use color::Color;
