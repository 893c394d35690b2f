//! Lux engine crate.
//!
//! Platform runtime, GPU device management and the batched 2D rendering core.

pub mod core;
pub mod device;
pub mod input;
pub mod time;
pub mod window;

pub mod logging;
pub mod paint;
pub mod render;
