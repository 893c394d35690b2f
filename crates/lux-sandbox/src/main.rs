//! Lux sandbox: sprites bouncing as rigid bodies, debug shapes and a pannable
//! camera.
//!
//! Controls: WASD/arrows pan, wheel zooms, right-drag draws a line,
//! Space spawns 100 sprites, Backspace removes 100, G toggles gravity,
//! F kicks every sprite upward, P toggles physics debug draw, 0 resets the
//! camera, Escape quits.
//!
//! Usage: `lux-sandbox [sprite-count] [image.png]`

mod components;
mod game;
mod physics;
mod systems;
mod textures;

use std::path::PathBuf;

use anyhow::{Context, Result};
use lux_engine::device::GpuInit;
use lux_engine::logging::{init_logging, LoggingConfig};
use lux_engine::window::{Runtime, RuntimeConfig};

use game::{Options, Sandbox};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let sprites = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid sprite count {n:?}"))?,
        None => 500,
    };
    let image = args.next().map(PathBuf::from);

    let options = Options { sprites, seed: 7, image };
    let config = RuntimeConfig {
        title: "lux sandbox".to_string(),
        ..Default::default()
    };

    Runtime::run(config, GpuInit::default(), Sandbox::new(options))
}
