//! Batched 2D sprite rendering.
//!
//! Every drawable is a textured, tinted quad. Quads are queued host-side and
//! flushed as one indexed draw per run of same-texture quads.
//!
//! Convention:
//! - World space is y-up; the camera position maps to the viewport centre.
//! - Screen space is in pixels with a top-left origin, +Y down.
//! - Quad corners are pushed with UVs (0,0), (1,0), (1,1), (0,1).

mod backend;
mod batch;
mod camera;
mod config;
mod ctx;
mod error;
mod gpu;
mod handle;
pub mod primitives;
mod server;
mod texture;
mod vertex;
mod visual;

pub use backend::{DrawCall, HeadlessBackend, RenderBackend};
pub use batch::{FrameStats, QuadBatcher};
pub use camera::Camera;
pub use config::{RenderConfig, MAX_INDEXABLE_VERTICES};
pub use ctx::{RenderCtx, RenderTarget};
pub use error::{RenderError, RenderResult};
pub use gpu::WgpuBackend;
pub use handle::{Handle, HandleAllocator};
pub use server::RenderingServer;
pub use texture::{TextureId, TextureRef};
pub use vertex::{quad_indices, Vertex, QUAD_UVS};
pub use visual::{Visual, VisualRegistry};
