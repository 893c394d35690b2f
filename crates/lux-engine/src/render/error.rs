use thiserror::Error;

use super::{Handle, TextureId};

/// Errors surfaced by the rendering core.
///
/// Drawing calls never return these for frame-local problems (overflow, invalid
/// textures, degenerate geometry); those are logged and skipped. They surface
/// from lookups and resource creation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("no visual registered for handle {0}")]
    UnknownHandle(Handle),

    #[error("vertex buffer overflow: {requested} bytes requested, {available} available")]
    BufferOverflow { requested: u64, available: u64 },

    #[error("texture {0} is not registered with the backend")]
    UnknownTexture(TextureId),

    #[error("texture data has {actual} bytes, expected {expected}")]
    InvalidTextureData { expected: usize, actual: usize },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    EmptyTexture { width: u32, height: u32 },

    #[error("texture {width}x{height} exceeds the device limit of {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("invalid render config: {0}")]
    InvalidConfig(&'static str),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
