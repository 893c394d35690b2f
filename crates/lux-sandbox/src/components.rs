use glam::Vec2;
use lux_engine::render::{Handle, TextureRef};

/// World position, y-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Position(pub Vec2);

/// Radians, counter-clockwise.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation(pub f32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Scale(pub Vec2);

/// World units per second. Bodies read it once when attached and have it
/// written back after every physics step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Velocity(pub Vec2);

/// Starting angular velocity of a body, radians per second.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spin(pub f32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    pub size: Vec2,
    pub texture: TextureRef,
}

/// Rendering-server visual owned by this entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VisualHandle(pub Handle);
