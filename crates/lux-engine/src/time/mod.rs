//! Frame timing.
//!
//! - one `FrameClock` per loop; call `tick()` once per presented frame
//! - `FixedTimestep` turns the clamped frame delta into whole simulation steps

mod fixed_step;
mod frame_clock;

pub use fixed_step::{FixedStep, FixedTimestep};
pub use frame_clock::{FrameClock, FrameTime};
