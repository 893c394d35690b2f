use winit::event::WindowEvent;

use crate::input::InputState;
use crate::time::FixedStep;

use super::ctx::{FrameCtx, StartCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by [`Runtime`](crate::window::Runtime).
///
/// Per presented frame: zero or more `on_fixed_update` calls, then one
/// `on_frame`.
pub trait App {
    /// Called once the window and GPU exist, before the first frame.
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> anyhow::Result<()>;

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    fn on_fixed_update(&mut self, step: FixedStep, input: &InputState) {
        let _ = (step, input);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
