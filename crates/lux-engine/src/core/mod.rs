//! Contracts between the runtime loop and the application.
//!
//! The application sees the window, GPU and input only through the contexts
//! defined here.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, StartCtx};
