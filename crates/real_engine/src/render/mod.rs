//! # Rendering Interfaces
//!
//! The engine does not draw. Nodes that have something to show implement
//! [`Renderable`] and emit backend-agnostic [`DrawCommand`]s; a
//! [`WindowBackend`] collects them once per update pass and turns them into
//! whatever its output is (a terminal grid, a GPU frame, nothing at all).
//!
//! [`HeadlessBackend`] is the built-in backend. It keeps the last frame's
//! draw list and the input state so tests and tools can drive a window
//! without a display.

mod backend;
mod commands;
mod headless;

pub use backend::{WindowBackend, WindowSettings};
pub use commands::{collect_draw_list, DrawCommand, DrawList, Renderable};
pub use headless::HeadlessBackend;
