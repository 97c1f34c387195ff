//! Window backend abstraction

use crate::foundation::color::Color;
use crate::foundation::math::Vec2;
use crate::input::{InputSender, Key};
use crate::node::{AsAny, HookError};
use crate::tree::{NodeId, NodeTree};

/// Window parameters handed to a backend on init and render
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    /// Width in pixels or cells
    pub width: u32,
    /// Height in pixels or cells
    pub height: u32,
    /// Window title
    pub title: String,
    /// Clear color
    pub background: Color,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            title: "Window".to_string(),
            background: Color::BLACK,
        }
    }
}

/// Output and input device behind a window node
///
/// The owning window calls [`init`](Self::init) when it becomes live,
/// [`stop`](Self::stop) when it is detached, [`update`](Self::update) and
/// [`render`](Self::render) once per update pass and [`tick`](Self::tick)
/// once per tick pass.
pub trait WindowBackend: AsAny {
    /// Open the output
    fn init(&mut self, settings: &WindowSettings) -> Result<(), HookError>;

    /// Close the output
    fn stop(&mut self) {}

    /// Start an update pass; input sampled since the last update becomes visible
    fn update(&mut self, _delta: f64) -> Result<(), HookError> {
        Ok(())
    }

    /// Start a tick pass
    fn tick(&mut self, _delta: f64) -> Result<(), HookError> {
        Ok(())
    }

    /// Draw the renderables below `window`
    fn render(&mut self, tree: &NodeTree, window: NodeId, settings: &WindowSettings) -> Result<(), HookError>;

    /// Key is held
    fn is_pressed(&self, key: Key) -> bool;

    /// Key went down since the previous update
    fn is_just_pressed_this_update(&self, key: Key) -> bool;

    /// Key went down during the updates leading up to this tick
    fn is_just_pressed_this_tick(&self, key: Key) -> bool;

    /// Pointer position
    fn mouse_position(&self) -> Vec2;

    /// The user asked to close the window
    fn should_close(&self) -> bool {
        false
    }

    /// Handle for feeding input from another thread
    fn input_sender(&self) -> Option<InputSender> {
        None
    }
}
