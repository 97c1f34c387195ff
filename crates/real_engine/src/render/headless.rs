//! Backend that draws nothing

use crate::foundation::math::Vec2;
use crate::input::{InputSender, InputState, Key};
use crate::node::HookError;
use crate::tree::{NodeId, NodeTree};

use super::{collect_draw_list, DrawList, WindowBackend, WindowSettings};

/// Window backend without output
///
/// Records what would have been drawn and takes input through its
/// [`InputSender`].
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    settings: Option<WindowSettings>,
    input: InputState,
    last_frame: DrawList,
    frames_rendered: u64,
    ticks: u64,
    close_requested: bool,
}

impl HeadlessBackend {
    /// Registered object type name
    pub const TYPE_NAME: &'static str = "Headless";

    /// Create a stopped backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings from the last `init`, while running
    pub fn settings(&self) -> Option<&WindowSettings> {
        self.settings.as_ref()
    }

    /// Whether `init` ran and `stop` did not
    pub fn is_running(&self) -> bool {
        self.settings.is_some()
    }

    /// Draw list of the most recent frame
    pub fn last_frame(&self) -> &DrawList {
        &self.last_frame
    }

    /// Frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Ticks seen so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Report a close request from the next update on
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }
}

impl WindowBackend for HeadlessBackend {
    fn init(&mut self, settings: &WindowSettings) -> Result<(), HookError> {
        log::debug!("Headless window '{}' ({}x{}) started", settings.title, settings.width, settings.height);
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(settings) = self.settings.take() {
            log::debug!("Headless window '{}' stopped", settings.title);
        }
    }

    fn update(&mut self, _delta: f64) -> Result<(), HookError> {
        self.input.begin_update();
        Ok(())
    }

    fn tick(&mut self, _delta: f64) -> Result<(), HookError> {
        self.input.begin_tick();
        self.ticks += 1;
        Ok(())
    }

    fn render(&mut self, tree: &NodeTree, window: NodeId, _settings: &WindowSettings) -> Result<(), HookError> {
        self.last_frame = collect_draw_list(tree, window);
        self.frames_rendered += 1;
        Ok(())
    }

    fn is_pressed(&self, key: Key) -> bool {
        self.input.is_pressed(key)
    }

    fn is_just_pressed_this_update(&self, key: Key) -> bool {
        self.input.is_just_pressed_this_update(key)
    }

    fn is_just_pressed_this_tick(&self, key: Key) -> bool {
        self.input.is_just_pressed_this_tick(key)
    }

    fn mouse_position(&self) -> Vec2 {
        self.input.mouse_position()
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn input_sender(&self) -> Option<InputSender> {
        Some(self.input.sender())
    }
}
