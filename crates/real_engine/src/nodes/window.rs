//! Window node

use crate::foundation::color::Color;
use crate::foundation::math::Vec2;
use crate::input::{InputSender, Key};
use crate::node::{Behavior, HookResult, NodeContext};
use crate::registry::{NodeType, ValueKind};
use crate::render::{HeadlessBackend, WindowBackend, WindowSettings};

/// Node that owns a window backend
///
/// While live the window drives its backend: `update` and `render` on every
/// update pass, `tick` on every tick pass. Descendants read input through
/// [`NodeContext::window`]; [`Window::is_just_pressed`] answers for the pass
/// that is currently running.
pub struct Window {
    settings: WindowSettings,
    quit_on_close: bool,
    is_ticking: bool,
    backend: Box<dyn WindowBackend>,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("settings", &self.settings)
            .field("quit_on_close", &self.quit_on_close)
            .field("is_ticking", &self.is_ticking)
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "Window";

    /// Create a window around `backend`
    pub fn new(backend: Box<dyn WindowBackend>) -> Self {
        Self {
            settings: WindowSettings::default(),
            quit_on_close: true,
            is_ticking: false,
            backend,
        }
    }

    /// Create a window with a [`HeadlessBackend`]
    pub fn headless() -> Self {
        Self::new(Box::new(HeadlessBackend::new()))
    }

    /// Type metadata
    pub fn node_type() -> NodeType {
        NodeType::builder::<Self>(Self::TYPE_NAME)
            .param_with_default("backend", ValueKind::Object, "new::Headless")
            .property("width", ValueKind::Int, |window, arg| {
                window.settings.width = dimension(arg.into_int()?);
                Ok(())
            })
            .property("height", ValueKind::Int, |window, arg| {
                window.settings.height = dimension(arg.into_int()?);
                Ok(())
            })
            .property("title", ValueKind::String, |window, arg| {
                window.settings.title = arg.into_string()?;
                Ok(())
            })
            .property("background_colour", ValueKind::Color, |window, arg| {
                window.settings.background = arg.into_color()?;
                Ok(())
            })
            .property("quit_on_close", ValueKind::Bool, |window, arg| {
                window.quit_on_close = arg.into_bool()?;
                Ok(())
            })
            .build(|args| Ok(Self::new(args.object::<Box<dyn WindowBackend>>("backend")?)))
    }

    /// Current settings
    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    /// Change the title; takes effect on the next init
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.settings.title = title.into();
    }

    /// Change the size; takes effect on the next init
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.settings.width = width;
        self.settings.height = height;
    }

    /// Change the clear color
    pub fn set_background(&mut self, color: Color) {
        self.settings.background = color;
    }

    /// Whether a close request stops the engine
    pub fn quit_on_close(&self) -> bool {
        self.quit_on_close
    }

    /// Whether the most recent pass was a tick pass
    pub fn is_ticking(&self) -> bool {
        self.is_ticking
    }

    /// The backend
    pub fn backend(&self) -> &dyn WindowBackend {
        self.backend.as_ref()
    }

    /// The backend, if it is a `T`
    pub fn backend_as<T: WindowBackend>(&self) -> Option<&T> {
        self.backend.as_ref().as_any().downcast_ref::<T>()
    }

    /// The backend, mutably, if it is a `T`
    pub fn backend_as_mut<T: WindowBackend>(&mut self) -> Option<&mut T> {
        self.backend.as_mut().as_any_mut().downcast_mut::<T>()
    }

    /// Handle for feeding input to the backend
    pub fn input_sender(&self) -> Option<InputSender> {
        self.backend.input_sender()
    }

    /// Key is held
    pub fn is_pressed(&self, key: Key) -> bool {
        self.backend.is_pressed(key)
    }

    /// Key went down since the previous update, or during the updates
    /// leading up to this tick when called from a tick
    pub fn is_just_pressed(&self, key: Key) -> bool {
        if self.is_ticking {
            self.backend.is_just_pressed_this_tick(key)
        } else {
            self.backend.is_just_pressed_this_update(key)
        }
    }

    /// Pointer position
    pub fn mouse_position(&self) -> Vec2 {
        self.backend.mouse_position()
    }
}

fn dimension(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl Behavior for Window {
    fn on_ready(&mut self, ctx: &NodeContext<'_>) -> HookResult {
        log::info!(
            "Opening window '{}' ({}x{}) for node '{}'",
            self.settings.title,
            self.settings.width,
            self.settings.height,
            ctx.name()
        );
        self.backend.init(&self.settings)
    }

    fn on_leave(&mut self, _ctx: &NodeContext<'_>) -> HookResult {
        self.backend.stop();
        Ok(())
    }

    fn on_update(&mut self, ctx: &NodeContext<'_>, delta: f64) -> HookResult {
        self.is_ticking = false;
        self.backend.update(delta)?;
        self.backend.render(ctx.tree(), ctx.id(), &self.settings)?;

        if self.quit_on_close && self.backend.should_close() {
            log::info!("Window '{}' closed, quitting", self.settings.title);
            ctx.quit();
        }
        Ok(())
    }

    fn on_tick(&mut self, _ctx: &NodeContext<'_>, delta: f64) -> HookResult {
        self.is_ticking = true;
        self.backend.tick(delta)
    }
}

impl From<HeadlessBackend> for Window {
    fn from(backend: HeadlessBackend) -> Self {
        Self::new(Box::new(backend))
    }
}
