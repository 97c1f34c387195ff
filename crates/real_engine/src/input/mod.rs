//! Input handling
//!
//! Keys and pointer events arrive from a sampling thread through an
//! [`InputSender`]. [`InputState`] turns them into per-update and per-tick
//! views:
//!
//! - an update sees the keys pressed since the previous update
//! - a tick sees every key first pressed during the updates since the
//!   previous tick, so a press is never lost when several updates run
//!   between two ticks

use std::collections::HashSet;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};

use crate::foundation::math::Vec2;

/// Keyboard keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// 0 key on the main row
    Digit0,
    /// 1 key on the main row
    Digit1,
    /// 2 key on the main row
    Digit2,
    /// 3 key on the main row
    Digit3,
    /// 4 key on the main row
    Digit4,
    /// 5 key on the main row
    Digit5,
    /// 6 key on the main row
    Digit6,
    /// 7 key on the main row
    Digit7,
    /// 8 key on the main row
    Digit8,
    /// 9 key on the main row
    Digit9,
    /// F1 key
    F1,
    /// F2 key
    F2,
    /// F3 key
    F3,
    /// F4 key
    F4,
    /// F5 key
    F5,
    /// F6 key
    F6,
    /// F7 key
    F7,
    /// F8 key
    F8,
    /// F9 key
    F9,
    /// F10 key
    F10,
    /// F11 key
    F11,
    /// F12 key
    F12,
    /// Escape key
    Escape,
    /// Tab key
    Tab,
    /// Caps Lock key
    CapsLock,
    /// Space bar
    Space,
    /// Enter key
    Enter,
    /// Backspace key
    Backspace,
    /// Insert key
    Insert,
    /// Delete key
    Delete,
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Numpad 0
    Numpad0,
    /// Numpad 1
    Numpad1,
    /// Numpad 2
    Numpad2,
    /// Numpad 3
    Numpad3,
    /// Numpad 4
    Numpad4,
    /// Numpad 5
    Numpad5,
    /// Numpad 6
    Numpad6,
    /// Numpad 7
    Numpad7,
    /// Numpad 8
    Numpad8,
    /// Numpad 9
    Numpad9,
    /// Num Lock key
    NumLock,
    /// Print Screen key
    PrintScreen,
    /// Scroll Lock key
    ScrollLock,
    /// Pause key
    Pause,
    /// Left Shift
    LeftShift,
    /// Right Shift
    RightShift,
    /// Left Control
    LeftControl,
    /// Right Control
    RightControl,
    /// Left Alt
    LeftAlt,
    /// Right Alt
    RightAlt,
    /// Menu key
    Menu,
    /// Super (Windows/Command) key
    Super,
}

impl Key {
    /// Key typed by a character, ignoring case
    pub fn from_char(c: char) -> Option<Self> {
        let key = match c.to_ascii_lowercase() {
            'a' => Self::A,
            'b' => Self::B,
            'c' => Self::C,
            'd' => Self::D,
            'e' => Self::E,
            'f' => Self::F,
            'g' => Self::G,
            'h' => Self::H,
            'i' => Self::I,
            'j' => Self::J,
            'k' => Self::K,
            'l' => Self::L,
            'm' => Self::M,
            'n' => Self::N,
            'o' => Self::O,
            'p' => Self::P,
            'q' => Self::Q,
            'r' => Self::R,
            's' => Self::S,
            't' => Self::T,
            'u' => Self::U,
            'v' => Self::V,
            'w' => Self::W,
            'x' => Self::X,
            'y' => Self::Y,
            'z' => Self::Z,
            '0' => Self::Digit0,
            '1' => Self::Digit1,
            '2' => Self::Digit2,
            '3' => Self::Digit3,
            '4' => Self::Digit4,
            '5' => Self::Digit5,
            '6' => Self::Digit6,
            '7' => Self::Digit7,
            '8' => Self::Digit8,
            '9' => Self::Digit9,
            ' ' => Self::Space,
            '\n' | '\r' => Self::Enter,
            '\t' => Self::Tab,
            '\u{1b}' => Self::Escape,
            '\u{8}' | '\u{7f}' => Self::Backspace,
            _ => return None,
        };
        Some(key)
    }
}

/// Raw event pushed by an input producer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key went down and stays held until [`InputEvent::KeyUp`]
    KeyDown(Key),
    /// Key was released
    KeyUp(Key),
    /// Key pressed and released between two samples
    Tap(Key),
    /// Pointer moved to a position in window cells or pixels
    MouseMoved(Vec2),
}

type Pending = Arc<Mutex<Vec<InputEvent>>>;

/// Cloneable producer handle, usable from any thread
#[derive(Debug, Clone, Default)]
pub struct InputSender {
    pending: Pending,
}

impl InputSender {
    /// Queue an event for the next update
    pub fn send(&self, event: InputEvent) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Queue a key tap
    pub fn tap(&self, key: Key) {
        self.send(InputEvent::Tap(key));
    }

    fn drain(&self) -> Vec<InputEvent> {
        mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Consumer side of the input hand-off
#[derive(Debug, Default)]
pub struct InputState {
    sender: InputSender,
    held: HashSet<Key>,
    tapped: HashSet<Key>,
    just_pressed_update: HashSet<Key>,
    pending_tick: HashSet<Key>,
    just_pressed_tick: HashSet<Key>,
    mouse: Vec2,
}

impl InputState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer handle feeding this state
    pub fn sender(&self) -> InputSender {
        self.sender.clone()
    }

    /// Take the events queued since the previous update
    pub fn begin_update(&mut self) {
        self.tapped.clear();
        self.just_pressed_update.clear();

        for event in self.sender.drain() {
            match event {
                InputEvent::KeyDown(key) => {
                    if self.held.insert(key) {
                        self.press(key);
                    }
                }
                InputEvent::KeyUp(key) => {
                    self.held.remove(&key);
                }
                InputEvent::Tap(key) => {
                    self.tapped.insert(key);
                    self.press(key);
                }
                InputEvent::MouseMoved(position) => self.mouse = position,
            }
        }
    }

    /// Hand the presses collected since the previous tick to this tick
    pub fn begin_tick(&mut self) {
        self.just_pressed_tick = mem::take(&mut self.pending_tick);
    }

    fn press(&mut self, key: Key) {
        self.just_pressed_update.insert(key);
        self.pending_tick.insert(key);
    }

    /// Key is held, or was tapped since the previous update
    pub fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(&key) || self.tapped.contains(&key)
    }

    /// Key went down since the previous update
    pub fn is_just_pressed_this_update(&self, key: Key) -> bool {
        self.just_pressed_update.contains(&key)
    }

    /// Key went down during the updates leading up to this tick
    pub fn is_just_pressed_this_tick(&self, key: Key) -> bool {
        self.just_pressed_tick.contains(&key)
    }

    /// Last reported pointer position
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse
    }
}
