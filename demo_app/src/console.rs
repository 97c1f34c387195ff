//! Text-terminal window backend
//!
//! Draws glyphs, text and circles into a character grid printed to stdout
//! after every update. Keys come from a stdin reader thread: each typed
//! character is sent as a tap when its line is entered, and the words
//! `esc` or `quit` send Escape.

use std::io::{self, BufRead, Write};
use std::thread;

use real_engine::foundation::math::Vec2;
use real_engine::input::{InputSender, InputState, Key};
use real_engine::node::HookError;
use real_engine::registry::{Extension, ModuleRegistrar, ObjectType, RegistryError};
use real_engine::render::{collect_draw_list, DrawCommand, DrawList, WindowBackend, WindowSettings};
use real_engine::tree::{NodeId, NodeTree};

/// Cell used to fill circles
const CIRCLE_FILL: char = 'o';

/// Module that provides the `Console` backend object type
pub struct ConsoleModule;

impl Extension for ConsoleModule {
    fn name(&self) -> &str {
        "console"
    }

    fn register(&self, registrar: &mut ModuleRegistrar<'_>) -> Result<(), RegistryError> {
        registrar.object(ObjectType::new(ConsoleBackend::TYPE_NAME, || {
            Box::new(ConsoleBackend::default()) as Box<dyn WindowBackend>
        }))?;
        Ok(())
    }
}

/// Window backend that prints a character grid
#[derive(Debug, Default)]
pub struct ConsoleBackend {
    input: InputState,
    reader_started: bool,
}

impl ConsoleBackend {
    /// Registered object type name
    pub const TYPE_NAME: &'static str = "Console";
}

impl WindowBackend for ConsoleBackend {
    fn init(&mut self, settings: &WindowSettings) -> Result<(), HookError> {
        log::info!("Console window '{}' ({}x{})", settings.title, settings.width, settings.height);
        if !self.reader_started {
            spawn_stdin_reader(self.input.sender()).map_err(|e| HookError::Backend(e.to_string()))?;
            self.reader_started = true;
        }
        Ok(())
    }

    fn update(&mut self, _delta: f64) -> Result<(), HookError> {
        self.input.begin_update();
        Ok(())
    }

    fn tick(&mut self, _delta: f64) -> Result<(), HookError> {
        self.input.begin_tick();
        Ok(())
    }

    fn render(&mut self, tree: &NodeTree, window: NodeId, settings: &WindowSettings) -> Result<(), HookError> {
        let rows = compose(&collect_draw_list(tree, window), settings.width, settings.height);

        let mut out = io::stdout().lock();
        let written = writeln!(out, "\x1b[H\x1b[2J{}", settings.title)
            .and_then(|()| rows.iter().try_for_each(|row| writeln!(out, "{row}")))
            .and_then(|()| out.flush());
        written.map_err(|e| HookError::Backend(format!("console write failed: {e}")))
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

    fn input_sender(&self) -> Option<InputSender> {
        Some(self.input.sender())
    }
}

fn spawn_stdin_reader(sender: InputSender) -> io::Result<()> {
    thread::Builder::new().name("stdin-input".to_string()).spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => send_line(&sender, &line),
                Err(err) => {
                    log::warn!("Stopped reading input: {err}");
                    return;
                }
            }
        }
        log::debug!("Input closed");
    })?;
    Ok(())
}

fn send_line(sender: &InputSender, line: &str) {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("esc") || trimmed.eq_ignore_ascii_case("quit") {
        sender.tap(Key::Escape);
        return;
    }
    if trimmed.is_empty() {
        sender.tap(Key::Enter);
        return;
    }
    trimmed.chars().filter_map(Key::from_char).for_each(|key| sender.tap(key));
}

fn compose(list: &DrawList, width: u32, height: u32) -> Vec<String> {
    let width = width as usize;
    let height = height as usize;
    let mut grid = vec![vec![' '; width]; height];

    let mut put = |x: i64, y: i64, c: char| {
        if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) {
            if x < width && y < height {
                grid[y][x] = c;
            }
        }
    };

    for command in list {
        match command {
            DrawCommand::Glyph { cell, character, .. } => put(i64::from(cell.0), i64::from(cell.1), *character),
            DrawCommand::Text { position, text, .. } => {
                let (x, y) = cell_of(*position);
                for (offset, c) in (0_i64..).zip(text.chars()) {
                    put(x + offset, y, c);
                }
            }
            DrawCommand::Circle { center, radius, .. } => {
                let (cx, cy) = cell_of(*center);
                let reach = cell_of(Vec2::new(*radius, 0.0)).0;
                for dy in -reach..=reach {
                    for dx in -reach..=reach {
                        if ((dx * dx + dy * dy) as f64).sqrt() <= *radius {
                            put(cx + dx, cy + dy, CIRCLE_FILL);
                        }
                    }
                }
            }
        }
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(position: Vec2) -> (i64, i64) {
    (position.x.round() as i64, position.y.round() as i64)
}
