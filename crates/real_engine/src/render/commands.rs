//! Draw commands

use crate::foundation::color::Color;
use crate::foundation::math::Vec2;
use crate::tree::{NodeId, NodeTree};

/// Backend-agnostic drawing instruction
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// One character in a cell grid
    Glyph {
        /// Cell column and row
        cell: (i32, i32),
        /// Character to show
        character: char,
        /// Foreground color
        color: Color,
    },

    /// A run of text
    Text {
        /// Top-left anchor
        position: Vec2,
        /// Text to show
        text: String,
        /// Text color
        color: Color,
        /// Font size in points
        size: f64,
        /// Rotation in radians around the anchor
        rotation: f64,
    },

    /// A filled circle
    Circle {
        /// Center
        center: Vec2,
        /// Radius
        radius: f64,
        /// Fill color
        color: Color,
    },
}

/// Ordered list of draw commands for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Commands in submission order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the commands
    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Something a backend can draw
pub trait Renderable {
    /// Append this node's draw commands
    fn draw(&self, out: &mut DrawList);
}

/// Gather draw commands from every renderable below `window`, in pre-order
pub fn collect_draw_list(tree: &NodeTree, window: NodeId) -> DrawList {
    let mut list = DrawList::new();
    for id in tree.traverse(window, false) {
        if let Some(renderable) = tree.behavior_dyn(id).and_then(|behavior| behavior.renderable()) {
            renderable.draw(&mut list);
        }
    }
    list
}
