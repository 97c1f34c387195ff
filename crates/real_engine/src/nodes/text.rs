//! Text label

use crate::foundation::color::Color;
use crate::foundation::math::Transform2D;
use crate::node::Behavior;
use crate::registry::{NodeType, ValueKind};
use crate::render::{DrawCommand, DrawList, Renderable};

use super::{transform2d_properties, Spatial2D};

/// Text drawn at the node's position
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// Local transform; rotation turns the text around its anchor
    pub transform: Transform2D,
    /// Text content
    pub text: String,
    /// Text color
    pub font_colour: Color,
    /// Font size in points
    pub font_size: f64,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            transform: Transform2D::default(),
            text: "Hello World!".to_string(),
            font_colour: Color::BLACK,
            font_size: 16.0,
        }
    }
}

impl Text {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "Text";

    /// Create a label
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Type metadata
    pub fn node_type() -> NodeType {
        transform2d_properties(NodeType::builder::<Self>(Self::TYPE_NAME))
            .property("text", ValueKind::String, |label, arg| {
                label.text = arg.into_string()?;
                Ok(())
            })
            .property("font_colour", ValueKind::Color, |label, arg| {
                label.font_colour = arg.into_color()?;
                Ok(())
            })
            .property("font_size", ValueKind::Float, |label, arg| {
                label.font_size = arg.into_float()?;
                Ok(())
            })
            .build(|_| Ok(Self::default()))
    }
}

impl Spatial2D for Text {
    fn transform(&self) -> &Transform2D {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }
}

impl Renderable for Text {
    fn draw(&self, out: &mut DrawList) {
        out.push(DrawCommand::Text {
            position: self.transform.position,
            text: self.text.clone(),
            color: self.font_colour,
            size: self.font_size,
            rotation: self.transform.rotation,
        });
    }
}

impl Behavior for Text {
    fn renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}
