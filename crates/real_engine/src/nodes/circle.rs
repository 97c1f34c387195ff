//! Filled circle

use crate::foundation::color::Color;
use crate::foundation::math::Transform2D;
use crate::node::Behavior;
use crate::registry::{NodeType, ValueKind};
use crate::render::{DrawCommand, DrawList, Renderable};

use super::{transform2d_properties, Spatial2D};

/// Filled circle centered on the node's position; refuses children
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    /// Local transform
    pub transform: Transform2D,
    /// Radius
    pub radius: f64,
    /// Fill color
    pub color: Color,
}

impl Circle {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "Circle";

    /// Create a circle at the origin
    pub fn new(radius: f64, color: Color) -> Self {
        Self {
            transform: Transform2D::default(),
            radius,
            color,
        }
    }

    /// Type metadata
    pub fn node_type() -> NodeType {
        transform2d_properties(NodeType::builder::<Self>(Self::TYPE_NAME))
            .param("radius", ValueKind::Float)
            .param_with_default("color", ValueKind::Color, "#FFFFFF")
            .property("radius", ValueKind::Float, |circle, arg| {
                circle.radius = arg.into_float()?;
                Ok(())
            })
            .property("color", ValueKind::Color, |circle, arg| {
                circle.color = arg.into_color()?;
                Ok(())
            })
            .build(|args| Ok(Self::new(args.float("radius")?, args.color("color")?)))
    }
}

impl Spatial2D for Circle {
    fn transform(&self) -> &Transform2D {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }
}

impl Renderable for Circle {
    fn draw(&self, out: &mut DrawList) {
        out.push(DrawCommand::Circle {
            center: self.transform.position,
            radius: self.radius,
            color: self.color,
        });
    }
}

impl Behavior for Circle {
    fn accepts_children(&self) -> bool {
        false
    }

    fn renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}
