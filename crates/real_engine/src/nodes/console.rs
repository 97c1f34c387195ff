//! Single character in a cell grid

use crate::foundation::color::Color;
use crate::foundation::math::Transform2D;
use crate::node::Behavior;
use crate::registry::{NodeType, ValueKind};
use crate::render::{DrawCommand, DrawList, Renderable};

use super::{transform2d_properties, Spatial2D};

/// Character drawn at the cell nearest to the node's position
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleCharacter {
    /// Local transform, snapped to whole cells when drawn
    pub transform: Transform2D,
    /// Character to show
    pub character: char,
    /// Foreground color
    pub color: Color,
}

impl Default for ConsoleCharacter {
    fn default() -> Self {
        Self {
            transform: Transform2D::default(),
            character: '#',
            color: Color::WHITE,
        }
    }
}

impl ConsoleCharacter {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "ConsoleCharacter";

    /// Create a character at the origin
    pub fn new(character: char) -> Self {
        Self {
            character,
            ..Default::default()
        }
    }

    /// Type metadata
    pub fn node_type() -> NodeType {
        transform2d_properties(NodeType::builder::<Self>(Self::TYPE_NAME))
            .property("character", ValueKind::Char, |glyph, arg| {
                glyph.character = arg.into_char()?;
                Ok(())
            })
            .property("color", ValueKind::Color, |glyph, arg| {
                glyph.color = arg.into_color()?;
                Ok(())
            })
            .build(|_| Ok(Self::default()))
    }
}

impl Spatial2D for ConsoleCharacter {
    fn transform(&self) -> &Transform2D {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }
}

impl Renderable for ConsoleCharacter {
    fn draw(&self, out: &mut DrawList) {
        out.push(DrawCommand::Glyph {
            cell: self.transform.snapped_position(),
            character: self.character,
            color: self.color,
        });
    }
}

impl Behavior for ConsoleCharacter {
    fn renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;

    #[test]
    fn test_draws_at_snapped_cell() {
        let mut glyph = ConsoleCharacter::new('@');
        glyph.transform.position = Vec2::new(3.6, 1.2);

        let mut list = DrawList::new();
        glyph.draw(&mut list);
        assert_eq!(
            list.commands(),
            [DrawCommand::Glyph {
                cell: (4, 1),
                character: '@',
                color: Color::WHITE,
            }]
        );
    }
}
