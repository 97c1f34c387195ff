//! Nodes with a transform

use crate::foundation::math::{Transform2D, Transform3D};
use crate::node::Behavior;
use crate::registry::{NodeType, NodeTypeBuilder, ValueKind};

/// Behavior that owns a 2D transform
pub trait Spatial2D {
    /// The transform
    fn transform(&self) -> &Transform2D;

    /// The transform, mutably
    fn transform_mut(&mut self) -> &mut Transform2D;
}

/// Add the `position`, `scale` and `rotation` properties
pub fn transform2d_properties<T: Behavior + Spatial2D>(builder: NodeTypeBuilder<T>) -> NodeTypeBuilder<T> {
    builder
        .property("position", ValueKind::Vec2, |node, arg| {
            node.transform_mut().position = arg.into_vec2()?;
            Ok(())
        })
        .property("scale", ValueKind::Vec2, |node, arg| {
            node.transform_mut().scale = arg.into_vec2()?;
            Ok(())
        })
        .property("rotation", ValueKind::Float, |node, arg| {
            node.transform_mut().rotation = arg.into_float()?;
            Ok(())
        })
}

/// Node positioned in the plane
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node2D {
    /// Local transform
    pub transform: Transform2D,
}

impl Behavior for Node2D {}

impl Spatial2D for Node2D {
    fn transform(&self) -> &Transform2D {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }
}

impl Node2D {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "Node2D";

    /// Type metadata
    pub fn node_type() -> NodeType {
        transform2d_properties(NodeType::builder::<Self>(Self::TYPE_NAME)).build(|_| Ok(Self::default()))
    }
}

/// Node positioned in space
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node3D {
    /// Local transform
    pub transform: Transform3D,
}

impl Behavior for Node3D {}

impl Node3D {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "Node3D";

    /// Type metadata
    pub fn node_type() -> NodeType {
        NodeType::builder::<Self>(Self::TYPE_NAME)
            .property("position", ValueKind::Vec3, |node, arg| {
                node.transform.position = arg.into_vec3()?;
                Ok(())
            })
            .property("scale", ValueKind::Vec3, |node, arg| {
                node.transform.scale = arg.into_vec3()?;
                Ok(())
            })
            .property("rotation", ValueKind::Vec2, |node, arg| {
                node.transform.rotation = arg.into_vec2()?;
                Ok(())
            })
            .build(|_| Ok(Self::default()))
    }
}
