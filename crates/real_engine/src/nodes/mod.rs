//! # Built-in Node Types
//!
//! The types every project can name without loading an extension:
//!
//! | Type               | Behavior             | Leaf |
//! |--------------------|----------------------|------|
//! | `Node`             | [`BaseNode`]         | no   |
//! | `Node2D`           | [`Node2D`]           | no   |
//! | `Node3D`           | [`Node3D`]           | no   |
//! | `Text`             | [`Text`]             | no   |
//! | `ConsoleCharacter` | [`ConsoleCharacter`] | no   |
//! | `Circle`           | [`Circle`]           | yes  |
//! | `Window`           | [`Window`]           | no   |
//!
//! plus the `Headless` window backend object type.

mod circle;
mod console;
mod spatial;
mod text;
mod window;

pub use circle::Circle;
pub use console::ConsoleCharacter;
pub use spatial::{transform2d_properties, Node2D, Node3D, Spatial2D};
pub use text::Text;
pub use window::Window;

use crate::node::Behavior;
use crate::registry::{Extension, ModuleRegistrar, NodeType, ObjectType, RegistryError};
use crate::render::{HeadlessBackend, WindowBackend};

/// Name of the built-in module
pub const BUILTIN_MODULE: &str = "builtin";

/// Plain composite node without behavior of its own
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseNode;

impl Behavior for BaseNode {}

impl BaseNode {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "Node";

    /// Type metadata
    pub fn node_type() -> NodeType {
        NodeType::builder::<Self>(Self::TYPE_NAME).build(|_| Ok(Self))
    }
}

/// Module registering the built-in types
#[derive(Debug, Clone, Copy, Default)]
pub struct Builtins;

impl Extension for Builtins {
    fn name(&self) -> &str {
        BUILTIN_MODULE
    }

    fn register(&self, registrar: &mut ModuleRegistrar<'_>) -> Result<(), RegistryError> {
        registrar
            .node(BaseNode::node_type())?
            .node(Node2D::node_type())?
            .node(Node3D::node_type())?
            .node(Text::node_type())?
            .node(ConsoleCharacter::node_type())?
            .node(Circle::node_type())?
            .node(Window::node_type())?
            .object(ObjectType::new(HeadlessBackend::TYPE_NAME, || {
                Box::new(HeadlessBackend::new()) as Box<dyn WindowBackend>
            }))?;
        Ok(())
    }
}
