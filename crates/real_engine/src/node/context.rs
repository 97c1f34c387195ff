//! Hook context and deferred structural commands

use std::fmt;

use super::Behavior;
use crate::nodes::Window;
use crate::tree::{NodeId, NodeTree};

/// Structural change requested by a hook
///
/// Commands are queued while a pass runs and applied by the engine once the
/// pass is over, so no hook ever sees the tree change under it.
pub enum Command {
    /// Insert a new node and attach it under `parent`
    Spawn {
        /// Node to attach under
        parent: NodeId,
        /// Name of the new node
        name: String,
        /// Behavior of the new node
        behavior: Box<dyn Behavior>,
    },

    /// Detach a node and free its subtree
    Free(NodeId),

    /// Move a node under another parent
    Reparent {
        /// Node to move
        node: NodeId,
        /// Its new parent
        new_parent: NodeId,
    },

    /// Replace the current scene with the named one
    ChangeScene(String),

    /// Stop the engine loop
    Quit,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { parent, name, .. } => f
                .debug_struct("Spawn")
                .field("parent", parent)
                .field("name", name)
                .finish_non_exhaustive(),
            Self::Free(id) => f.debug_tuple("Free").field(id).finish(),
            Self::Reparent { node, new_parent } => f
                .debug_struct("Reparent")
                .field("node", node)
                .field("new_parent", new_parent)
                .finish(),
            Self::ChangeScene(name) => f.debug_tuple("ChangeScene").field(name).finish(),
            Self::Quit => f.write_str("Quit"),
        }
    }
}

/// View of the tree handed to a running hook
pub struct NodeContext<'a> {
    tree: &'a NodeTree,
    id: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(tree: &'a NodeTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// The node whose hook is running
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Read access to the whole tree
    ///
    /// The running node's own behavior is checked out while its hook runs,
    /// so typed lookups of `self.id()` return `None`.
    pub fn tree(&self) -> &'a NodeTree {
        self.tree
    }

    /// Name of the running node
    pub fn name(&self) -> &'a str {
        self.tree.name(self.id).unwrap_or_default()
    }

    /// Parent of the running node
    pub fn parent(&self) -> Option<NodeId> {
        self.tree.parent(self.id)
    }

    /// Nearest enclosing window
    pub fn window(&self) -> Option<&'a Window> {
        let window = self.tree.find_ancestor::<Window>(self.id)?;
        self.tree.behavior::<Window>(window)
    }

    /// Queue a new node under `parent`
    pub fn spawn(&self, parent: NodeId, name: impl Into<String>, behavior: impl Behavior) {
        self.tree.queue(Command::Spawn {
            parent,
            name: name.into(),
            behavior: Box::new(behavior),
        });
    }

    /// Queue a new child of the running node
    pub fn spawn_child(&self, name: impl Into<String>, behavior: impl Behavior) {
        self.spawn(self.id, name, behavior);
    }

    /// Queue a node for removal
    pub fn queue_free(&self, id: NodeId) {
        self.tree.queue(Command::Free(id));
    }

    /// Queue the running node for removal
    pub fn queue_free_self(&self) {
        self.queue_free(self.id);
    }

    /// Queue a move of `node` under `new_parent`
    pub fn reparent(&self, node: NodeId, new_parent: NodeId) {
        self.tree.queue(Command::Reparent { node, new_parent });
    }

    /// Queue a scene change
    pub fn change_scene(&self, name: impl Into<String>) {
        self.tree.queue(Command::ChangeScene(name.into()));
    }

    /// Ask the engine loop to stop
    pub fn quit(&self) {
        self.tree.queue(Command::Quit);
    }
}
