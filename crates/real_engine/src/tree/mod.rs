//! # Node Tree
//!
//! Arena-backed scene graph. Every node lives in a [`SlotMap`] owned by the
//! tree and is addressed by a [`NodeId`]; a node's parent link is a plain
//! key and its children are an ordered list of keys.
//!
//! The tree is created with a permanent root. A node is *live* when the root
//! is reachable by walking its parent links. Attaching a subtree under a live
//! node fires `on_ready` across it, detaching fires `on_leave`.
//!
//! ## Usage
//!
//! ```rust
//! use real_engine::nodes::BaseNode;
//! use real_engine::tree::NodeTree;
//!
//! let mut tree = NodeTree::new();
//! let scene = tree.insert("Scene", BaseNode);
//! let player = tree.insert("Player", BaseNode);
//! tree.attach(scene, player)?;
//! tree.attach(tree.root(), scene)?;
//!
//! let names: Vec<_> = tree.traverse(tree.root(), true).filter_map(|id| tree.name(id)).collect();
//! assert_eq!(names, ["Root", "Scene", "Player"]);
//! # Ok::<(), real_engine::tree::TreeError>(())
//! ```

mod traverse;

pub use traverse::Traverse;

use std::cell::RefCell;

use slotmap::SlotMap;

use crate::lifecycle;
use crate::node::{Behavior, Command, Hook, HookError, NodeContext};
use crate::nodes::BaseNode;

slotmap::new_key_type! {
    /// Handle to a node in a [`NodeTree`]
    pub struct NodeId;
}

/// Name given to the permanent root node
pub const ROOT_NAME: &str = "Root";

/// Tree-structural errors
#[derive(thiserror::Error, Debug)]
pub enum TreeError {
    /// The child already has a parent
    #[error("Node '{child}' already has a parent")]
    ChildAlreadyParented {
        /// Name of the child
        child: String,
    },

    /// The child is not a child of the given parent
    #[error("Node '{child}' is not a child of '{parent}'")]
    ChildNotFound {
        /// Name of the parent
        parent: String,
        /// Name of the child
        child: String,
    },

    /// The operation is not allowed on these nodes
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The id does not refer to a node in this tree
    #[error("Node {0:?} does not exist")]
    NodeNotFound(NodeId),

    /// A ready hook failed and the attach was rolled back
    #[error("{hook} hook failed on node '{node}': {source}")]
    HookFailed {
        /// Name of the failing node
        node: String,
        /// Hook that failed
        hook: Hook,
        /// Error returned by the hook
        #[source]
        source: Box<HookError>,
    },
}

struct NodeSlot {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    // `None` only while the behavior is checked out for a hook call
    behavior: Option<Box<dyn Behavior>>,
    leaf: bool,
}

/// Arena of nodes with a permanent root
pub struct NodeTree {
    nodes: SlotMap<NodeId, NodeSlot>,
    root: NodeId,
    commands: RefCell<Vec<Command>>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeSlot {
            name: ROOT_NAME.to_string(),
            parent: None,
            children: Vec::new(),
            behavior: Some(Box::new(BaseNode) as Box<dyn Behavior>),
            leaf: false,
        });

        Self {
            nodes,
            root,
            commands: RefCell::new(Vec::new()),
        }
    }

    /// The permanent root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Insert a detached node
    pub fn insert(&mut self, name: impl Into<String>, behavior: impl Behavior) -> NodeId {
        self.insert_boxed(name, Box::new(behavior))
    }

    /// Insert a detached node with an already boxed behavior
    pub fn insert_boxed(&mut self, name: impl Into<String>, behavior: Box<dyn Behavior>) -> NodeId {
        let leaf = !behavior.accepts_children();
        self.nodes.insert(NodeSlot {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            behavior: Some(behavior),
            leaf,
        })
    }

    /// Whether `id` refers to a node in this tree
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes, attached or not, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false, the root is never removed
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name of a node
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|slot| slot.name.as_str())
    }

    /// Rename a node
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), TreeError> {
        self.slot_mut(id)?.name = name.into();
        Ok(())
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|slot| slot.parent)
    }

    /// Children of a node in insertion order; empty for unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |slot| slot.children.as_slice())
    }

    /// Whether a node refuses children
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|slot| slot.leaf)
    }

    /// Whether the root is reachable from `id`
    pub fn is_live(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whether `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nearest strict ancestor whose behavior is a `T`
    pub fn find_ancestor<T: Behavior>(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            if self.behavior::<T>(ancestor).is_some() {
                return Some(ancestor);
            }
            current = self.parent(ancestor);
        }
        None
    }

    /// Behavior of a node as a trait object
    pub fn behavior_dyn(&self, id: NodeId) -> Option<&dyn Behavior> {
        self.nodes.get(id)?.behavior.as_deref()
    }

    /// Mutable behavior of a node as a trait object
    pub fn behavior_dyn_mut(&mut self, id: NodeId) -> Option<&mut (dyn Behavior + 'static)> {
        self.nodes.get_mut(id)?.behavior.as_deref_mut()
    }

    /// Behavior of a node, if it is a `T`
    pub fn behavior<T: Behavior>(&self, id: NodeId) -> Option<&T> {
        self.behavior_dyn(id)?.as_any().downcast_ref::<T>()
    }

    /// Mutable behavior of a node, if it is a `T`
    pub fn behavior_mut<T: Behavior>(&mut self, id: NodeId) -> Option<&mut T> {
        self.behavior_dyn_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Append `child` to `parent`'s children
    ///
    /// When `parent` is live, `on_ready` fires across the child's subtree in
    /// pre-order. A failing ready hook rolls the attach back: nodes that were
    /// already readied get `on_leave`, the link is removed, commands queued
    /// by those hooks are dropped and [`TreeError::HookFailed`] is returned.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_slot = self.slot(parent)?;
        let child_slot = self.slot(child)?;

        if child_slot.parent.is_some() {
            return Err(TreeError::ChildAlreadyParented {
                child: child_slot.name.clone(),
            });
        }
        if child == self.root {
            return Err(TreeError::InvalidOperation("the root cannot be attached".to_string()));
        }
        if parent_slot.leaf {
            return Err(TreeError::InvalidOperation(format!(
                "'{}' does not accept children",
                parent_slot.name
            )));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(TreeError::InvalidOperation(format!(
                "attaching '{}' under '{}' would create a cycle",
                child_slot.name, parent_slot.name
            )));
        }

        self.link(parent, child);

        if self.is_live(parent) {
            let queued = self.commands.get_mut().len();
            if let Err(err) = lifecycle::enter(self, child) {
                self.unlink(parent, child);
                self.commands.get_mut().truncate(queued);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Remove `child` from `parent`'s children
    ///
    /// `on_leave` fires across the detached subtree in pre-order. Leave
    /// failures are logged and do not undo the detach.
    pub fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_slot = self.slot(parent)?;
        let child_slot = self.slot(child)?;

        if parent_slot.leaf {
            return Err(TreeError::InvalidOperation(format!(
                "'{}' does not accept children",
                parent_slot.name
            )));
        }
        if !parent_slot.children.contains(&child) {
            return Err(TreeError::ChildNotFound {
                parent: parent_slot.name.clone(),
                child: child_slot.name.clone(),
            });
        }

        self.unlink(parent, child);
        lifecycle::exit(self, child);
        Ok(())
    }

    /// Detach `node` from its current parent, if any, and attach it under
    /// `new_parent`
    ///
    /// When the attach fails the node goes back under its old parent and
    /// the attach error is returned.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), TreeError> {
        let node_slot = self.slot(node)?;
        let parent_slot = self.slot(new_parent)?;

        if node == self.root {
            return Err(TreeError::InvalidOperation("the root cannot be reparented".to_string()));
        }
        if parent_slot.leaf {
            return Err(TreeError::InvalidOperation(format!(
                "'{}' does not accept children",
                parent_slot.name
            )));
        }
        if node == new_parent || self.is_ancestor_of(node, new_parent) {
            return Err(TreeError::InvalidOperation(format!(
                "moving '{}' under '{}' would create a cycle",
                node_slot.name, parent_slot.name
            )));
        }

        let old_parent = node_slot.parent;
        if let Some(old_parent) = old_parent {
            self.detach(old_parent, node)?;
        }

        let Err(err) = self.attach(new_parent, node) else {
            return Ok(());
        };
        if let Some(old_parent) = old_parent {
            if let Err(restore) = self.attach(old_parent, node) {
                log::error!("Could not restore {node:?} under {old_parent:?}: {restore}");
            }
        }
        Err(err)
    }

    /// Free a detached subtree, returning the number of nodes removed
    pub fn free(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let slot = self.slot(id)?;
        if id == self.root {
            return Err(TreeError::InvalidOperation("the root cannot be freed".to_string()));
        }
        if slot.parent.is_some() {
            return Err(TreeError::InvalidOperation(format!(
                "'{}' must be detached before it is freed",
                slot.name
            )));
        }

        let doomed = self.snapshot(id, true);
        for node in &doomed {
            self.nodes.remove(*node);
        }
        Ok(doomed.len())
    }

    /// Detach `id` from its parent, if any, and free its subtree
    pub fn remove(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let parent = self.slot(id)?.parent;
        if let Some(parent) = parent {
            self.detach(parent, id)?;
        }
        self.free(id)
    }

    /// Pre-order iterator over the subtree at `start`
    pub fn traverse(&self, start: NodeId, include_self: bool) -> Traverse<'_> {
        Traverse::new(self, start, include_self)
    }

    /// Collected pre-order traversal, stable across later mutation
    pub fn snapshot(&self, start: NodeId, include_self: bool) -> Vec<NodeId> {
        self.traverse(start, include_self).collect()
    }

    /// Drain the commands queued by hooks
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(self.commands.get_mut())
    }

    pub(crate) fn queue(&self, command: Command) {
        self.commands.borrow_mut().push(command);
    }

    /// Run `f` with a node's behavior checked out of its slot
    ///
    /// Returns `None` when the node does not exist or its behavior is already
    /// checked out.
    pub(crate) fn with_behavior<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn Behavior, &NodeContext<'_>) -> R,
    ) -> Option<R> {
        let mut behavior = self.nodes.get_mut(id)?.behavior.take()?;

        let result = {
            let ctx = NodeContext::new(self, id);
            f(behavior.as_mut(), &ctx)
        };

        if let Some(slot) = self.nodes.get_mut(id) {
            slot.behavior = Some(behavior);
        }
        Some(result)
    }

    fn slot(&self, id: NodeId) -> Result<&NodeSlot, TreeError> {
        self.nodes.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut NodeSlot, TreeError> {
        self.nodes.get_mut(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(slot) = self.nodes.get_mut(parent) {
            slot.children.push(child);
        }
        if let Some(slot) = self.nodes.get_mut(child) {
            slot.parent = Some(parent);
        }
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        if let Some(slot) = self.nodes.get_mut(parent) {
            slot.children.retain(|c| *c != child);
        }
        if let Some(slot) = self.nodes.get_mut(child) {
            slot.parent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HookResult;
    use crate::nodes::{BaseNode, Circle};

    /// Fails its `fail_on`-th ready; zero never fails
    #[derive(Default)]
    struct Fussy {
        readies: u32,
        fail_on: u32,
        quit_on_ready: bool,
    }

    impl Behavior for Fussy {
        fn on_ready(&mut self, ctx: &NodeContext<'_>) -> HookResult {
            self.readies += 1;
            if self.quit_on_ready {
                ctx.quit();
            }
            if self.readies == self.fail_on {
                return Err(HookError::failed("refused"));
            }
            Ok(())
        }
    }

    fn chain(tree: &mut NodeTree, names: &[&str]) -> Vec<NodeId> {
        let ids: Vec<_> = names.iter().map(|name| tree.insert(*name, BaseNode)).collect();
        for pair in ids.windows(2) {
            tree.attach(pair[0], pair[1]).unwrap();
        }
        ids
    }

    fn names(tree: &NodeTree, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| tree.name(id).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = NodeTree::new();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.name(tree.root()), Some(ROOT_NAME));
        assert!(tree.is_live(tree.root()));
    }

    #[test]
    fn test_attach_already_parented_leaves_both_trees_untouched() {
        let mut tree = NodeTree::new();
        let a = tree.insert("A", BaseNode);
        let b = tree.insert("B", BaseNode);
        let c = tree.insert("C", BaseNode);
        tree.attach(a, c).unwrap();

        let result = tree.attach(b, c);
        assert!(matches!(result, Err(TreeError::ChildAlreadyParented { .. })));
        assert_eq!(tree.children(a), &[c]);
        assert!(tree.children(b).is_empty());
        assert_eq!(tree.parent(c), Some(a));
    }

    #[test]
    fn test_detach_unknown_child() {
        let mut tree = NodeTree::new();
        let a = tree.insert("A", BaseNode);
        let b = tree.insert("B", BaseNode);

        let result = tree.detach(a, b);
        assert!(matches!(result, Err(TreeError::ChildNotFound { .. })));
    }

    #[test]
    fn test_attach_rejects_cycles_and_root() {
        let mut tree = NodeTree::new();
        let ids = chain(&mut tree, &["A", "B", "C"]);

        assert!(matches!(tree.attach(ids[2], ids[0]), Err(TreeError::InvalidOperation(_))));
        assert!(matches!(tree.attach(ids[0], ids[0]), Err(TreeError::InvalidOperation(_))));

        let root = tree.root();
        assert!(matches!(tree.attach(ids[2], root), Err(TreeError::InvalidOperation(_))));
    }

    #[test]
    fn test_leaf_refuses_children() {
        let mut tree = NodeTree::new();
        let leaf = tree.insert("Dot", Circle::new(1.0, Default::default()));
        let child = tree.insert("Child", BaseNode);

        assert!(tree.is_leaf(leaf));
        assert!(matches!(tree.attach(leaf, child), Err(TreeError::InvalidOperation(_))));
        assert!(matches!(tree.detach(leaf, child), Err(TreeError::InvalidOperation(_))));
        assert_eq!(tree.parent(child), None);
    }

    #[test]
    fn test_traverse_is_pre_order() {
        let mut tree = NodeTree::new();
        let a = tree.insert("A", BaseNode);
        let b = tree.insert("B", BaseNode);
        let b1 = tree.insert("B1", BaseNode);
        let b2 = tree.insert("B2", BaseNode);
        let c = tree.insert("C", BaseNode);
        tree.attach(b, b1).unwrap();
        tree.attach(b, b2).unwrap();
        tree.attach(a, b).unwrap();
        tree.attach(a, c).unwrap();

        assert_eq!(names(&tree, tree.traverse(a, true)), ["A", "B", "B1", "B2", "C"]);
        assert_eq!(names(&tree, tree.traverse(a, false)), ["B", "B1", "B2", "C"]);

        // Each call starts over
        assert_eq!(tree.traverse(a, true).count(), 5);
        assert_eq!(tree.traverse(a, true).count(), 5);
    }

    #[test]
    fn test_liveness_follows_root() {
        let mut tree = NodeTree::new();
        let ids = chain(&mut tree, &["A", "B"]);
        assert!(!tree.is_live(ids[1]));

        tree.attach(tree.root(), ids[0]).unwrap();
        assert!(tree.is_live(ids[1]));
        assert!(tree.is_ancestor_of(tree.root(), ids[1]));
        assert!(!tree.is_ancestor_of(ids[1], ids[0]));
    }

    #[test]
    fn test_reparent_moves_subtree() {
        let mut tree = NodeTree::new();
        let ids = chain(&mut tree, &["A", "B", "C"]);
        let other = tree.insert("Other", BaseNode);

        tree.reparent(ids[1], other).unwrap();
        assert!(tree.children(ids[0]).is_empty());
        assert_eq!(tree.children(other), &[ids[1]]);
        assert_eq!(tree.parent(ids[2]), Some(ids[1]));

        assert!(matches!(tree.reparent(other, ids[2]), Err(TreeError::InvalidOperation(_))));
    }

    #[test]
    fn test_free_requires_detached_subtree() {
        let mut tree = NodeTree::new();
        let ids = chain(&mut tree, &["A", "B", "C"]);

        assert!(tree.free(ids[1]).is_err());
        assert!(tree.free(tree.root()).is_err());

        assert_eq!(tree.remove(ids[1]).unwrap(), 2);
        assert!(!tree.contains(ids[1]));
        assert!(!tree.contains(ids[2]));
        assert!(tree.children(ids[0]).is_empty());
        assert!(matches!(tree.free(ids[1]), Err(TreeError::NodeNotFound(_))));
    }

    #[test]
    fn test_typed_behavior_access() {
        let mut tree = NodeTree::new();
        let dot = tree.insert("Dot", Circle::new(2.0, Default::default()));

        assert!(tree.behavior::<BaseNode>(dot).is_none());
        tree.behavior_mut::<Circle>(dot).unwrap().radius = 7.5;
        assert_eq!(tree.behavior::<Circle>(dot).unwrap().radius, 7.5);
    }

    #[test]
    fn test_failed_reparent_restores_old_parent() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let a = tree.insert("A", BaseNode);
        let b = tree.insert("B", BaseNode);
        let mover = tree.insert(
            "Mover",
            Fussy {
                fail_on: 2,
                ..Fussy::default()
            },
        );
        tree.attach(root, a).unwrap();
        tree.attach(root, b).unwrap();
        tree.attach(a, mover).unwrap();
        let before = tree.len();

        let result = tree.reparent(mover, b);
        assert!(matches!(result, Err(TreeError::HookFailed { .. })));
        assert_eq!(tree.parent(mover), Some(a));
        assert_eq!(tree.children(a), &[mover]);
        assert!(tree.children(b).is_empty());
        assert!(tree.is_live(mover));
        assert_eq!(tree.len(), before);
        assert_eq!(tree.behavior::<Fussy>(mover).unwrap().readies, 3);
    }

    #[test]
    fn test_rolled_back_attach_drops_its_commands() {
        let mut tree = NodeTree::new();
        let a = tree.insert(
            "A",
            Fussy {
                quit_on_ready: true,
                ..Fussy::default()
            },
        );
        let b = tree.insert(
            "B",
            Fussy {
                fail_on: 1,
                ..Fussy::default()
            },
        );
        tree.attach(a, b).unwrap();
        tree.queue(Command::Quit);

        assert!(tree.attach(tree.root(), a).is_err());
        let commands = tree.take_commands();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], Command::Quit));

        tree.behavior_mut::<Fussy>(b).unwrap().fail_on = 0;
        tree.attach(tree.root(), a).unwrap();
        assert_eq!(tree.take_commands().len(), 1);
    }
}
