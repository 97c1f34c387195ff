//! Depth-first traversal

use super::{NodeId, NodeTree};

/// Lazy pre-order iterator over a subtree
///
/// Children are visited in insertion order and each child's whole subtree is
/// yielded before its next sibling.
pub struct Traverse<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl<'a> Traverse<'a> {
    pub(super) fn new(tree: &'a NodeTree, start: NodeId, include_self: bool) -> Self {
        let mut stack = Vec::new();
        if tree.contains(start) {
            if include_self {
                stack.push(start);
            } else {
                stack.extend(tree.children(start).iter().rev());
            }
        }
        Self { tree, stack }
    }
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}
