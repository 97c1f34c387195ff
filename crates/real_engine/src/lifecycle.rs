//! Lifecycle dispatch
//!
//! Fires the one-shot `on_ready`/`on_leave` hooks across a subtree in
//! pre-order. Called by [`NodeTree::attach`] and [`NodeTree::detach`] only.

use crate::node::Hook;
use crate::tree::{NodeId, NodeTree, TreeError};

/// Fire `on_ready` on every node of the subtree at `start`
///
/// On the first failure every node that was already readied receives
/// `on_leave` and the failure is returned. Unlinking is left to the caller.
pub(crate) fn enter(tree: &mut NodeTree, start: NodeId) -> Result<(), TreeError> {
    let order = tree.snapshot(start, true);

    for (index, id) in order.iter().copied().enumerate() {
        log::trace!("ready: '{}' ({id:?})", tree.name(id).unwrap_or_default());

        let Some(Err(err)) = tree.with_behavior(id, |behavior, ctx| behavior.on_ready(ctx)) else {
            continue;
        };

        let node = tree.name(id).unwrap_or_default().to_string();
        log::warn!("Ready failed on '{node}', rolling back attach: {err}");
        for readied in &order[..index] {
            fire_leave(tree, *readied);
        }

        return Err(TreeError::HookFailed {
            node,
            hook: Hook::Ready,
            source: Box::new(err),
        });
    }
    Ok(())
}

/// Fire `on_leave` on every node of the subtree at `start`
///
/// Failures are logged and the remaining hooks still run.
pub(crate) fn exit(tree: &mut NodeTree, start: NodeId) {
    for id in tree.snapshot(start, true) {
        fire_leave(tree, id);
    }
}

fn fire_leave(tree: &mut NodeTree, id: NodeId) {
    log::trace!("leave: '{}' ({id:?})", tree.name(id).unwrap_or_default());

    if let Some(Err(err)) = tree.with_behavior(id, |behavior, ctx| behavior.on_leave(ctx)) {
        log::error!(
            "Leave hook failed on node '{}' ({id:?}): {err}",
            tree.name(id).unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::node::{Behavior, HookError, HookResult, NodeContext};
    use crate::nodes::BaseNode;
    use crate::tree::{NodeTree, TreeError};

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        journal: Journal,
        fail_ready: bool,
        fail_leave: bool,
    }

    impl Recorder {
        fn new(journal: &Journal) -> Self {
            Self {
                journal: Rc::clone(journal),
                fail_ready: false,
                fail_leave: false,
            }
        }
    }

    impl Behavior for Recorder {
        fn on_ready(&mut self, ctx: &NodeContext<'_>) -> HookResult {
            self.journal.borrow_mut().push(format!("ready {}", ctx.name()));
            if self.fail_ready {
                return Err(HookError::failed("not today"));
            }
            Ok(())
        }

        fn on_leave(&mut self, ctx: &NodeContext<'_>) -> HookResult {
            self.journal.borrow_mut().push(format!("leave {}", ctx.name()));
            if self.fail_leave {
                return Err(HookError::failed("stuck"));
            }
            Ok(())
        }
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow_mut().drain(..).collect()
    }

    #[test]
    fn test_ready_fires_in_pre_order_under_live_parent() {
        let journal = Journal::default();
        let mut tree = NodeTree::new();
        let a = tree.insert("A", Recorder::new(&journal));
        let b = tree.insert("B", Recorder::new(&journal));
        let c = tree.insert("C", Recorder::new(&journal));
        tree.attach(a, b).unwrap();
        tree.attach(a, c).unwrap();
        assert!(entries(&journal).is_empty());

        tree.attach(tree.root(), a).unwrap();
        assert_eq!(entries(&journal), ["ready A", "ready B", "ready C"]);
    }

    #[test]
    fn test_ready_is_deferred_until_subtree_becomes_live() {
        let journal = Journal::default();
        let mut tree = NodeTree::new();
        let outer = tree.insert("Outer", BaseNode);
        let inner = tree.insert("Inner", Recorder::new(&journal));
        tree.attach(outer, inner).unwrap();
        assert!(entries(&journal).is_empty());

        tree.attach(tree.root(), outer).unwrap();
        assert_eq!(entries(&journal), ["ready Inner"]);
    }

    #[test]
    fn test_failed_ready_rolls_attach_back() {
        let journal = Journal::default();
        let mut tree = NodeTree::new();
        let a = tree.insert("A", Recorder::new(&journal));
        let b = tree.insert("B", Recorder::new(&journal));
        let mut failing = Recorder::new(&journal);
        failing.fail_ready = true;
        let c = tree.insert("C", failing);
        tree.attach(a, b).unwrap();
        tree.attach(a, c).unwrap();

        let result = tree.attach(tree.root(), a);
        match result {
            Err(TreeError::HookFailed { node, .. }) => assert_eq!(node, "C"),
            other => panic!("expected HookFailed, got {other:?}"),
        }
        assert_eq!(
            entries(&journal),
            ["ready A", "ready B", "ready C", "leave A", "leave B"]
        );
        assert!(tree.children(tree.root()).is_empty());
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_leave_failures_do_not_stop_detach() {
        let journal = Journal::default();
        let mut tree = NodeTree::new();
        let mut failing = Recorder::new(&journal);
        failing.fail_leave = true;
        let a = tree.insert("A", failing);
        let b = tree.insert("B", Recorder::new(&journal));
        tree.attach(a, b).unwrap();
        tree.attach(tree.root(), a).unwrap();
        entries(&journal);

        tree.detach(tree.root(), a).unwrap();
        assert_eq!(entries(&journal), ["leave A", "leave B"]);
        assert!(!tree.is_live(b));
    }

    #[test]
    fn test_detach_of_never_live_subtree_fires_leave_only() {
        let journal = Journal::default();
        let mut tree = NodeTree::new();
        let outer = tree.insert("Outer", BaseNode);
        let a = tree.insert("A", Recorder::new(&journal));
        let b = tree.insert("B", Recorder::new(&journal));
        tree.attach(a, b).unwrap();
        tree.attach(outer, a).unwrap();
        assert!(entries(&journal).is_empty());

        tree.detach(outer, a).unwrap();
        assert_eq!(entries(&journal), ["leave A", "leave B"]);
    }

    #[test]
    fn test_reparent_of_live_node_fires_leave_then_ready() {
        let journal = Journal::default();
        let mut tree = NodeTree::new();
        let left = tree.insert("Left", BaseNode);
        let right = tree.insert("Right", BaseNode);
        let x = tree.insert("X", Recorder::new(&journal));
        let y = tree.insert("Y", Recorder::new(&journal));
        tree.attach(x, y).unwrap();
        tree.attach(left, x).unwrap();
        tree.attach(tree.root(), left).unwrap();
        tree.attach(tree.root(), right).unwrap();
        entries(&journal);

        tree.reparent(x, right).unwrap();
        assert_eq!(entries(&journal), ["leave X", "leave Y", "ready X", "ready Y"]);
        assert_eq!(tree.parent(x), Some(right));
        assert!(tree.is_live(y));
    }
}
