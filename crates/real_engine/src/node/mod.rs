//! # Node Behaviors
//!
//! A node is a name and a position in the [`NodeTree`](crate::tree::NodeTree)
//! plus one boxed [`Behavior`]. The behavior carries the node's data and
//! reacts to the four lifecycle hooks:
//!
//! - `on_ready` once when the node becomes reachable from the root
//! - `on_leave` once when it is detached again
//! - `on_update` every loop iteration with the variable frame delta
//! - `on_tick` at the fixed tick rate with the fixed interval as delta
//!
//! Hooks receive a [`NodeContext`] for read access to the tree and for
//! queueing structural changes, which the engine applies between passes.

mod context;

pub use context::{Command, NodeContext};

use std::any::Any;
use std::fmt;

use crate::render::Renderable;
use crate::tree::TreeError;

/// Result type returned by every hook
pub type HookResult = Result<(), HookError>;

/// Upcast to [`Any`] for typed access to boxed trait objects
pub trait AsAny: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior attached to a node
///
/// Every hook has an empty default, so a type only overrides what it uses.
pub trait Behavior: AsAny {
    /// The node became reachable from the root
    fn on_ready(&mut self, _ctx: &NodeContext<'_>) -> HookResult {
        Ok(())
    }

    /// The node was detached from the live tree
    fn on_leave(&mut self, _ctx: &NodeContext<'_>) -> HookResult {
        Ok(())
    }

    /// Variable-rate update with the wall-clock delta in seconds
    fn on_update(&mut self, _ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
        Ok(())
    }

    /// Fixed-rate tick with the tick interval in seconds
    fn on_tick(&mut self, _ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
        Ok(())
    }

    /// Whether children may be attached to this node
    fn accepts_children(&self) -> bool {
        true
    }

    /// Drawing interface, if the node draws anything
    fn renderable(&self) -> Option<&dyn Renderable> {
        None
    }
}

/// Lifecycle hook names, used in logs and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// `on_ready`
    Ready,
    /// `on_leave`
    Leave,
    /// `on_update`
    Update,
    /// `on_tick`
    Tick,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::Leave => "leave",
            Self::Update => "update",
            Self::Tick => "tick",
        };
        f.write_str(name)
    }
}

/// Failure reported by a hook
#[derive(thiserror::Error, Debug)]
pub enum HookError {
    /// Behavior-specific failure
    #[error("{0}")]
    Failed(String),

    /// A tree operation made by the hook failed
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The window backend failed
    #[error("Backend error: {0}")]
    Backend(String),
}

impl HookError {
    /// Create a behavior-specific failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
