//! # Real Engine
//!
//! A small scene-graph runtime: a tree of named nodes, each carrying a
//! behavior, driven by a variable-rate update pass and a fixed-rate tick
//! pass. Scenes are declared in RON or JSON files and instantiated through
//! a registry of node and object types that extension modules add to.
//!
//! ## Features
//!
//! - **Node tree**: attach, detach and reparent with ready/leave lifecycle
//! - **Data-driven scenes**: typed parameters, properties and `new::` references
//! - **Two cadences**: per-frame updates and a fixed-step tick accumulator
//! - **Fault isolation**: a failing or panicking hook only affects its node
//! - **Pluggable windows**: rendering and input behind a backend trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use real_engine::prelude::*;
//!
//! struct Spin {
//!     angle: f64,
//! }
//!
//! impl Behavior for Spin {
//!     fn on_tick(&mut self, _ctx: &NodeContext<'_>, delta: f64) -> HookResult {
//!         self.angle += delta;
//!         Ok(())
//!     }
//! }
//!
//! struct Game;
//!
//! impl Extension for Game {
//!     fn name(&self) -> &str {
//!         "game"
//!     }
//!
//!     fn register(&self, registrar: &mut ModuleRegistrar<'_>) -> Result<(), RegistryError> {
//!         registrar.node(NodeType::builder::<Spin>("Spin").build(|_| Ok(Spin { angle: 0.0 })))?;
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = std::env::current_dir()?;
//!     let manifest = ProjectManifest::discover(&dir)?.ok_or_else(|| EngineError::ManifestNotFound(dir.clone()))?;
//!     let mut engine = Engine::bootstrap(manifest, dir, &[&Game])?;
//!     engine.run();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Configuration
pub mod config;
pub mod core;

pub mod foundation;
pub mod input;
pub mod node;
pub mod nodes;
pub mod registry;
pub mod render;
pub mod scene;
pub mod tree;

mod engine;
mod lifecycle;

pub use engine::{Engine, EngineError, EngineState, EngineStats, QuitHandle, PLACEHOLDER_SCENE_NAME};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::ProjectManifest,
        foundation::{
            color::Color,
            math::{Transform2D, Vec2, Vec3},
        },
        input::Key,
        node::{Behavior, HookError, HookResult, NodeContext},
        nodes::{Circle, ConsoleCharacter, Node2D, Spatial2D, Text, Window},
        registry::{Args, Extension, ModuleRegistrar, NodeType, ObjectType, RegistryError, ValueKind},
        render::{DrawCommand, DrawList, Renderable, WindowBackend},
        scene::{SceneDescriptor, SceneError},
        tree::{NodeId, NodeTree},
        Engine, EngineError, EngineState, QuitHandle,
    };
}
