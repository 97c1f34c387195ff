//! Core engine implementation
//!
//! The [`Engine`] owns the one live [`NodeTree`], the [`TypeRegistry`] used
//! to build scenes and the clocks driving the two pass cadences. Under the
//! permanent root sits exactly one child, the current scene.
//!
//! Each loop iteration runs one update pass with the wall-clock delta, then
//! as many tick passes as the fixed-step accumulator releases. Hook failures
//! and panics are contained per node. Structural requests queued by hooks
//! are applied between passes.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::config::ProjectManifest;
use crate::foundation::time::{FixedStep, Stopwatch};
use crate::node::{Command, Hook, HookResult};
use crate::nodes::BaseNode;
use crate::registry::{Extension, TypeRegistry};
use crate::scene::{self, resolve_scene_path, SceneDescriptor, SceneError};
use crate::tree::{NodeId, NodeTree};

/// Name of the placeholder scene present before the first scene loads
pub const PLACEHOLDER_SCENE_NAME: &str = "Scene";

/// Upper bound on command-drain rounds after one pass
const MAX_COMMAND_ROUNDS: usize = 16;

/// Startup errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// No manifest in the project directory
    #[error("No project manifest found in {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// The manifest could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The logger could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    /// A scene could not be loaded or attached
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Iterations run
    Running,
    /// The quit signal was seen
    Stopped,
}

/// Quit flag that may be raised from any thread
#[derive(Debug, Clone, Default)]
pub struct QuitHandle(Arc<AtomicBool>);

impl QuitHandle {
    /// Ask the loop to stop after the current iteration
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag is raised
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pass counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Update passes run
    pub update_passes: u64,
    /// Tick passes run
    pub tick_passes: u64,
    /// Update/tick hooks that returned an error or panicked
    pub hook_failures: u64,
    /// Ticks dropped because the backlog exceeded the per-iteration cap
    pub dropped_ticks: u64,
}

/// Main engine struct
pub struct Engine {
    tree: NodeTree,
    registry: TypeRegistry,
    manifest: ProjectManifest,
    project_dir: PathBuf,
    scene: NodeId,
    state: EngineState,
    quit: QuitHandle,
    update_clock: Stopwatch,
    fixed_step: FixedStep,
    stats: EngineStats,
}

impl Engine {
    /// Create an engine with an empty placeholder scene
    pub fn new(
        manifest: ProjectManifest,
        registry: TypeRegistry,
        project_dir: impl Into<PathBuf>,
    ) -> Result<Self, EngineError> {
        manifest.validate()?;
        log::info!("Initializing engine for '{}' v{}", manifest.name, manifest.version);

        let mut tree = NodeTree::new();
        let scene = tree.insert(PLACEHOLDER_SCENE_NAME, BaseNode);
        tree.attach(tree.root(), scene).map_err(SceneError::from)?;

        let fixed_step = FixedStep::new(manifest.tps, manifest.max_ticks_per_iteration);

        Ok(Self {
            tree,
            registry,
            manifest,
            project_dir: project_dir.into(),
            scene,
            state: EngineState::Running,
            quit: QuitHandle::default(),
            update_clock: Stopwatch::new(),
            fixed_step,
            stats: EngineStats::default(),
        })
    }

    /// Build the registry from the built-in types and the allowed
    /// `extensions`, then load the manifest's default scene
    ///
    /// Extensions that fail to register are logged and skipped.
    pub fn bootstrap(
        manifest: ProjectManifest,
        project_dir: impl Into<PathBuf>,
        extensions: &[&dyn Extension],
    ) -> Result<Self, EngineError> {
        let mut registry = TypeRegistry::with_builtins();

        let allowed = extensions.iter().copied().filter(|extension| {
            let allowed = manifest.allows_extension(extension.name());
            if !allowed {
                log::info!("Module '{}' is not in the manifest's extension list", extension.name());
            }
            allowed
        });
        registry.load_modules(allowed);

        let default_scene = manifest.default_scene.clone();
        let mut engine = Self::new(manifest, registry, project_dir)?;
        engine.change_scene(&default_scene)?;
        Ok(engine)
    }

    /// Read a scene file by name
    pub fn load_scene(&self, name: &str) -> Result<SceneDescriptor, SceneError> {
        let path = resolve_scene_path(&self.project_dir, &self.manifest.scenes_folder, name)?;
        log::debug!("Loading scene '{name}' from {}", path.display());
        SceneDescriptor::load(path)
    }

    /// Build an unattached subtree in the engine's tree
    pub fn instantiate(&mut self, descriptor: SceneDescriptor) -> Result<NodeId, SceneError> {
        scene::instantiate(&mut self.tree, &self.registry, descriptor)
    }

    /// Replace the current scene with the named scene file
    pub fn change_scene(&mut self, name: &str) -> Result<NodeId, SceneError> {
        let descriptor = self.load_scene(name)?;
        self.change_scene_to(descriptor)
    }

    /// Replace the current scene with a new one built from `descriptor`
    ///
    /// The new scene is fully built before the old one is detached. If
    /// attaching it fails the old scene is put back and the error returned.
    pub fn change_scene_to(&mut self, descriptor: SceneDescriptor) -> Result<NodeId, SceneError> {
        let name = descriptor.name.clone();
        let incoming = self.instantiate(descriptor)?;
        let root = self.tree.root();
        let outgoing = self.scene;

        if let Err(err) = self.tree.detach(root, outgoing) {
            self.discard(incoming);
            return Err(err.into());
        }

        if let Err(err) = self.tree.attach(root, incoming) {
            log::error!("Scene '{name}' failed to attach, restoring the previous scene: {err}");
            self.discard(incoming);
            if let Err(restore_err) = self.tree.attach(root, outgoing) {
                log::error!("Previous scene could not be restored: {restore_err}");
            }
            return Err(err.into());
        }

        self.scene = incoming;
        self.discard(outgoing);
        log::info!("Scene changed to '{name}'");
        Ok(incoming)
    }

    fn discard(&mut self, id: NodeId) {
        if let Err(err) = self.tree.free(id) {
            log::warn!("Failed to free subtree {id:?}: {err}");
        }
    }

    /// Run iterations until the quit signal is seen
    pub fn run(&mut self) {
        log::info!("Starting main loop at {} ticks/s", self.manifest.tps);
        self.state = EngineState::Running;
        self.update_clock.restart();

        let frame_budget = self
            .manifest
            .target_fps
            .map(|fps| Duration::from_nanos(1_000_000_000 / u64::from(fps.max(1))));
        let mut frame_clock = Stopwatch::new();

        while self.state == EngineState::Running {
            frame_clock.restart();
            self.run_iteration();

            if let Some(budget) = frame_budget {
                let spent = frame_clock.elapsed();
                if spent < budget {
                    std::thread::sleep(budget - spent);
                }
            }
        }

        log::info!(
            "Main loop stopped after {} updates and {} ticks",
            self.stats.update_passes,
            self.stats.tick_passes
        );
    }

    /// Run one iteration with the wall-clock time since the previous one
    pub fn run_iteration(&mut self) {
        if !self.update_clock.is_running() {
            self.update_clock.start();
        }
        let elapsed = self.update_clock.lap();
        self.advance(elapsed);
    }

    /// Run one iteration as if `elapsed` had passed since the previous one
    pub fn advance(&mut self, elapsed: Duration) {
        if self.quit.is_raised() {
            self.state = EngineState::Stopped;
        }
        if self.state == EngineState::Stopped {
            return;
        }

        self.run_pass(Hook::Update, elapsed.as_secs_f64());
        self.stats.update_passes += 1;
        self.apply_commands();

        let dropped_before = self.fixed_step.dropped_steps();
        let ticks = self.fixed_step.advance(elapsed);
        self.stats.dropped_ticks += self.fixed_step.dropped_steps() - dropped_before;

        let interval = self.fixed_step.interval_secs();
        for _ in 0..ticks {
            self.run_pass(Hook::Tick, interval);
            self.stats.tick_passes += 1;
            self.apply_commands();
        }

        if self.quit.is_raised() {
            log::info!("Quit requested");
            self.state = EngineState::Stopped;
        }
    }

    fn run_pass(&mut self, hook: Hook, delta: f64) {
        for id in self.tree.snapshot(self.tree.root(), true) {
            let outcome = self.tree.with_behavior(id, |behavior, ctx| {
                panic::catch_unwind(AssertUnwindSafe(|| -> HookResult {
                    match hook {
                        Hook::Tick => behavior.on_tick(ctx, delta),
                        _ => behavior.on_update(ctx, delta),
                    }
                }))
            });

            let failure = match outcome {
                None | Some(Ok(Ok(()))) => continue,
                Some(Ok(Err(err))) => err.to_string(),
                Some(Err(payload)) => format!("panicked: {}", panic_message(payload.as_ref())),
            };

            self.stats.hook_failures += 1;
            log::error!(
                "{hook} failed on node '{}' ({id:?}): {failure}",
                self.tree.name(id).unwrap_or_default()
            );
        }
    }

    fn apply_commands(&mut self) {
        for _ in 0..MAX_COMMAND_ROUNDS {
            let commands = self.tree.take_commands();
            if commands.is_empty() {
                return;
            }
            for command in commands {
                self.apply(command);
            }
        }
        log::warn!("Deferred commands kept requeueing after {MAX_COMMAND_ROUNDS} rounds");
    }

    fn apply(&mut self, command: Command) {
        log::trace!("Applying {command:?}");
        match command {
            Command::Spawn { parent, name, behavior } => {
                if parent == self.tree.root() {
                    log::warn!("Refusing to spawn '{name}' under the root");
                    return;
                }
                let id = self.tree.insert_boxed(name, behavior);
                if let Err(err) = self.tree.attach(parent, id) {
                    log::warn!("Spawn under {parent:?} failed: {err}");
                    self.discard(id);
                }
            }
            Command::Free(id) => {
                if self.is_pinned(id) {
                    log::warn!("Refusing to free the root or the current scene");
                } else if let Err(err) = self.tree.remove(id) {
                    log::debug!("Free of {id:?} skipped: {err}");
                }
            }
            Command::Reparent { node, new_parent } => {
                if self.is_pinned(node) {
                    log::warn!("Refusing to move the root or the current scene");
                } else if new_parent == self.tree.root() {
                    log::warn!("Refusing to move {node:?} under the root");
                } else if let Err(err) = self.tree.reparent(node, new_parent) {
                    log::warn!("Reparent of {node:?} failed: {err}");
                }
            }
            Command::ChangeScene(name) => {
                if let Err(err) = self.change_scene(&name) {
                    log::error!("Scene change to '{name}' failed: {err}");
                }
            }
            Command::Quit => self.quit.raise(),
        }
    }

    fn is_pinned(&self, id: NodeId) -> bool {
        id == self.tree.root() || id == self.scene
    }

    /// Handle that stops the loop when raised
    pub fn quit_handle(&self) -> QuitHandle {
        self.quit.clone()
    }

    /// Request engine shutdown
    pub fn quit(&self) {
        self.quit.raise();
    }

    /// Loop state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Pass counters
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// The permanent root
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// The current scene
    pub fn scene(&self) -> NodeId {
        self.scene
    }

    /// The live tree
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Mutable access to the live tree
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// The type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The project manifest
    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    /// The project directory scenes are resolved against
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Behavior, HookError, NodeContext};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Counter {
        updates: u32,
        ticks: u32,
        last_tick_delta: f64,
    }

    impl Behavior for Counter {
        fn on_update(&mut self, _ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
            self.updates += 1;
            Ok(())
        }

        fn on_tick(&mut self, _ctx: &NodeContext<'_>, delta: f64) -> HookResult {
            self.ticks += 1;
            self.last_tick_delta = delta;
            Ok(())
        }
    }

    struct Faulty {
        panic: bool,
    }

    impl Behavior for Faulty {
        fn on_update(&mut self, _ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
            if self.panic {
                panic!("boom");
            }
            Err(HookError::failed("broken"))
        }
    }

    struct Spawner;

    impl Behavior for Spawner {
        fn on_update(&mut self, ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
            ctx.spawn_child("Spawned", BaseNode);
            Ok(())
        }
    }

    struct Intruder {
        move_self: bool,
    }

    impl Behavior for Intruder {
        fn on_update(&mut self, ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
            let root = ctx.tree().root();
            if self.move_self {
                ctx.reparent(ctx.id(), root);
            } else {
                ctx.spawn(root, "Intruder", BaseNode);
            }
            Ok(())
        }
    }

    fn engine(tps: u32) -> Engine {
        let manifest = ProjectManifest::new("test", "main").with_tps(tps);
        Engine::new(manifest, TypeRegistry::with_builtins(), std::env::temp_dir()).unwrap()
    }

    fn add(engine: &mut Engine, name: &str, behavior: impl Behavior) -> NodeId {
        let scene = engine.scene();
        let tree = engine.tree_mut();
        let id = tree.insert(name, behavior);
        tree.attach(scene, id).unwrap();
        id
    }

    #[test]
    fn test_new_engine_has_placeholder_scene() {
        let engine = engine(60);
        assert_eq!(engine.tree().children(engine.root()), &[engine.scene()]);
        assert_eq!(engine.tree().name(engine.scene()), Some(PLACEHOLDER_SCENE_NAME));
        assert_eq!(engine.state(), EngineState::Running);
    }

    #[test]
    fn test_tick_count_tracks_simulated_time() {
        let mut engine = engine(50);
        let counter = add(&mut engine, "Counter", Counter::default());

        for _ in 0..300 {
            engine.advance(Duration::from_millis(7));
        }

        let counter = engine.tree().behavior::<Counter>(counter).unwrap();
        assert_eq!(counter.updates, 300);
        // 2.1 s at 50 ticks/s
        assert!((i64::from(counter.ticks) - 105).abs() <= 1, "ticks: {}", counter.ticks);
        assert_relative_eq!(counter.last_tick_delta, 0.02);
    }

    #[test]
    fn test_failing_update_is_isolated() {
        let mut engine = engine(60);
        add(&mut engine, "Broken", Faulty { panic: false });
        add(&mut engine, "Panicky", Faulty { panic: true });
        let counter = add(&mut engine, "Counter", Counter::default());

        engine.advance(Duration::from_millis(1));
        engine.advance(Duration::from_millis(1));

        assert_eq!(engine.tree().behavior::<Counter>(counter).unwrap().updates, 2);
        assert_eq!(engine.stats().hook_failures, 4);
        assert!(engine.tree().behavior::<Faulty>(engine.tree().children(engine.scene())[1]).is_some());
    }

    #[test]
    fn test_spawned_nodes_appear_after_the_pass() {
        let mut engine = engine(60);
        let spawner = add(&mut engine, "Spawner", Spawner);

        engine.advance(Duration::from_millis(1));
        assert_eq!(engine.tree().children(spawner).len(), 1);

        engine.advance(Duration::from_millis(1));
        assert_eq!(engine.tree().children(spawner).len(), 2);
    }

    #[test]
    fn test_quit_stops_iterations() {
        let mut engine = engine(60);
        let counter = add(&mut engine, "Counter", Counter::default());

        engine.quit_handle().raise();
        engine.advance(Duration::from_millis(1));
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.tree().behavior::<Counter>(counter).unwrap().updates, 0);

        engine.run();
        assert_eq!(engine.stats().update_passes, 0);
    }

    #[test]
    fn test_scene_and_root_cannot_be_freed_by_hooks() {
        let mut engine = engine(60);
        let scene = engine.scene();
        let root = engine.root();
        engine.tree().queue(Command::Free(scene));
        engine.tree().queue(Command::Free(root));
        engine.advance(Duration::from_millis(1));

        assert!(engine.tree().contains(scene));
        assert_eq!(engine.tree().children(root), &[scene]);
    }

    #[test]
    fn test_change_scene_swaps_subtree() {
        let mut engine = engine(60);
        let old = engine.scene();

        let new = engine
            .change_scene_to(SceneDescriptor::new("Level").with_child(SceneDescriptor::new("Player")))
            .unwrap();

        assert_eq!(engine.scene(), new);
        assert!(!engine.tree().contains(old));
        assert_eq!(engine.tree().children(engine.root()), &[new]);
        assert_eq!(engine.tree().len(), 3);
    }

    #[test]
    fn test_missing_scene_file_keeps_current_scene() {
        let mut engine = engine(60);
        let old = engine.scene();

        let result = engine.change_scene("does_not_exist");
        assert!(matches!(result, Err(SceneError::SceneNotFound(_))));
        assert_eq!(engine.scene(), old);
    }

    #[test]
    fn test_hooks_cannot_spawn_under_root() {
        let mut engine = engine(60);
        add(&mut engine, "Spawner", Intruder { move_self: false });
        let before = engine.tree().len();

        engine.advance(Duration::from_millis(1));
        engine.advance(Duration::from_millis(1));

        assert_eq!(engine.tree().children(engine.root()), &[engine.scene()]);
        assert_eq!(engine.tree().len(), before);
    }

    #[test]
    fn test_hooks_cannot_move_nodes_under_root() {
        let mut engine = engine(60);
        let mover = add(&mut engine, "Mover", Intruder { move_self: true });

        engine.advance(Duration::from_millis(1));
        assert_eq!(engine.tree().children(engine.root()), &[engine.scene()]);
        assert_eq!(engine.tree().parent(mover), Some(engine.scene()));

        let next = engine.change_scene_to(SceneDescriptor::new("Next")).unwrap();
        assert_eq!(engine.tree().children(engine.root()), &[next]);
        assert!(!engine.tree().contains(mover));
    }
}
