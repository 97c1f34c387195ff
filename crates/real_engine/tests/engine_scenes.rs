//! Engine-level scene loading, lifecycle and loop behavior

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use approx::assert_relative_eq;
use real_engine::prelude::*;
use real_engine::registry::Value;

type Journal = Arc<Mutex<Vec<String>>>;

struct Recorder {
    journal: Journal,
    fail_ready: bool,
}

impl Behavior for Recorder {
    fn on_ready(&mut self, ctx: &NodeContext<'_>) -> HookResult {
        self.journal.lock().unwrap().push(format!("ready {}", ctx.name()));
        if self.fail_ready {
            return Err(HookError::failed("refusing to start"));
        }
        Ok(())
    }

    fn on_leave(&mut self, ctx: &NodeContext<'_>) -> HookResult {
        self.journal.lock().unwrap().push(format!("leave {}", ctx.name()));
        Ok(())
    }
}

struct Faulty;

impl Behavior for Faulty {
    fn on_update(&mut self, _ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
        Err(HookError::failed("always broken"))
    }
}

#[derive(Default)]
struct Ticker {
    ticks: u32,
    elapsed: f64,
}

impl Behavior for Ticker {
    fn on_tick(&mut self, _ctx: &NodeContext<'_>, delta: f64) -> HookResult {
        self.ticks += 1;
        self.elapsed += delta;
        Ok(())
    }
}

struct Holder {
    payload: Vec<i64>,
}

impl Behavior for Holder {}

struct TestModule {
    journal: Journal,
}

impl Extension for TestModule {
    fn name(&self) -> &str {
        "test"
    }

    fn register(&self, registrar: &mut ModuleRegistrar<'_>) -> Result<(), RegistryError> {
        let journal = self.journal.clone();
        registrar
            .node(
                NodeType::builder::<Recorder>("Recorder")
                    .param_with_default("fail_ready", ValueKind::Bool, false)
                    .build(move |args| {
                        Ok(Recorder {
                            journal: journal.clone(),
                            fail_ready: args.bool("fail_ready")?,
                        })
                    }),
            )?
            .node(NodeType::builder::<Faulty>("Faulty").build(|_| Ok(Faulty)))?
            .node(NodeType::builder::<Ticker>("Ticker").build(|_| Ok(Ticker::default())))?
            .node(
                NodeType::builder::<Holder>("Holder")
                    .param_with_default("payload", ValueKind::Object, "new::Payload")
                    .build(|args| {
                        Ok(Holder {
                            payload: args.object::<Vec<i64>>("payload")?,
                        })
                    }),
            )?
            .object(ObjectType::new("Payload", || vec![1_i64, 2, 3]))?;
        Ok(())
    }
}

struct Project {
    dir: PathBuf,
}

impl Project {
    fn new(tag: &str, manifest: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("real_engine_it_{}_{tag}", std::process::id()));
        std::fs::create_dir_all(dir.join("Scenes")).unwrap();
        std::fs::write(dir.join("project.toml"), manifest).unwrap();
        Self { dir }
    }

    fn scene(&self, name: &str, text: &str) -> &Self {
        std::fs::write(self.dir.join("Scenes").join(name), text).unwrap();
        self
    }

    fn boot(&self, journal: &Journal) -> Result<Engine, EngineError> {
        let manifest = ProjectManifest::discover(&self.dir)?.expect("manifest present");
        let module = TestModule {
            journal: journal.clone(),
        };
        Engine::bootstrap(manifest, &self.dir, &[&module])
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn engine_with_module(journal: &Journal) -> Engine {
    let mut registry = real_engine::registry::TypeRegistry::with_builtins();
    registry
        .load_module(&TestModule {
            journal: journal.clone(),
        })
        .unwrap();
    Engine::new(ProjectManifest::new("test", "main"), registry, std::env::temp_dir()).unwrap()
}

#[test]
fn test_bootstrap_loads_default_scene_from_project() {
    let project = Project::new("boot", "name = \"Boot\"\ndefault_scene = \"main\"\ntps = 20\n");
    project.scene(
        "main.ron",
        r##"(
            name: "Main",
            type: "Recorder",
            children: [
                (name: "A", type: "Recorder", children: [
                    (name: "Dot", type: "Circle", params: { "radius": 5, "color": "#FF0000" }),
                ]),
            ],
        )"##,
    );

    let journal = journal();
    let engine = project.boot(&journal).unwrap();

    let tree = engine.tree();
    let main = engine.scene();
    assert_eq!(tree.parent(main), Some(engine.root()));
    assert_eq!(tree.name(main), Some("Main"));
    assert!(tree.is_live(main));

    let a = tree.children(main)[0];
    let dot = tree.behavior::<Circle>(tree.children(a)[0]).unwrap();
    assert_relative_eq!(dot.radius, 5.0);
    assert_eq!(dot.color, Color::RED);

    assert_eq!(*journal.lock().unwrap(), ["ready Main", "ready A"]);
    assert_eq!(engine.manifest().tps, 20);
    assert_eq!(engine.registry().modules(), ["builtin", "test"]);
}

#[test]
fn test_bootstrap_skips_extensions_not_in_the_manifest() {
    let project = Project::new(
        "allow",
        "default_scene = \"main\"\nextensions = [\"other\"]\n",
    );
    project.scene("main.json", r#"{"name": "Main", "type": "Recorder"}"#);

    let result = project.boot(&journal());
    assert!(matches!(
        result,
        Err(EngineError::Scene(SceneError::TypeNotFound(ref name))) if name == "Recorder"
    ));
}

#[test]
fn test_unknown_type_attaches_nothing() {
    let journal = journal();
    let mut engine = engine_with_module(&journal);
    let before = engine.tree().len();
    let old_scene = engine.scene();

    let descriptor = SceneDescriptor::new("Main")
        .with_type("Recorder")
        .with_child(SceneDescriptor::new("Ghost").with_type("DoesNotExist"));

    let result = engine.change_scene_to(descriptor);
    assert!(matches!(result, Err(SceneError::TypeNotFound(ref name)) if name == "DoesNotExist"));
    assert_eq!(engine.tree().len(), before);
    assert_eq!(engine.scene(), old_scene);
    assert!(journal.lock().unwrap().is_empty());
}

#[test]
fn test_unknown_property_is_reported() {
    let journal = journal();
    let mut engine = engine_with_module(&journal);

    let descriptor = SceneDescriptor::new("Main").with_child(
        SceneDescriptor::new("Dot")
            .with_type("Circle")
            .with_param("radius", 1)
            .with_param("glow", true),
    );

    let result = engine.change_scene_to(descriptor);
    assert!(matches!(
        result,
        Err(SceneError::UnknownProperty { ref property, ref type_name, .. })
            if property == "glow" && type_name == "Circle"
    ));
}

#[test]
fn test_ticks_follow_simulated_time() {
    let journal = journal();
    let mut engine = engine_with_module(&journal);
    let scene = engine
        .change_scene_to(SceneDescriptor::new("Main").with_child(SceneDescriptor::new("Clock").with_type("Ticker")))
        .unwrap();
    let clock = engine.tree().children(scene)[0];

    // 60 ticks/s for 2 s of uneven frames
    let frames = [16_u64, 17, 15, 33, 9];
    let mut total = 0;
    while total < 2000 {
        let frame = frames[(total as usize / 7) % frames.len()];
        engine.advance(Duration::from_millis(frame));
        total += frame;
    }

    let ticker = engine.tree().behavior::<Ticker>(clock).unwrap();
    let expected = total as f64 / 1000.0 * 60.0;
    assert!((f64::from(ticker.ticks) - expected).abs() <= 1.0, "{} vs {expected}", ticker.ticks);
    assert_relative_eq!(ticker.elapsed, f64::from(ticker.ticks) / 60.0, epsilon = 1e-6);
    assert_eq!(engine.stats().tick_passes, u64::from(ticker.ticks));
}

#[test]
fn test_update_failure_does_not_stop_other_nodes() {
    let journal = journal();
    let mut engine = engine_with_module(&journal);
    let scene = engine
        .change_scene_to(
            SceneDescriptor::new("Main")
                .with_child(SceneDescriptor::new("Broken").with_type("Faulty"))
                .with_child(SceneDescriptor::new("Clock").with_type("Ticker")),
        )
        .unwrap();
    let clock = engine.tree().children(scene)[1];

    for _ in 0..10 {
        engine.advance(Duration::from_millis(20));
    }

    assert_eq!(engine.stats().update_passes, 10);
    assert_eq!(engine.stats().hook_failures, 10);
    assert!(engine.tree().behavior::<Ticker>(clock).unwrap().ticks >= 11);
    assert_eq!(engine.state(), EngineState::Running);
}

#[test]
fn test_new_references_create_distinct_instances() {
    let journal = journal();
    let mut engine = engine_with_module(&journal);
    let scene = engine
        .change_scene_to(
            SceneDescriptor::new("Main")
                .with_child(SceneDescriptor::new("One").with_type("Holder"))
                .with_child(SceneDescriptor::new("Two").with_type("Holder").with_param(
                    "payload",
                    Value::String("new::Payload".to_string()),
                )),
        )
        .unwrap();

    let tree = engine.tree();
    let one = tree.behavior::<Holder>(tree.children(scene)[0]).unwrap();
    let two = tree.behavior::<Holder>(tree.children(scene)[1]).unwrap();
    assert_eq!(one.payload, [1, 2, 3]);
    assert_eq!(two.payload, [1, 2, 3]);
    assert_ne!(one.payload.as_ptr(), two.payload.as_ptr());
}

#[test]
fn test_failed_scene_switch_restores_previous_scene() {
    let journal = journal();
    let mut engine = engine_with_module(&journal);
    let first = engine
        .change_scene_to(SceneDescriptor::new("First").with_type("Recorder"))
        .unwrap();
    journal.lock().unwrap().clear();

    let result = engine.change_scene_to(
        SceneDescriptor::new("Second")
            .with_type("Recorder")
            .with_param("fail_ready", true),
    );

    assert!(matches!(result, Err(SceneError::Tree(_))));
    assert_eq!(engine.scene(), first);
    assert_eq!(engine.tree().children(engine.root()), &[first]);
    assert!(engine.tree().is_live(first));
    assert_eq!(
        *journal.lock().unwrap(),
        ["leave First", "ready Second", "ready First"]
    );
}

#[test]
fn test_quit_from_outside_stops_the_loop() {
    let journal = journal();
    let mut engine = engine_with_module(&journal);
    let handle = engine.quit_handle();

    engine.advance(Duration::from_millis(5));
    handle.raise();
    engine.run();

    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(engine.stats().update_passes, 1);
}
