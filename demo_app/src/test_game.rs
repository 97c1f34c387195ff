//! Small scripted scene: a crawling character, a spinning label and a
//! player script that switches scenes

use std::f64::consts::TAU;

use real_engine::foundation::math::Transform2D;
use real_engine::foundation::time::Stopwatch;
use real_engine::nodes::transform2d_properties;
use real_engine::prelude::*;

/// Characters per second
const SNEK_SPEED: f64 = 1.0;

/// Row the snek crawls along
const SNEK_ROW: f64 = 5.0;

/// Rotations per second
const SPIN_RATE: f64 = 1.0;

/// Module with the test game scripts
pub struct TestGame;

impl Extension for TestGame {
    fn name(&self) -> &str {
        "test_game"
    }

    fn register(&self, registrar: &mut ModuleRegistrar<'_>) -> Result<(), RegistryError> {
        registrar
            .node(Snek::node_type())?
            .node(SpinText::node_type())?
            .node(PlayerScript::node_type())?;
        Ok(())
    }
}

/// Console character that crawls right along a fixed row
#[derive(Debug, Default)]
pub struct Snek {
    glyph: ConsoleCharacter,
}

impl Snek {
    fn node_type() -> NodeType {
        transform2d_properties(NodeType::builder::<Self>("Snek"))
            .property("character", ValueKind::Char, |snek, arg| {
                snek.glyph.character = arg.into_char()?;
                Ok(())
            })
            .property("color", ValueKind::Color, |snek, arg| {
                snek.glyph.color = arg.into_color()?;
                Ok(())
            })
            .build(|_| Ok(Self::default()))
    }
}

impl Spatial2D for Snek {
    fn transform(&self) -> &Transform2D {
        &self.glyph.transform
    }

    fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.glyph.transform
    }
}

impl Behavior for Snek {
    fn on_tick(&mut self, _ctx: &NodeContext<'_>, delta: f64) -> HookResult {
        let position = &mut self.glyph.transform.position;
        position.x += SNEK_SPEED * delta;
        position.y = SNEK_ROW;
        Ok(())
    }

    fn renderable(&self) -> Option<&dyn Renderable> {
        Some(&self.glyph)
    }
}

/// Label turning at a constant rate
#[derive(Debug, Default)]
pub struct SpinText {
    label: Text,
}

impl SpinText {
    fn node_type() -> NodeType {
        transform2d_properties(NodeType::builder::<Self>("SpinText"))
            .property("text", ValueKind::String, |spin, arg| {
                spin.label.text = arg.into_string()?;
                Ok(())
            })
            .property("font_colour", ValueKind::Color, |spin, arg| {
                spin.label.font_colour = arg.into_color()?;
                Ok(())
            })
            .build(|_| Ok(Self::default()))
    }
}

impl Spatial2D for SpinText {
    fn transform(&self) -> &Transform2D {
        &self.label.transform
    }

    fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.label.transform
    }
}

impl Behavior for SpinText {
    fn on_tick(&mut self, _ctx: &NodeContext<'_>, delta: f64) -> HookResult {
        self.label.transform.rotation += SPIN_RATE * delta * TAU;
        Ok(())
    }

    fn renderable(&self) -> Option<&dyn Renderable> {
        Some(&self.label)
    }
}

/// Switches to `next_scene` after `delay` seconds; Escape quits
pub struct PlayerScript {
    next_scene: String,
    delay: f64,
    clock: Stopwatch,
    switched: bool,
}

impl PlayerScript {
    fn node_type() -> NodeType {
        NodeType::builder::<Self>("PlayerScript")
            .param_with_default("next_scene", ValueKind::String, "scene2")
            .param_with_default("delay", ValueKind::Float, 3.0)
            .build(|args| {
                Ok(Self {
                    next_scene: args.string("next_scene")?,
                    delay: args.float("delay")?,
                    clock: Stopwatch::new(),
                    switched: false,
                })
            })
    }
}

impl Behavior for PlayerScript {
    fn on_ready(&mut self, _ctx: &NodeContext<'_>) -> HookResult {
        self.clock.restart();
        self.switched = false;
        Ok(())
    }

    fn on_update(&mut self, ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
        log::trace!("Player update");

        if ctx.window().is_some_and(|window| window.is_just_pressed(Key::Escape)) {
            ctx.quit();
            return Ok(());
        }

        if !self.switched && self.clock.elapsed().as_secs_f64() > self.delay {
            log::info!("Switching to '{}'", self.next_scene);
            ctx.change_scene(self.next_scene.clone());
            self.switched = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn engine() -> Engine {
        let mut registry = real_engine::registry::TypeRegistry::with_builtins();
        registry.load_module(&TestGame).unwrap();
        Engine::new(ProjectManifest::new("demo", "main").with_tps(10), registry, std::env::temp_dir()).unwrap()
    }

    #[test]
    fn test_snek_crawls_along_its_row() {
        let mut engine = engine();
        let scene = engine
            .change_scene_to(SceneDescriptor::new("Main").with_child(SceneDescriptor::new("Snek").with_type("Snek")))
            .unwrap();
        let snek = engine.tree().children(scene)[0];

        engine.advance(Duration::from_millis(1000));

        let position = engine.tree().behavior::<Snek>(snek).unwrap().glyph.transform.position;
        assert_relative_eq!(position.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(position.y, SNEK_ROW);
    }

    #[test]
    fn test_spin_text_turns_once_per_second() {
        let mut engine = engine();
        let scene = engine
            .change_scene_to(
                SceneDescriptor::new("Main")
                    .with_child(SceneDescriptor::new("Label").with_type("SpinText").with_param("text", "hi")),
            )
            .unwrap();
        let label = engine.tree().children(scene)[0];

        for _ in 0..10 {
            engine.advance(Duration::from_millis(100));
        }

        let spin = engine.tree().behavior::<SpinText>(label).unwrap();
        assert_eq!(spin.label.text, "hi");
        assert_relative_eq!(spin.label.transform.rotation, TAU, epsilon = 1e-9);
    }

    #[test]
    fn test_player_escape_quits() {
        let mut engine = engine();
        let scene = engine
            .change_scene_to(
                SceneDescriptor::new("Main")
                    .with_type("Window")
                    .with_child(SceneDescriptor::new("Player").with_type("PlayerScript").with_param("delay", 60)),
            )
            .unwrap();

        let sender = engine.tree().behavior::<Window>(scene).unwrap().input_sender().unwrap();
        sender.tap(Key::Escape);
        engine.advance(Duration::from_millis(10));

        assert_eq!(engine.state(), EngineState::Stopped);
    }
}
