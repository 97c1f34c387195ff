//! Mouse-following circle that leaves a trail of fading circles

use real_engine::prelude::*;

/// Trail circles shrink by this share of their radius per sqrt-second
const FADE_RATE: f64 = 0.4;

/// Radius below which a trail circle is removed
const MIN_RADIUS: f64 = 1.0;

/// Scale from pointer speed to circle area
const SPEED_TO_AREA: f64 = 10_000.0;

/// Module with the trail shapes
pub struct Krys;

impl Extension for Krys {
    fn name(&self) -> &str {
        "krys"
    }

    fn register(&self, registrar: &mut ModuleRegistrar<'_>) -> Result<(), RegistryError> {
        registrar
            .node(MouseCircle::node_type())?
            .node(FadingCircle::node_type())?;
        Ok(())
    }
}

/// Circle that follows the pointer; its radius grows with pointer speed
///
/// While Space is held, every update drops a [`FadingCircle`] at the
/// current position.
pub struct MouseCircle {
    circle: Circle,
    last_mouse: Option<Vec2>,
}

impl MouseCircle {
    fn node_type() -> NodeType {
        NodeType::builder::<Self>("MouseCircle")
            .param("radius", ValueKind::Float)
            .param_with_default("color", ValueKind::Color, "#FFFFFF")
            .build(|args| {
                Ok(Self {
                    circle: Circle::new(args.float("radius")?, args.color("color")?),
                    last_mouse: None,
                })
            })
    }
}

impl Behavior for MouseCircle {
    fn on_update(&mut self, ctx: &NodeContext<'_>, _delta: f64) -> HookResult {
        let Some(window) = ctx.window() else {
            return Ok(());
        };
        self.circle.transform.position = window.mouse_position();

        if window.is_pressed(Key::Space) {
            let mut circle = Circle::new(self.circle.radius, Color::WHITE);
            circle.transform.position = self.circle.transform.position;
            ctx.spawn_child("Trail", FadingCircle { circle });
        }
        Ok(())
    }

    fn on_tick(&mut self, _ctx: &NodeContext<'_>, delta: f64) -> HookResult {
        let position = self.circle.transform.position;
        let moved = self.last_mouse.map_or(0.0, |last| (position - last).norm());
        self.last_mouse = Some(position);
        self.circle.radius = (moved * delta * SPEED_TO_AREA).sqrt();
        Ok(())
    }

    fn renderable(&self) -> Option<&dyn Renderable> {
        Some(&self.circle)
    }
}

/// Circle that shrinks every update and removes itself once tiny
pub struct FadingCircle {
    circle: Circle,
}

impl FadingCircle {
    fn node_type() -> NodeType {
        NodeType::builder::<Self>("FadingCircle")
            .param("radius", ValueKind::Float)
            .param_with_default("color", ValueKind::Color, "#FFFFFF")
            .property("position", ValueKind::Vec2, |fading, arg| {
                fading.circle.transform.position = arg.into_vec2()?;
                Ok(())
            })
            .build(|args| {
                Ok(Self {
                    circle: Circle::new(args.float("radius")?, args.color("color")?),
                })
            })
    }

    /// Current radius
    pub fn radius(&self) -> f64 {
        self.circle.radius
    }
}

impl Behavior for FadingCircle {
    fn on_update(&mut self, ctx: &NodeContext<'_>, delta: f64) -> HookResult {
        self.circle.radius *= 1.0 - FADE_RATE * delta.sqrt();
        if self.circle.radius < MIN_RADIUS {
            ctx.queue_free_self();
        }
        Ok(())
    }

    fn accepts_children(&self) -> bool {
        false
    }

    fn renderable(&self) -> Option<&dyn Renderable> {
        Some(&self.circle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn engine() -> Engine {
        let mut registry = real_engine::registry::TypeRegistry::with_builtins();
        registry.load_module(&Krys).unwrap();
        Engine::new(ProjectManifest::new("demo", "main"), registry, std::env::temp_dir()).unwrap()
    }

    #[test]
    fn test_fading_circle_shrinks_then_frees_itself() {
        let mut engine = engine();
        let scene = engine
            .change_scene_to(
                SceneDescriptor::new("Main")
                    .with_child(SceneDescriptor::new("Fade").with_type("FadingCircle").with_param("radius", 4)),
            )
            .unwrap();
        let fade = engine.tree().children(scene)[0];

        engine.advance(Duration::from_millis(250));
        assert_relative_eq!(engine.tree().behavior::<FadingCircle>(fade).unwrap().radius(), 3.2, epsilon = 1e-9);

        for _ in 0..20 {
            engine.advance(Duration::from_millis(250));
        }
        assert!(!engine.tree().contains(fade));
        assert!(engine.tree().children(scene).is_empty());
    }

    #[test]
    fn test_mouse_circle_follows_pointer_and_drops_trail() {
        let mut engine = engine();
        let scene = engine
            .change_scene_to(
                SceneDescriptor::new("Main")
                    .with_type("Window")
                    .with_child(SceneDescriptor::new("Pointer").with_type("MouseCircle").with_param("radius", 10)),
            )
            .unwrap();
        let pointer = engine.tree().children(scene)[0];

        let sender = engine.tree().behavior::<Window>(scene).unwrap().input_sender().unwrap();
        sender.send(real_engine::input::InputEvent::MouseMoved(Vec2::new(12.0, 7.0)));
        sender.tap(Key::Space);
        engine.advance(Duration::from_millis(1));

        let circle = engine.tree().behavior::<MouseCircle>(pointer).unwrap();
        assert_eq!(circle.circle.transform.position, Vec2::new(12.0, 7.0));
        assert_eq!(engine.tree().children(pointer).len(), 1);

        let trail = engine.tree().children(pointer)[0];
        let trail = engine.tree().behavior::<FadingCircle>(trail).unwrap();
        assert_eq!(trail.circle.transform.position, Vec2::new(12.0, 7.0));
    }
}
