//! Declared value → typed argument conversion

use std::collections::BTreeMap;

use crate::foundation::color::Color;
use crate::foundation::math::{Vec2, Vec3};
use crate::registry::{Arg, TypeRegistry, Value, ValueError, ValueKind};

use super::SceneError;

/// Reference kind that creates a fresh object
pub const NEW_REFERENCE: &str = "new";

/// Convert `value` to `kind` for `target` on `node`
///
/// Strings of the form `<kind>::<payload>` are reference expressions unless
/// `kind` is textual. `new::<Type>` creates a fresh instance of a registered
/// object type; any other reference kind is rejected.
pub fn convert(
    value: &Value,
    kind: ValueKind,
    registry: &TypeRegistry,
    node: &str,
    target: &str,
) -> Result<Arg, SceneError> {
    if let Value::String(text) = value {
        if !kind.is_textual() {
            if let Some((reference, payload)) = text.split_once("::") {
                return resolve_reference(text, reference, payload, kind, registry, node, target);
            }
        }
    }

    coerce(value, kind).map_err(|source| SceneError::InvalidValue {
        node: node.to_string(),
        target: target.to_string(),
        source,
    })
}

fn resolve_reference(
    expression: &str,
    reference: &str,
    payload: &str,
    kind: ValueKind,
    registry: &TypeRegistry,
    node: &str,
    target: &str,
) -> Result<Arg, SceneError> {
    if reference != NEW_REFERENCE {
        return Err(SceneError::UnknownReferenceKind {
            kind: reference.to_string(),
            expression: expression.to_string(),
        });
    }

    let type_name = payload.trim();
    let Some(instance) = registry.create_object(type_name) else {
        if registry.node_type(type_name).is_some() {
            return Err(SceneError::NotConstructible(type_name.to_string()));
        }
        return Err(SceneError::TypeNotFound(type_name.to_string()));
    };

    if kind != ValueKind::Object {
        return Err(SceneError::InvalidValue {
            node: node.to_string(),
            target: target.to_string(),
            source: ValueError::new(kind, format!("object {type_name}")),
        });
    }

    log::trace!("Created '{type_name}' for '{target}' on '{node}'");
    Ok(Arg::Object {
        type_name: type_name.to_string(),
        instance,
    })
}

/// Coerce a literal to `kind`
pub(crate) fn coerce(value: &Value, kind: ValueKind) -> Result<Arg, ValueError> {
    let mismatch = || ValueError::new(kind, value.describe());

    let arg = match (kind, value) {
        (ValueKind::Bool, Value::Bool(b)) => Arg::Bool(*b),
        (ValueKind::Bool, Value::String(s)) => Arg::Bool(s.trim().parse().map_err(|_| mismatch())?),

        (ValueKind::Int, Value::Int(i)) => Arg::Int(*i),
        (ValueKind::Int, Value::Float(f)) => Arg::Int(float_to_int(*f).ok_or_else(mismatch)?),
        (ValueKind::Int, Value::String(s)) => Arg::Int(s.trim().parse().map_err(|_| mismatch())?),

        (ValueKind::Float, Value::String(s)) => Arg::Float(s.trim().parse().map_err(|_| mismatch())?),
        (ValueKind::Float, number) => Arg::Float(number.as_f64().ok_or_else(mismatch)?),

        (ValueKind::String, Value::String(s)) => Arg::String(s.clone()),
        (ValueKind::String, Value::Bool(b)) => Arg::String(b.to_string()),
        (ValueKind::String, Value::Int(i)) => Arg::String(i.to_string()),
        (ValueKind::String, Value::Float(f)) => Arg::String(f.to_string()),

        (ValueKind::Char, Value::String(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Arg::Char(c),
                _ => return Err(mismatch()),
            }
        }

        (ValueKind::Color, Value::String(s)) => Arg::Color(Color::parse(s).map_err(|_| mismatch())?),
        (ValueKind::Color, Value::List(items)) => Arg::Color(color_from_list(items).ok_or_else(mismatch)?),
        (ValueKind::Color, Value::Map(map)) => Arg::Color(color_from_map(map).ok_or_else(mismatch)?),

        (ValueKind::Vec2, Value::List(items)) => {
            let [x, y] = numbers::<2>(items).ok_or_else(mismatch)?;
            Arg::Vec2(Vec2::new(x, y))
        }
        (ValueKind::Vec2, Value::Map(map)) => {
            let [x, y] = fields(map, ["x", "y"]).ok_or_else(mismatch)?;
            Arg::Vec2(Vec2::new(x, y))
        }

        (ValueKind::Vec3, Value::List(items)) => {
            let [x, y, z] = numbers::<3>(items).ok_or_else(mismatch)?;
            Arg::Vec3(Vec3::new(x, y, z))
        }
        (ValueKind::Vec3, Value::Map(map)) => {
            let [x, y, z] = fields(map, ["x", "y", "z"]).ok_or_else(mismatch)?;
            Arg::Vec3(Vec3::new(x, y, z))
        }

        (ValueKind::List, Value::List(items)) => Arg::List(items.clone()),

        _ => return Err(mismatch()),
    };
    Ok(arg)
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_int(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value <= i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn numbers<const N: usize>(items: &[Value]) -> Option<[f64; N]> {
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(out)
}

fn fields<const N: usize>(map: &BTreeMap<String, Value>, names: [&str; N]) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = map.get(name)?.as_f64()?;
    }
    Some(out)
}

fn channel(value: &Value) -> Option<u8> {
    match value {
        Value::Int(i) => u8::try_from(*i).ok(),
        _ => None,
    }
}

fn color_from_list(items: &[Value]) -> Option<Color> {
    let channels: Option<Vec<u8>> = items.iter().map(channel).collect();
    match channels?.as_slice() {
        [r, g, b] => Some(Color::rgb(*r, *g, *b)),
        [r, g, b, a] => Some(Color::rgba(*r, *g, *b, *a)),
        _ => None,
    }
}

fn color_from_map(map: &BTreeMap<String, Value>) -> Option<Color> {
    let get = |name: &str| map.get(name).and_then(channel);
    let alpha = match map.get("a") {
        Some(value) => channel(value)?,
        None => 255,
    };
    Some(Color::rgba(get("r")?, get("g")?, get("b")?, alpha))
}
