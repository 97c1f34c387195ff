//! Declared values and their typed conversions
//!
//! [`Value`] is what a scene file holds, [`ValueKind`] is what a constructor
//! parameter or property asks for, and [`Arg`] is the converted result.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Color;
use crate::foundation::math::{Vec2, Vec3};

/// Untyped value as declared in a scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// String literal or reference expression
    String(String),
    /// Ordered list
    List(Vec<Value>),
    /// String-keyed map
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short description used in conversion errors
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => format!("bool {b}"),
            Self::Int(i) => format!("integer {i}"),
            Self::Float(f) => format!("float {f}"),
            Self::String(s) => format!("string {s:?}"),
            Self::List(items) => format!("list of {}", items.len()),
            Self::Map(entries) => format!("map of {}", entries.len()),
        }
    }

    /// Numeric view of an integer or float
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Kind of value a parameter or property accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i64`
    Int,
    /// `f64`
    Float,
    /// `String`
    String,
    /// `char`
    Char,
    /// [`Color`]
    Color,
    /// [`Vec2`]
    Vec2,
    /// [`Vec3`]
    Vec3,
    /// List of raw values
    List,
    /// Object produced by a `new::` reference
    Object,
}

impl ValueKind {
    /// Whether string values of this kind are taken literally
    pub fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Char)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Char => "char",
            Self::Color => "color",
            Self::Vec2 => "2-vector",
            Self::Vec3 => "3-vector",
            Self::List => "list",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A value that does not fit the requested kind
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {expected}, found {found}")]
pub struct ValueError {
    /// Kind that was asked for
    pub expected: ValueKind,
    /// What was there instead
    pub found: String,
}

impl ValueError {
    /// Create a mismatch error
    pub fn new(expected: ValueKind, found: impl Into<String>) -> Self {
        Self {
            expected,
            found: found.into(),
        }
    }
}

/// Converted, typed argument
pub enum Arg {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// Single character
    Char(char),
    /// Color
    Color(Color),
    /// 2D vector
    Vec2(Vec2),
    /// 3D vector
    Vec3(Vec3),
    /// Raw list
    List(Vec<Value>),
    /// Freshly constructed object, named by its registered type
    Object {
        /// Registered type name
        type_name: String,
        /// The instance
        instance: Box<dyn Any>,
    },
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Char(v) => f.debug_tuple("Char").field(v).finish(),
            Self::Color(v) => f.debug_tuple("Color").field(v).finish(),
            Self::Vec2(v) => f.debug_tuple("Vec2").field(v).finish(),
            Self::Vec3(v) => f.debug_tuple("Vec3").field(v).finish(),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Object { type_name, .. } => f.debug_struct("Object").field("type_name", type_name).finish_non_exhaustive(),
        }
    }
}

impl Arg {
    /// Kind of this argument
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Char(_) => ValueKind::Char,
            Self::Color(_) => ValueKind::Color,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Vec3(_) => ValueKind::Vec3,
            Self::List(_) => ValueKind::List,
            Self::Object { .. } => ValueKind::Object,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        let found = match self {
            Self::Object { type_name, .. } => format!("object {type_name}"),
            other => other.kind().to_string(),
        };
        ValueError::new(expected, found)
    }

    /// Take a boolean
    pub fn into_bool(self) -> Result<bool, ValueError> {
        match self {
            Self::Bool(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    /// Take an integer
    pub fn into_int(self) -> Result<i64, ValueError> {
        match self {
            Self::Int(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Int)),
        }
    }

    /// Take a float; integers widen
    #[allow(clippy::cast_precision_loss)]
    pub fn into_float(self) -> Result<f64, ValueError> {
        match self {
            Self::Float(v) => Ok(v),
            Self::Int(v) => Ok(v as f64),
            other => Err(other.mismatch(ValueKind::Float)),
        }
    }

    /// Take a string
    pub fn into_string(self) -> Result<String, ValueError> {
        match self {
            Self::String(v) => Ok(v),
            Self::Char(c) => Ok(c.to_string()),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    /// Take a character
    pub fn into_char(self) -> Result<char, ValueError> {
        match self {
            Self::Char(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Char)),
        }
    }

    /// Take a color
    pub fn into_color(self) -> Result<Color, ValueError> {
        match self {
            Self::Color(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Color)),
        }
    }

    /// Take a 2D vector
    pub fn into_vec2(self) -> Result<Vec2, ValueError> {
        match self {
            Self::Vec2(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Vec2)),
        }
    }

    /// Take a 3D vector
    pub fn into_vec3(self) -> Result<Vec3, ValueError> {
        match self {
            Self::Vec3(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Vec3)),
        }
    }

    /// Take a raw list
    pub fn into_list(self) -> Result<Vec<Value>, ValueError> {
        match self {
            Self::List(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    /// Take an object of type `T`
    pub fn into_object<T: Any>(self) -> Result<T, ValueError> {
        match self {
            Self::Object { type_name, instance } => instance
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| ValueError::new(ValueKind::Object, format!("object {type_name} of another type"))),
            other => Err(other.mismatch(ValueKind::Object)),
        }
    }
}
