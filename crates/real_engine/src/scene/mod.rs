//! # Scenes
//!
//! A scene file is a declarative [`SceneDescriptor`] tree. Instantiating it
//! resolves every type name through the
//! [`TypeRegistry`](crate::registry::TypeRegistry), binds constructor
//! parameters and properties from the declared values and returns the root
//! of a new, unattached subtree.
//!
//! Scene files are RON (`.ron`) or JSON (`.rscene`, `.json`):
//!
//! ```ron
//! (
//!     name: "Main",
//!     type: "Window",
//!     params: { "title": "Demo", "width": 40 },
//!     children: [
//!         (name: "Dot", type: "Circle", params: { "radius": 5, "color": "#FF0000" }),
//!     ],
//! )
//! ```

mod convert;
mod instantiate;

pub use convert::convert;
pub use instantiate::instantiate;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::{Value, ValueError};
use crate::tree::TreeError;

/// Scene file extensions, in lookup order
pub const SCENE_EXTENSIONS: [&str; 3] = ["ron", "rscene", "json"];

/// Scene loading and instantiation errors
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// No node or object type is registered under the name
    #[error("Type '{0}' is not registered")]
    TypeNotFound(String),

    /// A constructor parameter has neither a value nor a default
    #[error("Node '{node}' of type '{type_name}' is missing required parameter '{parameter}'")]
    MissingRequiredParameter {
        /// Parameter name
        parameter: String,
        /// Node name
        node: String,
        /// Type name
        type_name: String,
    },

    /// A declared key matches no parameter and no property
    #[error("Node '{node}' of type '{type_name}' has no property '{property}'")]
    UnknownProperty {
        /// Declared key
        property: String,
        /// Node name
        node: String,
        /// Type name
        type_name: String,
    },

    /// A reference expression uses an unknown kind
    #[error("Unknown reference kind '{kind}' in '{expression}'")]
    UnknownReferenceKind {
        /// Kind before `::`
        kind: String,
        /// Whole expression
        expression: String,
    },

    /// No scene file was found
    #[error("Scene '{0}' not found")]
    SceneNotFound(String),

    /// A `new::` reference names a node type
    #[error("Type '{0}' is a node type and cannot be created with new::")]
    NotConstructible(String),

    /// A declared value does not fit the parameter or property
    #[error("Invalid value for '{target}' on node '{node}': {source}")]
    InvalidValue {
        /// Node name
        node: String,
        /// Parameter or property name
        target: String,
        /// Mismatch details
        #[source]
        source: ValueError,
    },

    /// A scene file could not be parsed
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A scene file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Attaching an instantiated child failed
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Declarative description of a node and its subtree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescriptor {
    /// Node name
    #[serde(alias = "Name")]
    pub name: String,

    /// Registered type name; the plain `Node` type when omitted
    #[serde(rename = "type", alias = "Type", alias = "script", alias = "Script")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Child descriptors in order
    #[serde(alias = "Children", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneDescriptor>,

    /// Declared constructor parameters and properties
    #[serde(alias = "Params", skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl SceneDescriptor {
    /// Descriptor for a plain node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the type name
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Declare a parameter or property value
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Append a child
    pub fn with_child(mut self, child: SceneDescriptor) -> Self {
        self.children.push(child);
        self
    }

    /// Parse RON text
    pub fn from_ron(text: &str) -> Result<Self, String> {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .from_str(text)
            .map_err(|e| e.to_string())
    }

    /// Parse JSON text
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Load a scene file, picking the parser from the extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Self::from_ron(&text),
            Some("rscene" | "json") => Self::from_json(&text),
            _ => Err("unsupported scene file extension".to_string()),
        };

        parsed.map_err(|message| SceneError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Number of descriptors in this tree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// Find the file for scene `name`
///
/// `name` is first tried as a path relative to `project_dir`, then as
/// `<scenes_folder>/<name>.<ext>` for each of [`SCENE_EXTENSIONS`].
pub fn resolve_scene_path(
    project_dir: impl AsRef<Path>,
    scenes_folder: impl AsRef<Path>,
    name: &str,
) -> Result<PathBuf, SceneError> {
    let project_dir = project_dir.as_ref();

    let explicit = project_dir.join(name);
    if explicit.is_file() {
        return Ok(explicit);
    }

    let folder = project_dir.join(scenes_folder);
    SCENE_EXTENSIONS
        .iter()
        .map(|ext| folder.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| SceneError::SceneNotFound(name.to_string()))
}
