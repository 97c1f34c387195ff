//! # Type Registry
//!
//! Name-based construction without reflection. Every node type a scene can
//! name is registered up front with an ordered list of constructor
//! parameters, a constructor and a set of named property setters. Object
//! types (window backends and similar collaborators) only carry a default
//! constructor; scenes create them with `new::<TypeName>`.
//!
//! Node and object types share one namespace. Types arrive in modules: the
//! built-in module first, then each [`Extension`] in load order. A module
//! that names an existing type is rejected whole.
//!
//! ## Declaring a type
//!
//! ```rust
//! use real_engine::registry::{NodeType, TypeRegistry, ValueKind};
//! use real_engine::node::Behavior;
//!
//! struct Beacon {
//!     period: f64,
//!     label: String,
//! }
//!
//! impl Behavior for Beacon {}
//!
//! let beacon = NodeType::builder::<Beacon>("Beacon")
//!     .param("period", ValueKind::Float)
//!     .param_with_default("label", ValueKind::String, "beacon")
//!     .property("period", ValueKind::Float, |beacon, arg| {
//!         beacon.period = arg.into_float()?;
//!         Ok(())
//!     })
//!     .build(|args| {
//!         Ok(Beacon {
//!             period: args.float("period")?,
//!             label: args.string("label")?,
//!         })
//!     });
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_node(beacon)?;
//! assert!(registry.node_type("Beacon").is_some());
//! # Ok::<(), real_engine::registry::RegistryError>(())
//! ```

mod value;

pub use value::{Arg, Value, ValueError, ValueKind};

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;

use crate::foundation::color::Color;
use crate::foundation::math::{Vec2, Vec3};
use crate::node::Behavior;
use crate::scene::SceneError;

/// Registry errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The type name is already taken
    #[error("Type '{name}' from module '{module}' is already registered")]
    DuplicateType {
        /// Type name
        name: String,
        /// Module that tried to register it
        module: String,
    },

    /// The module reported a failure of its own
    #[error("Module '{module}' failed to register: {message}")]
    Module {
        /// Module name
        module: String,
        /// Reported failure
        message: String,
    },
}

impl RegistryError {
    /// Create a module-reported failure
    pub fn module(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Module {
            module: module.into(),
            message: message.into(),
        }
    }
}

/// Ordered constructor parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, matched case-insensitively
    pub name: String,
    /// Accepted kind
    pub kind: ValueKind,
    /// Declared value used when the scene omits the parameter
    pub default: Option<Value>,
}

type Setter = Box<dyn Fn(&mut dyn Behavior, Arg) -> Result<(), ValueError>>;
type Constructor = Box<dyn Fn(&mut Args) -> Result<Box<dyn Behavior>, SceneError>>;

/// Settable property of a node type
pub struct PropertySpec {
    kind: ValueKind,
    setter: Setter,
}

impl PropertySpec {
    /// Accepted kind
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Assign a converted value
    pub fn apply(&self, behavior: &mut dyn Behavior, arg: Arg) -> Result<(), ValueError> {
        (self.setter)(behavior, arg)
    }
}

/// Constructible node type
pub struct NodeType {
    name: String,
    params: Vec<ParamSpec>,
    properties: BTreeMap<String, PropertySpec>,
    construct: Constructor,
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl NodeType {
    /// Start declaring a node type whose behavior is `T`
    pub fn builder<T: Behavior>(name: impl Into<String>) -> NodeTypeBuilder<T> {
        NodeTypeBuilder {
            name: name.into(),
            params: Vec::new(),
            properties: BTreeMap::new(),
            _behavior: PhantomData,
        }
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constructor parameters in declaration order
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Property by exact name
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    /// Names of all settable properties
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Run the constructor with bound arguments
    pub fn construct(&self, args: &mut Args) -> Result<Box<dyn Behavior>, SceneError> {
        (self.construct)(args)
    }
}

/// Builder returned by [`NodeType::builder`]
pub struct NodeTypeBuilder<T> {
    name: String,
    params: Vec<ParamSpec>,
    properties: BTreeMap<String, PropertySpec>,
    _behavior: PhantomData<fn() -> T>,
}

impl<T: Behavior> NodeTypeBuilder<T> {
    /// Add a required constructor parameter
    pub fn param(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            default: None,
        });
        self
    }

    /// Add a constructor parameter with a declared default
    ///
    /// The default goes through the same conversion as scene values, so
    /// `"new::Headless"` yields a fresh object per node.
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        kind: ValueKind,
        default: impl Into<Value>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            default: Some(default.into()),
        });
        self
    }

    /// Add a settable property
    pub fn property<F>(mut self, name: impl Into<String>, kind: ValueKind, setter: F) -> Self
    where
        F: Fn(&mut T, Arg) -> Result<(), ValueError> + 'static,
    {
        let setter: Setter = Box::new(move |behavior: &mut dyn Behavior, arg: Arg| {
            match behavior.as_any_mut().downcast_mut::<T>() {
                Some(target) => setter(target, arg),
                None => Err(ValueError::new(kind, "a node of another type")),
            }
        });
        self.properties.insert(name.into(), PropertySpec { kind, setter });
        self
    }

    /// Finish with the constructor
    pub fn build<F>(self, construct: F) -> NodeType
    where
        F: Fn(&mut Args) -> Result<T, SceneError> + 'static,
    {
        NodeType {
            name: self.name,
            params: self.params,
            properties: self.properties,
            construct: Box::new(move |args: &mut Args| {
                construct(args).map(|behavior| Box::new(behavior) as Box<dyn Behavior>)
            }),
        }
    }
}

/// Default-constructible collaborator type
pub struct ObjectType {
    name: String,
    factory: Box<dyn Fn() -> Box<dyn Any>>,
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType").field("name", &self.name).finish_non_exhaustive()
    }
}

impl ObjectType {
    /// Declare an object type
    ///
    /// The instance is stored as a `T`; trait-object collaborators use a
    /// boxed trait object such as `Box<dyn WindowBackend>` as `T`.
    pub fn new<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Any,
        F: Fn() -> T + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(move || Box::new(factory()) as Box<dyn Any>),
        }
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a fresh instance
    pub fn create(&self) -> Box<dyn Any> {
        (self.factory)()
    }
}

/// Constructor arguments bound by name
pub struct Args {
    node: String,
    type_name: String,
    values: HashMap<String, Arg>,
}

impl Args {
    /// Empty argument set for `node` of type `type_name`
    pub fn new(node: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            type_name: type_name.into(),
            values: HashMap::new(),
        }
    }

    /// Bind an argument under its declared parameter name
    pub fn insert(&mut self, name: impl Into<String>, arg: Arg) {
        self.values.insert(name.into(), arg);
    }

    /// Name of the node being constructed
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Take an argument
    pub fn take(&mut self, name: &str) -> Result<Arg, SceneError> {
        self.values
            .remove(name)
            .ok_or_else(|| SceneError::MissingRequiredParameter {
                parameter: name.to_string(),
                node: self.node.clone(),
                type_name: self.type_name.clone(),
            })
    }

    fn take_as<R>(&mut self, name: &str, convert: impl FnOnce(Arg) -> Result<R, ValueError>) -> Result<R, SceneError> {
        let arg = self.take(name)?;
        convert(arg).map_err(|source| SceneError::InvalidValue {
            node: self.node.clone(),
            target: name.to_string(),
            source,
        })
    }

    /// Take a boolean
    pub fn bool(&mut self, name: &str) -> Result<bool, SceneError> {
        self.take_as(name, Arg::into_bool)
    }

    /// Take an integer
    pub fn int(&mut self, name: &str) -> Result<i64, SceneError> {
        self.take_as(name, Arg::into_int)
    }

    /// Take a float
    pub fn float(&mut self, name: &str) -> Result<f64, SceneError> {
        self.take_as(name, Arg::into_float)
    }

    /// Take a string
    pub fn string(&mut self, name: &str) -> Result<String, SceneError> {
        self.take_as(name, Arg::into_string)
    }

    /// Take a character
    pub fn char(&mut self, name: &str) -> Result<char, SceneError> {
        self.take_as(name, Arg::into_char)
    }

    /// Take a color
    pub fn color(&mut self, name: &str) -> Result<Color, SceneError> {
        self.take_as(name, Arg::into_color)
    }

    /// Take a 2D vector
    pub fn vec2(&mut self, name: &str) -> Result<Vec2, SceneError> {
        self.take_as(name, Arg::into_vec2)
    }

    /// Take a 3D vector
    pub fn vec3(&mut self, name: &str) -> Result<Vec3, SceneError> {
        self.take_as(name, Arg::into_vec3)
    }

    /// Take a raw list
    pub fn list(&mut self, name: &str) -> Result<Vec<Value>, SceneError> {
        self.take_as(name, Arg::into_list)
    }

    /// Take an object of type `T`
    pub fn object<T: Any>(&mut self, name: &str) -> Result<T, SceneError> {
        self.take_as(name, Arg::into_object::<T>)
    }
}

/// A module of types registered at load time
pub trait Extension {
    /// Module name, matched against the manifest's allow-list
    fn name(&self) -> &str;

    /// Register the module's types
    fn register(&self, registrar: &mut ModuleRegistrar<'_>) -> Result<(), RegistryError>;
}

/// Staging area handed to [`Extension::register`]
///
/// Nothing reaches the registry until the whole module registered cleanly.
pub struct ModuleRegistrar<'a> {
    registry: &'a TypeRegistry,
    module: String,
    nodes: Vec<NodeType>,
    objects: Vec<ObjectType>,
}

impl ModuleRegistrar<'_> {
    /// Name of the module being registered
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Stage a node type
    pub fn node(&mut self, node_type: NodeType) -> Result<&mut Self, RegistryError> {
        self.check_free(node_type.name())?;
        self.nodes.push(node_type);
        Ok(self)
    }

    /// Stage an object type
    pub fn object(&mut self, object_type: ObjectType) -> Result<&mut Self, RegistryError> {
        self.check_free(object_type.name())?;
        self.objects.push(object_type);
        Ok(self)
    }

    fn check_free(&self, name: &str) -> Result<(), RegistryError> {
        let staged = self.nodes.iter().any(|t| t.name() == name) || self.objects.iter().any(|t| t.name() == name);
        if staged || self.registry.contains(name) {
            return Err(RegistryError::DuplicateType {
                name: name.to_string(),
                module: self.module.clone(),
            });
        }
        Ok(())
    }
}

/// Name → type metadata table
#[derive(Debug, Default)]
pub struct TypeRegistry {
    nodes: BTreeMap<String, NodeType>,
    objects: BTreeMap<String, ObjectType>,
    modules: Vec<String>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in node and object types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        if let Err(err) = registry.load_module(&crate::nodes::Builtins) {
            log::error!("Built-in types failed to register: {err}");
        }
        registry
    }

    /// Whether any type is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name) || self.objects.contains_key(name)
    }

    /// Node type by name
    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.nodes.get(name)
    }

    /// Object type by name
    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.objects.get(name)
    }

    /// Create a fresh instance of an object type
    pub fn create_object(&self, name: &str) -> Option<Box<dyn Any>> {
        self.objects.get(name).map(ObjectType::create)
    }

    /// Names of all registered node types
    pub fn node_type_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Modules loaded so far, in load order
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Register a single node type outside any module
    pub fn register_node(&mut self, node_type: NodeType) -> Result<(), RegistryError> {
        if self.contains(node_type.name()) {
            return Err(RegistryError::DuplicateType {
                name: node_type.name().to_string(),
                module: String::new(),
            });
        }
        self.nodes.insert(node_type.name().to_string(), node_type);
        Ok(())
    }

    /// Register a single object type outside any module
    pub fn register_object(&mut self, object_type: ObjectType) -> Result<(), RegistryError> {
        if self.contains(object_type.name()) {
            return Err(RegistryError::DuplicateType {
                name: object_type.name().to_string(),
                module: String::new(),
            });
        }
        self.objects.insert(object_type.name().to_string(), object_type);
        Ok(())
    }

    /// Load one module; on failure nothing from it is registered
    pub fn load_module(&mut self, extension: &dyn Extension) -> Result<usize, RegistryError> {
        let mut registrar = ModuleRegistrar {
            registry: self,
            module: extension.name().to_string(),
            nodes: Vec::new(),
            objects: Vec::new(),
        };
        extension.register(&mut registrar)?;

        let ModuleRegistrar {
            module, nodes, objects, ..
        } = registrar;
        let count = nodes.len() + objects.len();

        for node_type in nodes {
            self.nodes.insert(node_type.name().to_string(), node_type);
        }
        for object_type in objects {
            self.objects.insert(object_type.name().to_string(), object_type);
        }

        log::info!("Loaded module '{module}' with {count} type(s)");
        self.modules.push(module);
        Ok(count)
    }

    /// Load modules in order, logging and skipping the ones that fail
    ///
    /// Returns the number of modules loaded.
    pub fn load_modules<'e>(&mut self, extensions: impl IntoIterator<Item = &'e dyn Extension>) -> usize {
        let mut loaded = 0;
        for extension in extensions {
            match self.load_module(extension) {
                Ok(_) => loaded += 1,
                Err(err) => log::error!("Skipping module '{}': {err}", extension.name()),
            }
        }
        loaded
    }
}
