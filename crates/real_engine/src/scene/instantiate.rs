//! Descriptor → node subtree

use crate::registry::{Args, NodeType, TypeRegistry, Value};
use crate::tree::{NodeId, NodeTree, TreeError};

use super::{convert, SceneDescriptor, SceneError};

/// Type used when a descriptor names none
pub const DEFAULT_NODE_TYPE: &str = "Node";

/// Build the subtree described by `descriptor` inside `tree`
///
/// The returned root is configured and unattached. On failure every node
/// created along the way is freed again and the error is returned.
pub fn instantiate(
    tree: &mut NodeTree,
    registry: &TypeRegistry,
    descriptor: SceneDescriptor,
) -> Result<NodeId, SceneError> {
    let count = descriptor.node_count();
    let name = descriptor.name.clone();
    let root = build(tree, registry, descriptor)?;
    log::debug!("Instantiated '{name}' ({count} node(s))");
    Ok(root)
}

fn build(tree: &mut NodeTree, registry: &TypeRegistry, descriptor: SceneDescriptor) -> Result<NodeId, SceneError> {
    let SceneDescriptor {
        name,
        type_name,
        children,
        mut params,
    } = descriptor;

    let type_name = type_name.as_deref().unwrap_or(DEFAULT_NODE_TYPE);
    let node_type = registry
        .node_type(type_name)
        .ok_or_else(|| SceneError::TypeNotFound(type_name.to_string()))?;

    let mut args = Args::new(name.as_str(), type_name);
    for spec in node_type.params() {
        let key = params.keys().find(|key| key.eq_ignore_ascii_case(&spec.name)).cloned();
        let declared = key.and_then(|key| params.remove(&key));

        let value = match declared.or_else(|| spec.default.clone()) {
            Some(value) => value,
            None => {
                return Err(SceneError::MissingRequiredParameter {
                    parameter: spec.name.clone(),
                    node: name,
                    type_name: type_name.to_string(),
                })
            }
        };
        args.insert(spec.name.as_str(), convert(&value, spec.kind, registry, &name, &spec.name)?);
    }

    let behavior = node_type.construct(&mut args)?;
    let id = tree.insert_boxed(name, behavior);

    if let Err(err) = configure(tree, registry, node_type, id, params, children) {
        if let Err(free_err) = tree.free(id) {
            log::error!("Failed to free partially built node {id:?}: {free_err}");
        }
        return Err(err);
    }
    Ok(id)
}

fn configure(
    tree: &mut NodeTree,
    registry: &TypeRegistry,
    node_type: &NodeType,
    id: NodeId,
    params: impl IntoIterator<Item = (String, Value)>,
    children: Vec<SceneDescriptor>,
) -> Result<(), SceneError> {
    let node = tree.name(id).unwrap_or_default().to_string();

    for (key, value) in params {
        let property = node_type
            .property(&key)
            .ok_or_else(|| SceneError::UnknownProperty {
                property: key.clone(),
                node: node.clone(),
                type_name: node_type.name().to_string(),
            })?;

        let arg = convert(&value, property.kind(), registry, &node, &key)?;
        let behavior = tree.behavior_dyn_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        property
            .apply(behavior, arg)
            .map_err(|source| SceneError::InvalidValue {
                node: node.clone(),
                target: key.clone(),
                source,
            })?;
    }

    for child in children {
        let child_id = build(tree, registry, child)?;
        if let Err(err) = tree.attach(id, child_id) {
            if let Err(free_err) = tree.free(child_id) {
                log::error!("Failed to free unattached child {child_id:?}: {free_err}");
            }
            return Err(err.into());
        }
    }
    Ok(())
}
