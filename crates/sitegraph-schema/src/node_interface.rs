//! The node capability interface.
//!
//! Types participating in the data graph implement the reserved `Node`
//! interface: identity, parent/child links and internal metadata, always
//! with this exact shape. The shape is owned here; the enricher injects it
//! into every implementing object type, so sparse user definitions still
//! come out whole.

use std::sync::Arc;

use async_graphql::Value;

use sitegraph_core::NodeId;

use crate::descriptor::{
    FieldDescriptor, InterfaceType, ObjectType, TypeDescriptor, TypeRefSpec,
};
use crate::error::SchemaError;
use crate::registry::{NODE_INTERFACE, TypeRegistry};
use crate::resolve::{Resolve, json_to_graphql_value, resolver};

/// Name of the internal metadata object type.
pub const INTERNAL_TYPE: &str = "Internal";

/// Registers the `Node` interface and the `Internal` metadata type.
pub fn register_node_types(registry: &mut TypeRegistry) -> Result<(), SchemaError> {
    if registry.contains(NODE_INTERFACE) {
        return Ok(());
    }
    let internal = ObjectType::new(INTERNAL_TYPE)
        .description("Internal metadata attached to every node")
        .field("type", FieldDescriptor::new(TypeRefSpec::named_nn("String")))
        .field(
            "contentDigest",
            FieldDescriptor::new(TypeRefSpec::named("String")),
        )
        .field("owner", FieldDescriptor::new(TypeRefSpec::named("String")));
    registry.register_internal(TypeDescriptor::Object(internal))?;

    let mut node = InterfaceType::new(NODE_INTERFACE)
        .description("A record in the site data graph");
    for (name, field) in identity_fields() {
        node = node.field(name, field);
    }
    registry.register_internal(TypeDescriptor::Interface(node))?;
    Ok(())
}

/// Injects the identity fields into an object type, keeping any field the
/// user already declared under the same name.
pub fn add_node_identity_fields(object: &mut ObjectType) {
    for (name, field) in identity_fields() {
        if !object.fields.contains_key(&name) {
            object.fields.insert(name, field);
        }
    }
}

/// The canonical identity field set, resolvers included.
fn identity_fields() -> Vec<(String, FieldDescriptor)> {
    vec![
        (
            "id".to_string(),
            FieldDescriptor::new(TypeRefSpec::named_nn("ID")),
        ),
        (
            "parent".to_string(),
            FieldDescriptor::new(TypeRefSpec::named(NODE_INTERFACE))
                .resolver(parent_resolver()),
        ),
        (
            "children".to_string(),
            FieldDescriptor::new(TypeRefSpec::named_nn_list_nn(NODE_INTERFACE))
                .resolver(children_resolver()),
        ),
        (
            "internal".to_string(),
            FieldDescriptor::new(TypeRefSpec::named_nn(INTERNAL_TYPE)),
        ),
    ]
}

/// Looks the parent node up by the id stored on the value.
fn parent_resolver() -> Arc<dyn Resolve> {
    resolver(|ctx, _next| {
        Box::pin(async move {
            let Value::Object(obj) = &ctx.parent else {
                return Ok(None);
            };
            let Some(Value::String(parent_id)) = obj.get("parent") else {
                return Ok(None);
            };
            let node = ctx.store.get_node(&NodeId::new(parent_id.clone())).await;
            Ok(node.map(|node| json_to_graphql_value(node.to_value())))
        })
    })
}

/// Resolves the child id list to full nodes, preserving order and skipping
/// ids no longer present in the store.
fn children_resolver() -> Arc<dyn Resolve> {
    resolver(|ctx, _next| {
        Box::pin(async move {
            let ids = child_ids(&ctx.parent);
            let nodes = ctx.store.get_nodes_by_ids(&ids, None, &ctx.path).await;
            Ok(Some(Value::List(
                nodes
                    .into_iter()
                    .map(|node| json_to_graphql_value(node.to_value()))
                    .collect(),
            )))
        })
    })
}

pub(crate) fn child_ids(parent: &Value) -> Vec<NodeId> {
    let Value::Object(obj) = parent else {
        return Vec::new();
    };
    match obj.get("children") {
        Some(Value::List(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(NodeId::new(id.clone())),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
