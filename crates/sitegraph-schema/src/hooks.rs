//! Plugin hook contracts.
//!
//! Plugins participate in the build through typed contracts: each hook
//! receives a typed payload and returns a plain list of declared mutations,
//! which the engine applies itself. Plugins never hold a mutable handle to
//! the registry.

use async_trait::async_trait;
use tracing::debug;

use sitegraph_core::{Node, NodeStore};

use crate::descriptor::FieldDescriptor;
use crate::error::SchemaError;
use crate::overlay::{IntermediateSchema, ResolverPatch};
use crate::registry::TypeRegistry;

/// Payload for the per-node-type field hook: the type's name and its
/// current nodes, for plugins that derive fields from data.
#[derive(Debug)]
pub struct NodeTypeFields {
    pub type_name: String,
    pub nodes: Vec<Node>,
}

/// A schema build participant.
///
/// Both hooks default to contributing nothing, so plugins implement only
/// what they need.
#[async_trait]
pub trait SchemaPlugin: Send + Sync {
    /// Declares extra fields for a node type. Field names may be dotted
    /// paths; intermediate object types are created as needed.
    async fn set_fields_on_node_type(
        &self,
        request: &NodeTypeFields,
    ) -> Vec<(String, FieldDescriptor)> {
        let _ = request;
        Vec::new()
    }

    /// Declares resolver patches against the finished intermediate schema.
    async fn create_resolvers(&self, schema: &IntermediateSchema) -> Vec<ResolverPatch> {
        let _ = schema;
        Vec::new()
    }
}

/// Runs the node-type field hook for every node type and applies the
/// declared fields.
pub async fn run_set_fields(
    registry: &mut TypeRegistry,
    store: &dyn NodeStore,
    plugins: &[Box<dyn SchemaPlugin>],
) -> Result<(), SchemaError> {
    if plugins.is_empty() {
        return Ok(());
    }
    for type_name in registry.node_type_names() {
        let request = NodeTypeFields {
            nodes: store.get_nodes_by_type(&type_name).await,
            type_name: type_name.clone(),
        };
        for plugin in plugins {
            for (path, field) in plugin.set_fields_on_node_type(&request).await {
                debug!(type_name = %type_name, path = %path, "Applying plugin node-type field");
                registry.add_nested_field(&type_name, &path, field)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegraph_core::InMemoryNodeStore;

    use crate::descriptor::{ObjectType, TypeDescriptor, TypeRefSpec};
    use crate::node_interface::register_node_types;
    use crate::registry::NODE_INTERFACE;

    struct WordCountPlugin;

    #[async_trait]
    impl SchemaPlugin for WordCountPlugin {
        async fn set_fields_on_node_type(
            &self,
            request: &NodeTypeFields,
        ) -> Vec<(String, FieldDescriptor)> {
            if request.type_name != "Post" {
                return Vec::new();
            }
            vec![
                (
                    "wordCount.words".to_string(),
                    FieldDescriptor::new(TypeRefSpec::named("Int")),
                ),
                (
                    "excerpt".to_string(),
                    FieldDescriptor::new(TypeRefSpec::named("String")),
                ),
            ]
        }
    }

    #[tokio::test]
    async fn test_set_fields_applies_dotted_paths() {
        let mut registry = TypeRegistry::new();
        register_node_types(&mut registry).unwrap();
        registry
            .register(TypeDescriptor::Object(
                ObjectType::new("Post").implement(NODE_INTERFACE),
            ))
            .unwrap();
        let store = InMemoryNodeStore::new();
        let plugins: Vec<Box<dyn SchemaPlugin>> = vec![Box::new(WordCountPlugin)];

        run_set_fields(&mut registry, &store, &plugins).await.unwrap();

        let fields = registry.get("Post").unwrap().descriptor.fields().unwrap();
        assert_eq!(fields["excerpt"].type_ref.to_string(), "String");
        assert_eq!(fields["wordCount"].type_ref.to_string(), "PostWordCount");
        let nested = registry
            .get("PostWordCount")
            .unwrap()
            .descriptor
            .fields()
            .unwrap();
        assert_eq!(nested["words"].type_ref.to_string(), "Int");
    }
}
