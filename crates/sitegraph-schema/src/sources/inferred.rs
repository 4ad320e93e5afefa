//! Inferred type definitions.
//!
//! Inference is a collaborator behind a trait so that sites can plug in
//! their own strategy. Whatever the strategy, the registry enforces the
//! precedence rule: an inferred field never overwrites an explicit one.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use sitegraph_core::{NodeStore, Reporter};

use crate::descriptor::{FieldDescriptor, ObjectType, TypeDescriptor, TypeRefSpec};
use crate::error::SchemaError;
use crate::registry::{NODE_INTERFACE, TypeRegistry};

/// Proposes type shapes for node types from stored data.
#[async_trait]
pub trait TypeInference: Send + Sync {
    /// Infers shapes for every node type present in the store.
    async fn infer_types(
        &self,
        store: &dyn NodeStore,
        registry: &mut TypeRegistry,
        reporter: &dyn Reporter,
    ) -> Result<(), SchemaError>;

    /// Infers the shape of one node type.
    async fn infer_type(
        &self,
        type_name: &str,
        store: &dyn NodeStore,
        registry: &mut TypeRegistry,
        reporter: &dyn Reporter,
    ) -> Result<(), SchemaError>;
}

/// The default inference strategy: sample every node of a type and map JSON
/// value shapes onto scalar references. Conflicting samples for a field
/// degrade to `JSON` with a warning.
#[derive(Debug, Default)]
pub struct ValueSampleInference;

#[async_trait]
impl TypeInference for ValueSampleInference {
    async fn infer_types(
        &self,
        store: &dyn NodeStore,
        registry: &mut TypeRegistry,
        reporter: &dyn Reporter,
    ) -> Result<(), SchemaError> {
        for type_name in store.node_type_names().await {
            self.infer_type(&type_name, store, registry, reporter)
                .await?;
        }
        Ok(())
    }

    async fn infer_type(
        &self,
        type_name: &str,
        store: &dyn NodeStore,
        registry: &mut TypeRegistry,
        reporter: &dyn Reporter,
    ) -> Result<(), SchemaError> {
        let nodes = store.get_nodes_by_type(type_name).await;
        if nodes.is_empty() {
            return Ok(());
        }
        debug!(type_name = %type_name, samples = nodes.len(), "Inferring node type shape");

        let mut object = ObjectType::new(type_name).implement(NODE_INTERFACE);
        for node in &nodes {
            for (field_name, value) in &node.fields {
                let Some(inferred) = infer_type_ref(value) else {
                    continue;
                };
                match object.fields.get(field_name) {
                    Some(existing) if existing.type_ref == TypeRefSpec::named("JSON") => {}
                    None => {
                        object
                            .fields
                            .insert(field_name.clone(), FieldDescriptor::new(inferred));
                    }
                    Some(existing) if existing.type_ref != inferred => {
                        reporter.warn(&format!(
                            "Conflicting value shapes for `{type_name}.{field_name}` \
                             (`{}` vs `{inferred}`); falling back to JSON",
                            existing.type_ref
                        ));
                        object
                            .fields
                            .insert(field_name.clone(), FieldDescriptor::new(TypeRefSpec::named("JSON")));
                    }
                    Some(_) => {}
                }
            }
        }

        registry.add_inferred_type(TypeDescriptor::Object(object))?;
        Ok(())
    }
}

/// Maps a sampled JSON value to a type reference. Nulls contribute nothing.
fn infer_type_ref(value: &Value) -> Option<TypeRefSpec> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(TypeRefSpec::named("Boolean")),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(TypeRefSpec::named("Int")),
        Value::Number(_) => Some(TypeRefSpec::named("Float")),
        Value::String(_) => Some(TypeRefSpec::named("String")),
        Value::Array(items) => {
            let element = items.iter().find_map(infer_type_ref)?;
            if element.is_list() {
                // Nested lists sample as opaque JSON.
                Some(TypeRefSpec::named("JSON"))
            } else {
                Some(TypeRefSpec::List(Box::new(element)))
            }
        }
        Value::Object(_) => Some(TypeRefSpec::named("JSON")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitegraph_core::{InMemoryNodeStore, Node, RecordingReporter};

    fn store_with(nodes: Vec<Node>) -> InMemoryNodeStore {
        let store = InMemoryNodeStore::new();
        store.extend(nodes);
        store
    }

    #[tokio::test]
    async fn test_infers_scalar_fields() {
        let store = store_with(vec![
            Node::new("p1", "Person")
                .with_field("name", json!("Ada"))
                .with_field("age", json!(36))
                .with_field("score", json!(0.5))
                .with_field("tags", json!(["a", "b"])),
        ]);
        let mut registry = TypeRegistry::new();
        let reporter = RecordingReporter::default();

        ValueSampleInference
            .infer_types(&store, &mut registry, &reporter)
            .await
            .unwrap();

        let fields = registry.get("Person").unwrap().descriptor.fields().unwrap();
        assert_eq!(fields["name"].type_ref.to_string(), "String");
        assert_eq!(fields["age"].type_ref.to_string(), "Int");
        assert_eq!(fields["score"].type_ref.to_string(), "Float");
        assert_eq!(fields["tags"].type_ref.to_string(), "[String]");
        assert!(registry.node_type_names().contains(&"Person".to_string()));
    }

    #[tokio::test]
    async fn test_conflicting_samples_degrade_to_json() {
        let store = store_with(vec![
            Node::new("p1", "Person").with_field("value", json!("text")),
            Node::new("p2", "Person").with_field("value", json!(7)),
        ]);
        let mut registry = TypeRegistry::new();
        let reporter = RecordingReporter::default();

        ValueSampleInference
            .infer_types(&store, &mut registry, &reporter)
            .await
            .unwrap();

        let fields = registry.get("Person").unwrap().descriptor.fields().unwrap();
        assert_eq!(fields["value"].type_ref.to_string(), "JSON");
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_fields_win_over_inferred() {
        let store = store_with(vec![Node::new("p1", "Person").with_field("age", json!(36))]);
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeDescriptor::Object(ObjectType::new("Person").field(
                "age",
                FieldDescriptor::new(TypeRefSpec::named("Float")),
            )))
            .unwrap();

        ValueSampleInference
            .infer_types(&store, &mut registry, &RecordingReporter::default())
            .await
            .unwrap();

        let fields = registry.get("Person").unwrap().descriptor.fields().unwrap();
        assert_eq!(fields["age"].type_ref.to_string(), "Float");
    }
}
