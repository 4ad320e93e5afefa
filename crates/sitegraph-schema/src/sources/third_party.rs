//! Third-party schema merging.
//!
//! A foreign schema arrives as descriptors plus the root query fields it
//! wants to expose. Its types are merged wholesale under their own names and
//! tagged foreign, which later relaxes the overlay rule that rejects
//! type-changing field patches. Name collisions with already-registered
//! types are fatal.

use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::error::SchemaError;
use crate::registry::{RESERVED_SCALARS, TypeRegistry};

/// An externally owned schema stitched into the build.
#[derive(Debug, Default, Clone)]
pub struct ForeignSchema {
    /// Fields the foreign schema contributes to the root query.
    pub query_fields: IndexMap<String, FieldDescriptor>,
    /// The foreign type graph, already in descriptor form.
    pub types: Vec<TypeDescriptor>,
}

impl ForeignSchema {
    /// Creates an empty foreign schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type to the foreign graph.
    #[must_use]
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// Adds a root query field.
    #[must_use]
    pub fn with_query_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.query_fields.insert(name.into(), field);
        self
    }
}

/// Merges a foreign schema into the registry.
///
/// Built-in scalar names, introspection types and the foreign root `Query`
/// type are skipped; they exist on the composed side already. Everything
/// else must be collision-free.
pub fn merge_foreign_schema(
    registry: &mut TypeRegistry,
    schema: ForeignSchema,
) -> Result<(), SchemaError> {
    for descriptor in schema.types {
        let name = descriptor.name();
        if name == "Query" || name.starts_with("__") || RESERVED_SCALARS.contains(&name) {
            continue;
        }
        debug!(type_name = %name, "Merging third-party type");
        registry.register_foreign(descriptor)?;
    }
    for (name, field) in schema.query_fields {
        registry.add_query_field(name, field);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ObjectType, TypeRefSpec};

    fn remote_schema() -> ForeignSchema {
        ForeignSchema::new()
            .with_type(TypeDescriptor::Object(ObjectType::new("Query")))
            .with_type(TypeDescriptor::Object(ObjectType::new("__Directive")))
            .with_type(TypeDescriptor::Object(ObjectType::new("RemoteArticle").field(
                "title",
                FieldDescriptor::new(TypeRefSpec::named("String")),
            )))
            .with_query_field(
                "article",
                FieldDescriptor::new(TypeRefSpec::named("RemoteArticle")),
            )
    }

    #[test]
    fn test_merge_skips_roots_and_introspection() {
        let mut registry = TypeRegistry::new();
        merge_foreign_schema(&mut registry, remote_schema()).unwrap();

        assert!(registry.contains("RemoteArticle"));
        assert!(registry.is_foreign("RemoteArticle"));
        assert!(!registry.contains("Query"));
        assert!(!registry.contains("__Directive"));
        assert!(registry.query_fields().contains_key("article"));
    }

    #[test]
    fn test_collision_with_existing_type_is_fatal() {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeDescriptor::Object(ObjectType::new("RemoteArticle")))
            .unwrap();
        let err = merge_foreign_schema(&mut registry, remote_schema()).unwrap_err();
        assert!(matches!(err, SchemaError::NameConflict { .. }));
    }

    #[test]
    fn test_foreign_names_skip_reserved_rules() {
        // Foreign types were valid in their schema of origin; a name like
        // `ArticleFilterInput` is accepted rather than rejected as reserved.
        let mut registry = TypeRegistry::new();
        let schema = ForeignSchema::new().with_type(TypeDescriptor::Object(ObjectType::new(
            "ArticleFilterInput",
        )));
        merge_foreign_schema(&mut registry, schema).unwrap();
        assert!(registry.contains("ArticleFilterInput"));
    }
}
