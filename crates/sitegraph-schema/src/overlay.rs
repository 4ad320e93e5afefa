//! Resolver overlay.
//!
//! After enrichment the builder finalizes an intermediate schema and hands
//! it to plugins, which answer with resolver patches. Patches are applied
//! field by field; a patch can never corrupt a type it did not declare, and
//! per-field conflicts degrade to reporter warnings instead of aborting the
//! build.

use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use indexmap::IndexMap;
use tracing::debug;

use sitegraph_core::Reporter;

use crate::descriptor::{FieldDescriptor, InputValueSpec, TypeRefSpec};
use crate::registry::TypeRegistry;
use crate::resolve::Resolve;

/// The fully resolved schema handed to the `create_resolvers` hook.
///
/// It is a real, executable schema built from the registry before overlay,
/// so plugins introspect resolved types rather than raw descriptors.
pub struct IntermediateSchema {
    schema: Schema,
}

impl IntermediateSchema {
    pub(crate) fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Renders the schema in SDL form.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// The underlying executable schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl fmt::Debug for IntermediateSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IntermediateSchema")
    }
}

/// One declared field mutation from a `create_resolvers` hook.
pub struct ResolverPatch {
    pub type_name: String,
    pub field_name: String,
    pub type_ref: Option<TypeRefSpec>,
    pub args: Option<IndexMap<String, InputValueSpec>>,
    pub resolver: Option<Arc<dyn Resolve>>,
}

impl ResolverPatch {
    /// Creates a patch targeting one field.
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
            type_ref: None,
            args: None,
            resolver: None,
        }
    }

    /// Declares the field's type.
    #[must_use]
    pub fn type_ref(mut self, type_ref: TypeRefSpec) -> Self {
        self.type_ref = Some(type_ref);
        self
    }

    /// Declares the field's arguments.
    #[must_use]
    pub fn args(mut self, args: IndexMap<String, InputValueSpec>) -> Self {
        self.args = Some(args);
        self
    }

    /// Declares a resolver step, prepended so the previous resolver stays
    /// reachable through the chain.
    #[must_use]
    pub fn resolver(mut self, step: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(step);
        self
    }
}

impl fmt::Debug for ResolverPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverPatch")
            .field("type_name", &self.type_name)
            .field("field_name", &self.field_name)
            .field("type_ref", &self.type_ref)
            .finish_non_exhaustive()
    }
}

/// Applies resolver patches to the registry.
///
/// Rules per patch:
/// - unknown target type: warn and skip;
/// - missing field: add it, provided the patch declares a type;
/// - existing field: accept when the patch declares no type, the declared
///   type textually equals the present one, or the target type is foreign;
///   otherwise warn naming both types and leave the field unchanged.
pub fn apply_resolver_patches(
    registry: &mut TypeRegistry,
    patches: Vec<ResolverPatch>,
    reporter: &dyn Reporter,
) {
    for patch in patches {
        apply_patch(registry, patch, reporter);
    }
}

fn apply_patch(registry: &mut TypeRegistry, patch: ResolverPatch, reporter: &dyn Reporter) {
    let target = format!("{}.{}", patch.type_name, patch.field_name);
    let Some(foreign) = registry.get(&patch.type_name).map(|t| t.foreign) else {
        reporter.warn(&format!(
            "Cannot set resolver for `{target}`: type `{}` is not in the schema",
            patch.type_name
        ));
        return;
    };
    let Some(fields) = registry
        .get_mut(&patch.type_name)
        .and_then(|t| t.descriptor.fields_mut())
    else {
        reporter.warn(&format!(
            "Cannot set resolver for `{target}`: `{}` has no output fields",
            patch.type_name
        ));
        return;
    };

    match fields.get_mut(&patch.field_name) {
        None => {
            let Some(type_ref) = patch.type_ref else {
                reporter.warn(&format!(
                    "Cannot add field `{target}`: no type was declared"
                ));
                return;
            };
            debug!(target = %target, "Adding field from resolver patch");
            let mut field = FieldDescriptor::new(type_ref);
            if let Some(args) = patch.args {
                field.args = args;
            }
            if let Some(step) = patch.resolver {
                field.resolver.prepend(step);
            }
            fields.insert(patch.field_name, field);
        }
        Some(existing) => {
            let accepted = match &patch.type_ref {
                None => true,
                Some(declared) if *declared == existing.type_ref => true,
                Some(_) if foreign => true,
                Some(declared) => {
                    reporter.warn(&format!(
                        "Plugin tried to change the type of `{target}` from `{}` to `{declared}`; keeping `{}`",
                        existing.type_ref, existing.type_ref
                    ));
                    false
                }
            };
            if !accepted {
                return;
            }
            debug!(target = %target, "Patching field resolver");
            if let Some(type_ref) = patch.type_ref {
                existing.type_ref = type_ref;
            }
            if let Some(args) = patch.args {
                existing.args = args;
            }
            if let Some(step) = patch.resolver {
                existing.resolver.prepend(step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegraph_core::RecordingReporter;

    use crate::descriptor::{ObjectType, TypeDescriptor};
    use crate::resolve::resolver;
    use crate::sources::{ForeignSchema, merge_foreign_schema};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeDescriptor::Object(ObjectType::new("Person").field(
                "name",
                FieldDescriptor::new(TypeRefSpec::named("String")),
            )))
            .unwrap();
        merge_foreign_schema(
            &mut registry,
            ForeignSchema::new().with_type(TypeDescriptor::Object(
                ObjectType::new("RemoteArticle").field(
                    "title",
                    FieldDescriptor::new(TypeRefSpec::named("String")),
                ),
            )),
        )
        .unwrap();
        registry
    }

    fn noop_step() -> Arc<dyn Resolve> {
        resolver(|ctx, next| Box::pin(next.run(ctx)))
    }

    #[test]
    fn test_unknown_type_warns_and_skips() {
        let mut registry = registry();
        let reporter = RecordingReporter::new();
        apply_resolver_patches(
            &mut registry,
            vec![ResolverPatch::new("Ghost", "field").resolver(noop_step())],
            &reporter,
        );
        assert_eq!(reporter.warnings().len(), 1);
        assert!(reporter.warnings()[0].contains("Ghost"));
    }

    #[test]
    fn test_missing_field_added_with_type() {
        let mut registry = registry();
        let reporter = RecordingReporter::new();
        apply_resolver_patches(
            &mut registry,
            vec![
                ResolverPatch::new("Person", "slug")
                    .type_ref(TypeRefSpec::named("String"))
                    .resolver(noop_step()),
                ResolverPatch::new("Person", "untyped").resolver(noop_step()),
            ],
            &reporter,
        );

        let fields = registry.get("Person").unwrap().descriptor.fields().unwrap();
        assert!(fields.contains_key("slug"));
        assert!(!fields.contains_key("untyped"));
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_type_change_rejected_on_local_type() {
        let mut registry = registry();
        let reporter = RecordingReporter::new();
        apply_resolver_patches(
            &mut registry,
            vec![ResolverPatch::new("Person", "name").type_ref(TypeRefSpec::named("Int"))],
            &reporter,
        );

        let fields = registry.get("Person").unwrap().descriptor.fields().unwrap();
        assert_eq!(fields["name"].type_ref.to_string(), "String");
        let warning = &reporter.warnings()[0];
        assert!(warning.contains("String") && warning.contains("Int"), "{warning}");
    }

    #[test]
    fn test_type_change_accepted_on_foreign_type() {
        let mut registry = registry();
        let reporter = RecordingReporter::new();
        apply_resolver_patches(
            &mut registry,
            vec![ResolverPatch::new("RemoteArticle", "title").type_ref(TypeRefSpec::named("JSON"))],
            &reporter,
        );

        let fields = registry
            .get("RemoteArticle")
            .unwrap()
            .descriptor
            .fields()
            .unwrap();
        assert_eq!(fields["title"].type_ref.to_string(), "JSON");
        assert!(reporter.is_empty());
    }

    #[test]
    fn test_matching_type_prepends_resolver() {
        let mut registry = registry();
        let reporter = RecordingReporter::new();
        apply_resolver_patches(
            &mut registry,
            vec![
                ResolverPatch::new("Person", "name")
                    .type_ref(TypeRefSpec::named("String"))
                    .resolver(noop_step()),
            ],
            &reporter,
        );

        let fields = registry.get("Person").unwrap().descriptor.fields().unwrap();
        assert_eq!(fields["name"].resolver.len(), 1);
        assert!(reporter.is_empty());
    }
}
