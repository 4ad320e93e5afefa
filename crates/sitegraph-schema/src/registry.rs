//! The type registry: the mutable, in-progress schema under construction.
//!
//! A registry is a build-session value. Every build owns its own registry
//! and discards it on completion or failure; there is no process-wide
//! schema state. Registration validates names against the reserved set and
//! installs default type resolution on abstract types. Every registered
//! type is materialized at finalization, referenced or not.

use indexmap::IndexMap;
use tracing::trace;

use crate::descriptor::{
    FieldDescriptor, InputValueSpec, ObjectType, TypeDescriptor, TypeRefSpec, TypeResolution,
};
use crate::error::SchemaError;
use crate::resolve::ResolverChain;

/// The reserved node capability interface name.
pub const NODE_INTERFACE: &str = "Node";

/// Scalar names reserved for internal use.
pub const RESERVED_SCALARS: [&str; 7] = ["Boolean", "Date", "Float", "ID", "Int", "JSON", "String"];

/// Suffixes reserved for generated input types.
pub const RESERVED_SUFFIXES: [&str; 2] = ["FilterInput", "SortInput"];

/// A named resolver attached to a type by the enricher, not yet exposed on
/// the root query.
#[derive(Debug, Clone)]
pub struct ResolverDefinition {
    pub type_ref: TypeRefSpec,
    pub args: IndexMap<String, InputValueSpec>,
    pub chain: ResolverChain,
}

impl ResolverDefinition {
    /// Converts the resolver into a root query field.
    pub fn to_field(&self) -> FieldDescriptor {
        let mut field = FieldDescriptor::new(self.type_ref.clone());
        field.args = self.args.clone();
        field.resolver = self.chain.clone();
        field
    }
}

/// A registered type plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct RegisteredType {
    pub descriptor: TypeDescriptor,
    /// Imported wholesale from an externally hosted schema. Relaxes the
    /// overlay rule that rejects type-changing field patches.
    pub foreign: bool,
    /// Named resolvers attached by the enricher (`findOne`,
    /// `findManyPaginated`).
    pub resolvers: IndexMap<String, ResolverDefinition>,
}

/// The working set of all type descriptors for one build.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
    query_fields: IndexMap<String, FieldDescriptor>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an explicitly defined type.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NameConflict` when the name is reserved,
    /// invalid, or already taken.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<String, SchemaError> {
        check_allowed_type_name(descriptor.name())?;
        self.insert(descriptor, false)
    }

    /// Registers a type imported from a third-party schema.
    ///
    /// Foreign names skip the reserved-name rules (they were valid in their
    /// schema of origin) but still may not collide with present types.
    pub fn register_foreign(&mut self, descriptor: TypeDescriptor) -> Result<String, SchemaError> {
        self.insert(descriptor, true)
    }

    /// Registers an engine-generated type (the node interface, synthesized
    /// input types). Skips the reserved-name rules, which exist precisely
    /// to keep user types out of this namespace.
    pub(crate) fn register_internal(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<String, SchemaError> {
        self.insert(descriptor, false)
    }

    fn insert(
        &mut self,
        mut descriptor: TypeDescriptor,
        foreign: bool,
    ) -> Result<String, SchemaError> {
        let name = descriptor.name().to_string();
        if self.types.contains_key(&name) {
            return Err(SchemaError::name_conflict(
                &name,
                "a type with this name has already been registered",
            ));
        }
        install_default_type_resolution(&mut descriptor);
        trace!(type_name = %name, kind = %descriptor.kind(), foreign, "Registering type");
        self.types.insert(
            name.clone(),
            RegisteredType {
                descriptor,
                foreign,
                resolvers: IndexMap::new(),
            },
        );
        Ok(name)
    }

    /// Accepts a descriptor proposed by the inference collaborator.
    ///
    /// If the type is not yet present it is registered with full
    /// validation. If it already exists, inference only fills gaps: fields
    /// whose names are already present are dropped, never overwritten.
    /// This precedence is an invariant, not an accident of call order.
    pub fn add_inferred_type(&mut self, descriptor: TypeDescriptor) -> Result<String, SchemaError> {
        let name = descriptor.name().to_string();
        if !self.types.contains_key(&name) {
            return self.register(descriptor);
        }
        if let Some(fields) = descriptor.fields() {
            self.merge_inferred_fields(&name, fields.clone());
        }
        Ok(name)
    }

    /// Merges inferred fields into an existing type, keeping every field
    /// that is already present.
    pub fn merge_inferred_fields(
        &mut self,
        type_name: &str,
        fields: IndexMap<String, FieldDescriptor>,
    ) {
        let Some(existing) = self
            .types
            .get_mut(type_name)
            .and_then(|t| t.descriptor.fields_mut())
        else {
            return;
        };
        for (field_name, field) in fields {
            if existing.contains_key(&field_name) {
                trace!(
                    type_name = %type_name,
                    field_name = %field_name,
                    "Dropping inferred field; an explicit field with this name exists"
                );
                continue;
            }
            existing.insert(field_name, field);
        }
    }

    /// Adds a field at a dotted path, creating intermediate object types as
    /// needed (`frontmatter.published` adds `published` to the type behind
    /// the `frontmatter` field).
    pub fn add_nested_field(
        &mut self,
        type_name: &str,
        path: &str,
        field: FieldDescriptor,
    ) -> Result<(), SchemaError> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = type_name.to_string();
        for (i, segment) in segments.iter().enumerate() {
            let last = i == segments.len() - 1;
            let Some(fields) = self
                .types
                .get_mut(&current)
                .and_then(|t| t.descriptor.fields_mut())
            else {
                return Err(SchemaError::BuildFailed(format!(
                    "cannot add nested field `{path}` to `{type_name}`: `{current}` has no fields"
                )));
            };
            if last {
                fields.insert((*segment).to_string(), field);
                return Ok(());
            }
            let next = match fields.get(*segment) {
                Some(existing) => existing.type_ref.base_name().to_string(),
                None => {
                    let nested = format!("{current}{}", capitalize_first(segment));
                    fields.insert(
                        (*segment).to_string(),
                        FieldDescriptor::new(TypeRefSpec::named(nested.clone())),
                    );
                    nested
                }
            };
            if !self.types.contains_key(&next) {
                self.register_internal(TypeDescriptor::Object(ObjectType::new(next.clone())))?;
            }
            current = next;
        }
        Ok(())
    }

    /// Returns a registered type by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredType> {
        self.types.get(name)
    }

    /// Mutable variant of [`TypeRegistry::get`].
    pub fn get_mut(&mut self, name: &str) -> Option<&mut RegisteredType> {
        self.types.get_mut(name)
    }

    /// Returns `true` if a type with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns `true` if the named type is foreign-origin.
    pub fn is_foreign(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(|t| t.foreign)
    }

    /// Removes a type. Used to discard generated input artifacts before
    /// re-synthesizing them on rebuild.
    pub fn remove(&mut self, name: &str) -> Option<RegisteredType> {
        self.types.shift_remove(name)
    }

    /// Names of all registered types, in registration order.
    pub fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Names of object types declaring the `Node` interface.
    pub fn node_type_names(&self) -> Vec<String> {
        self.types
            .values()
            .filter_map(|t| t.descriptor.as_object())
            .filter(|o| o.implements(NODE_INTERFACE))
            .map(|o| o.name.clone())
            .collect()
    }

    /// Iterates over all registered types.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegisteredType)> {
        self.types.iter()
    }

    /// Adds a field to the root query type.
    pub fn add_query_field(&mut self, name: impl Into<String>, field: FieldDescriptor) {
        self.query_fields.insert(name.into(), field);
    }

    /// The root query field map.
    pub fn query_fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.query_fields
    }
}

fn install_default_type_resolution(descriptor: &mut TypeDescriptor) {
    match descriptor {
        TypeDescriptor::Interface(iface) if iface.resolve_type.is_none() => {
            iface.resolve_type = Some(TypeResolution::by_internal_type());
        }
        TypeDescriptor::Union(union) if union.resolve_type.is_none() => {
            union.resolve_type = Some(TypeResolution::by_internal_type());
        }
        _ => {}
    }
}

/// Validates a user-supplied type name against the reserved set.
pub fn check_allowed_type_name(name: &str) -> Result<(), SchemaError> {
    if name == NODE_INTERFACE {
        return Err(SchemaError::name_conflict(
            name,
            "the type name `Node` is reserved for internal use",
        ));
    }
    if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| name.ends_with(*s)) {
        return Err(SchemaError::name_conflict(
            name,
            format!("type names ending with `{suffix}` are reserved for internal use"),
        ));
    }
    if RESERVED_SCALARS.contains(&name) {
        return Err(SchemaError::name_conflict(
            name,
            "reserved for internal use by built-in scalar types",
        ));
    }
    if !is_valid_type_name(name) {
        return Err(SchemaError::name_conflict(
            name,
            "type names must match [_a-zA-Z][_a-zA-Z0-9]* and may not start with `__`",
        ));
    }
    Ok(())
}

/// Checks general identifier validity. Leading `__` is reserved for
/// introspection.
pub(crate) fn is_valid_type_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Capitalizes the first character of a string.
pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
