//! Finalization: materializing the registry into an executable schema.
//!
//! Every name-based reference is resolved here, in one place. A dangling
//! reference is a `BuildFailed` error naming the missing type; a partial
//! schema never escapes. Resolver chains are wrapped into field futures,
//! and values of abstract-typed fields are tagged with their concrete type
//! through the stored type resolution rule.

use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, Scalar, Schema, Union, ValueAccessor,
};
use indexmap::IndexMap;
use tracing::{debug, trace};

use sitegraph_core::{NodeStore, QueryPath};

use crate::builder::SchemaBuilderConfig;
use crate::descriptor::{
    FieldDescriptor, InputValueSpec, TypeDescriptor, TypeRefSpec, TypeResolution,
};
use crate::error::SchemaError;
use crate::inputs::SORT_ORDER_ENUM;
use crate::registry::{RESERVED_SCALARS, TypeRegistry};
use crate::resolve::{ResolverContext, json_to_graphql_value};

/// Builds the executable schema from the registry.
pub fn finalize(
    registry: &TypeRegistry,
    store: &Arc<dyn NodeStore>,
    config: &SchemaBuilderConfig,
) -> Result<Schema, SchemaError> {
    validate_references(registry)?;
    debug!(types = registry.type_names().len(), "Finalizing schema");

    let mut builder = Schema::build("Query", None, None);

    for (name, description) in [
        ("Date", "An ISO-8601 encoded date or datetime string"),
        ("JSON", "An arbitrary JSON value"),
    ] {
        builder = builder.register(Scalar::new(name).description(description));
    }
    builder = builder.register(
        Enum::new(SORT_ORDER_ENUM)
            .item(EnumItem::new("ASC"))
            .item(EnumItem::new("DESC")),
    );

    for (name, registered) in registry.iter() {
        trace!(type_name = %name, kind = %registered.descriptor.kind(), "Registering type");
        match &registered.descriptor {
            TypeDescriptor::Object(object) => {
                let mut out = Object::new(&object.name);
                if let Some(description) = &object.description {
                    out = out.description(description);
                }
                for interface in &object.interfaces {
                    out = out.implement(interface);
                }
                for (field_name, field) in &object.fields {
                    out = out.field(materialize_field(registry, store, field_name, field));
                }
                builder = builder.register(out);
            }
            TypeDescriptor::InputObject(input) => {
                let mut out = InputObject::new(&input.name);
                if let Some(description) = &input.description {
                    out = out.description(description);
                }
                for (field_name, value) in &input.fields {
                    out = out.field(materialize_input_value(field_name, value));
                }
                builder = builder.register(out);
            }
            TypeDescriptor::Union(union) => {
                let mut out = Union::new(&union.name);
                if let Some(description) = &union.description {
                    out = out.description(description);
                }
                for member in &union.members {
                    out = out.possible_type(member);
                }
                builder = builder.register(out);
            }
            TypeDescriptor::Interface(interface) => {
                let mut out = Interface::new(&interface.name);
                if let Some(description) = &interface.description {
                    out = out.description(description);
                }
                for (field_name, field) in &interface.fields {
                    let mut iface_field =
                        InterfaceField::new(field_name, field.type_ref.to_type_ref());
                    if let Some(description) = &field.description {
                        iface_field = iface_field.description(description);
                    }
                    for (arg_name, value) in &field.args {
                        iface_field = iface_field.argument(materialize_input_value(arg_name, value));
                    }
                    out = out.field(iface_field);
                }
                builder = builder.register(out);
            }
        }
    }

    let mut query = Object::new("Query").description("The site data graph query root");
    if registry.query_fields().is_empty() {
        query = query.field(Field::new(
            "_placeholder",
            async_graphql::dynamic::TypeRef::named(async_graphql::dynamic::TypeRef::STRING),
            |_| FieldFuture::new(async { Ok(None::<Value>) }),
        ));
    }
    for (field_name, field) in registry.query_fields() {
        query = query.field(materialize_field(registry, store, field_name, field));
    }
    builder = builder.register(query);

    builder = builder
        .limit_depth(config.max_depth)
        .limit_complexity(config.max_complexity);
    if !config.introspection {
        builder = builder.disable_introspection();
    }

    builder
        .finish()
        .map_err(|err| SchemaError::BuildFailed(err.to_string()))
}

/// Wraps a field descriptor's resolver chain into a dynamic field.
fn materialize_field(
    registry: &TypeRegistry,
    store: &Arc<dyn NodeStore>,
    field_name: &str,
    field: &FieldDescriptor,
) -> Field {
    let chain = field.resolver.clone();
    let store = store.clone();
    let name = field_name.to_string();
    let wrap = abstract_resolution(registry, &field.type_ref);
    let is_list = field.type_ref.is_list();

    let mut out = Field::new(field_name, field.type_ref.to_type_ref(), move |ctx| {
        let chain = chain.clone();
        let store = store.clone();
        let field_name = name.clone();
        let wrap = wrap.clone();
        FieldFuture::new(async move {
            let parent = ctx
                .parent_value
                .as_value()
                .cloned()
                .unwrap_or(Value::Null);
            let mut args: IndexMap<String, Value> = IndexMap::new();
            for (key, value) in ctx.args.iter() {
                args.insert(
                    key.to_string(),
                    json_to_graphql_value(value_accessor_to_json(&value)?),
                );
            }
            let path = QueryPath::from_segments(
                ctx.path_node.map(|p| p.to_string_vec()).unwrap_or_default(),
            );
            let rctx = ResolverContext {
                parent,
                args,
                store,
                path,
                field_name,
            };
            match chain.resolve(&rctx).await? {
                None => Ok(None),
                Some(value) => match &wrap {
                    None => Ok(Some(FieldValue::value(value))),
                    Some(resolution) => {
                        Ok(Some(tag_concrete_type(value, resolution, is_list)?))
                    }
                },
            }
        })
    });
    if let Some(description) = &field.description {
        out = out.description(description);
    }
    for (arg_name, value) in &field.args {
        out = out.argument(materialize_input_value(arg_name, value));
    }
    out
}

fn materialize_input_value(name: &str, value: &InputValueSpec) -> InputValue {
    let mut out = InputValue::new(name, value.type_ref.to_type_ref());
    if let Some(description) = &value.description {
        out = out.description(description);
    }
    if let Some(default) = &value.default_value {
        out = out.default_value(default.clone());
    }
    out
}

/// Returns the type resolution rule when the field's base type is abstract.
fn abstract_resolution(registry: &TypeRegistry, type_ref: &TypeRefSpec) -> Option<TypeResolution> {
    match &registry.get(type_ref.base_name())?.descriptor {
        TypeDescriptor::Interface(interface) => interface.resolve_type.clone(),
        TypeDescriptor::Union(union) => union.resolve_type.clone(),
        _ => None,
    }
}

/// Tags a value (or each item of a list value) with its concrete type name.
fn tag_concrete_type(
    value: Value,
    resolution: &TypeResolution,
    is_list: bool,
) -> Result<FieldValue<'static>, async_graphql::Error> {
    if is_list {
        let Value::List(items) = value else {
            return Err(async_graphql::Error::new(
                "expected a list value for a list-typed field",
            ));
        };
        let tagged: Result<Vec<FieldValue<'static>>, async_graphql::Error> = items
            .into_iter()
            .map(|item| tag_concrete_type(item, resolution, false))
            .collect();
        return Ok(FieldValue::list(tagged?));
    }
    let Some(type_name) = resolution.resolve(&value) else {
        return Err(async_graphql::Error::new(
            "unable to resolve the concrete type of an abstract-typed value",
        ));
    };
    Ok(FieldValue::value(value).with_type(type_name))
}

/// Converts an argument accessor to JSON.
fn value_accessor_to_json(
    value: &ValueAccessor<'_>,
) -> Result<serde_json::Value, async_graphql::Error> {
    if value.is_null() {
        return Ok(serde_json::Value::Null);
    }
    if let Ok(b) = value.boolean() {
        return Ok(serde_json::Value::Bool(b));
    }
    if let Ok(i) = value.i64() {
        return Ok(serde_json::Value::Number(i.into()));
    }
    if let Ok(f) = value.f64() {
        return Ok(serde_json::json!(f));
    }
    if let Ok(s) = value.string() {
        return Ok(serde_json::Value::String(s.to_string()));
    }
    if let Ok(e) = value.enum_name() {
        return Ok(serde_json::Value::String(e.to_string()));
    }
    if let Ok(list) = value.list() {
        let items: Result<Vec<serde_json::Value>, async_graphql::Error> =
            list.iter().map(|v| value_accessor_to_json(&v)).collect();
        return Ok(serde_json::Value::Array(items?));
    }
    if let Ok(obj) = value.object() {
        let mut map = serde_json::Map::new();
        for (k, v) in obj.iter() {
            map.insert(k.to_string(), value_accessor_to_json(&v)?);
        }
        return Ok(serde_json::Value::Object(map));
    }
    Ok(serde_json::Value::Null)
}

/// Checks that every name-based reference points at a registered type or a
/// built-in.
fn validate_references(registry: &TypeRegistry) -> Result<(), SchemaError> {
    let known = |name: &str| {
        registry.contains(name) || RESERVED_SCALARS.contains(&name) || name == SORT_ORDER_ENUM
    };

    for (type_name, registered) in registry.iter() {
        match &registered.descriptor {
            TypeDescriptor::Object(object) => {
                for interface in &object.interfaces {
                    let is_interface = matches!(
                        registry.get(interface).map(|t| &t.descriptor),
                        Some(TypeDescriptor::Interface(_))
                    );
                    if !is_interface {
                        return Err(SchemaError::BuildFailed(format!(
                            "type `{type_name}` implements `{interface}`, which is not a registered interface"
                        )));
                    }
                }
                check_field_refs(type_name, &object.fields, &known)?;
            }
            TypeDescriptor::Interface(interface) => {
                check_field_refs(type_name, &interface.fields, &known)?;
            }
            TypeDescriptor::Union(union) => {
                for member in &union.members {
                    let is_object = matches!(
                        registry.get(member).map(|t| &t.descriptor),
                        Some(TypeDescriptor::Object(_))
                    );
                    if !is_object {
                        return Err(SchemaError::BuildFailed(format!(
                            "union `{type_name}` lists `{member}`, which is not a registered object type"
                        )));
                    }
                }
            }
            TypeDescriptor::InputObject(input) => {
                for (field_name, value) in &input.fields {
                    if !known(value.type_ref.base_name()) {
                        return Err(SchemaError::BuildFailed(format!(
                            "input `{type_name}.{field_name}` references unknown type `{}`",
                            value.type_ref.base_name()
                        )));
                    }
                }
            }
        }
    }
    for (field_name, field) in registry.query_fields() {
        if !known(field.type_ref.base_name()) {
            return Err(SchemaError::BuildFailed(format!(
                "query field `{field_name}` references unknown type `{}`",
                field.type_ref.base_name()
            )));
        }
    }
    Ok(())
}

fn check_field_refs(
    type_name: &str,
    fields: &IndexMap<String, FieldDescriptor>,
    known: &impl Fn(&str) -> bool,
) -> Result<(), SchemaError> {
    for (field_name, field) in fields {
        if !known(field.type_ref.base_name()) {
            return Err(SchemaError::BuildFailed(format!(
                "field `{type_name}.{field_name}` references unknown type `{}`",
                field.type_ref.base_name()
            )));
        }
        for (arg_name, value) in &field.args {
            if !known(value.type_ref.base_name()) {
                return Err(SchemaError::BuildFailed(format!(
                    "argument `{type_name}.{field_name}({arg_name}:)` references unknown type `{}`",
                    value.type_ref.base_name()
                )));
            }
        }
    }
    Ok(())
}
