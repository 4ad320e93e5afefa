//! Generated input and envelope types.
//!
//! For every node type the enricher synthesizes a filter input, a sort
//! input and a pagination envelope. Generated names use the reserved
//! `FilterInput`/`SortInput` suffixes, which is why user registration of
//! such names is rejected up front. Shared building blocks (the per-scalar
//! operator inputs, `PageInfo`, `SortOrderEnum`) are registered once and
//! reused across node types.

use crate::descriptor::{
    FieldDescriptor, InputObjectType, InputValueSpec, ObjectType, TypeDescriptor, TypeRefSpec,
};
use crate::error::SchemaError;
use crate::registry::{RESERVED_SCALARS, RESERVED_SUFFIXES, TypeRegistry};

/// Name of the shared sort order enum, registered at finalization.
pub const SORT_ORDER_ENUM: &str = "SortOrderEnum";

/// Name of the shared pagination metadata type.
pub const PAGE_INFO: &str = "PageInfo";

const OPERATORS: [&str; 8] = ["eq", "ne", "in", "nin", "lt", "lte", "gt", "gte"];

/// `{Type}FilterInput`
pub fn filter_input_name(type_name: &str) -> String {
    format!("{type_name}{}", RESERVED_SUFFIXES[0])
}

/// `{Type}SortInput`
pub fn sort_input_name(type_name: &str) -> String {
    format!("{type_name}{}", RESERVED_SUFFIXES[1])
}

/// `{Type}Connection`
pub fn connection_name(type_name: &str) -> String {
    format!("{type_name}Connection")
}

/// Removes the generated artifacts for a node type so enrichment can run
/// again on a type whose shape changed. Shared building blocks stay.
pub fn discard_input_artifacts(registry: &mut TypeRegistry, type_name: &str) {
    registry.remove(&filter_input_name(type_name));
    registry.remove(&sort_input_name(type_name));
    registry.remove(&connection_name(type_name));
}

/// Synthesizes `{Type}FilterInput` from the type's scalar fields and
/// returns its name. Non-scalar and list fields are not filterable.
pub fn filter_input(
    registry: &mut TypeRegistry,
    object: &ObjectType,
) -> Result<String, SchemaError> {
    let name = filter_input_name(&object.name);
    let mut input = InputObjectType::new(name.clone());
    for (field_name, field) in &object.fields {
        let base = field.type_ref.base_name().to_string();
        if field.type_ref.is_list() || !RESERVED_SCALARS.contains(&base.as_str()) {
            continue;
        }
        let operator_input = ensure_operator_input(registry, &base)?;
        input = input.field(
            field_name.clone(),
            InputValueSpec::new(TypeRefSpec::named(operator_input)),
        );
    }
    registry.register_internal(TypeDescriptor::InputObject(input))?;
    Ok(name)
}

/// Synthesizes `{Type}SortInput` and returns its name.
pub fn sort_input(
    registry: &mut TypeRegistry,
    object: &ObjectType,
) -> Result<String, SchemaError> {
    let name = sort_input_name(&object.name);
    let input = InputObjectType::new(name.clone())
        .field(
            "fields",
            InputValueSpec::new(TypeRefSpec::named_nn_list_nn("String")),
        )
        .field("order", InputValueSpec::new(TypeRefSpec::named(SORT_ORDER_ENUM)));
    registry.register_internal(TypeDescriptor::InputObject(input))?;
    Ok(name)
}

/// Synthesizes the `{Type}Connection` pagination envelope and returns its
/// name. Registers the shared `PageInfo` on first use.
pub fn pagination_type(
    registry: &mut TypeRegistry,
    type_name: &str,
) -> Result<String, SchemaError> {
    ensure_page_info(registry)?;
    let name = connection_name(type_name);
    let connection = ObjectType::new(name.clone())
        .field("totalCount", FieldDescriptor::new(TypeRefSpec::named_nn("Int")))
        .field(
            "nodes",
            FieldDescriptor::new(TypeRefSpec::named_nn_list_nn(type_name)),
        )
        .field(
            "pageInfo",
            FieldDescriptor::new(TypeRefSpec::named_nn(PAGE_INFO)),
        );
    registry.register_internal(TypeDescriptor::Object(connection))?;
    Ok(name)
}

/// Registers `{Scalar}QueryOperatorInput` on first use and returns its name.
fn ensure_operator_input(
    registry: &mut TypeRegistry,
    scalar: &str,
) -> Result<String, SchemaError> {
    let name = format!("{scalar}QueryOperatorInput");
    if registry.contains(&name) {
        return Ok(name);
    }
    let mut input = InputObjectType::new(name.clone());
    for operator in OPERATORS {
        let type_ref = match operator {
            "in" | "nin" => TypeRefSpec::named_list(scalar),
            _ => TypeRefSpec::named(scalar),
        };
        input = input.field(operator, InputValueSpec::new(type_ref));
    }
    registry.register_internal(TypeDescriptor::InputObject(input))?;
    Ok(name)
}

fn ensure_page_info(registry: &mut TypeRegistry) -> Result<(), SchemaError> {
    if registry.contains(PAGE_INFO) {
        return Ok(());
    }
    let page_info = ObjectType::new(PAGE_INFO)
        .field("currentPage", FieldDescriptor::new(TypeRefSpec::named_nn("Int")))
        .field(
            "hasNextPage",
            FieldDescriptor::new(TypeRefSpec::named_nn("Boolean")),
        )
        .field(
            "hasPreviousPage",
            FieldDescriptor::new(TypeRefSpec::named_nn("Boolean")),
        )
        .field("itemCount", FieldDescriptor::new(TypeRefSpec::named_nn("Int")))
        .field("pageCount", FieldDescriptor::new(TypeRefSpec::named_nn("Int")))
        .field("perPage", FieldDescriptor::new(TypeRefSpec::named("Int")));
    registry.register_internal(TypeDescriptor::Object(page_info))?;
    Ok(())
}
