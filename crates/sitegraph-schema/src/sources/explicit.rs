//! Explicit type definitions: raw SDL fragments and pre-built descriptors.
//!
//! SDL fragments go through `async-graphql-parser`. Parse failures are fatal
//! and carry a code frame around the reported position, so a broken fragment
//! buried in a large site configuration is locatable from the error text
//! alone. Interface and field type references are registered by name and
//! resolved at finalization, so a fragment may reference types contributed
//! later.

use async_graphql_parser::{Pos, parse_schema, types as ast};
use tracing::debug;

use crate::descriptor::{
    FieldDescriptor, InputObjectType, InputValueSpec, InterfaceType, ObjectType, TypeDescriptor,
    TypeRefSpec, UnionType,
};
use crate::error::SchemaError;
use crate::registry::TypeRegistry;

/// One explicitly contributed type definition.
#[derive(Debug, Clone)]
pub enum TypeSource {
    /// A raw SDL fragment, possibly holding several definitions.
    Sdl(String),
    /// A pre-built descriptor, registered as-is.
    Descriptor(TypeDescriptor),
}

impl From<TypeDescriptor> for TypeSource {
    fn from(descriptor: TypeDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

/// Registers every type a source contributes.
pub fn register_type_source(
    registry: &mut TypeRegistry,
    source: TypeSource,
) -> Result<(), SchemaError> {
    match source {
        TypeSource::Descriptor(descriptor) => {
            registry.register(descriptor)?;
        }
        TypeSource::Sdl(sdl) => {
            for descriptor in parse_sdl(&sdl)? {
                debug!(type_name = %descriptor.name(), "Registering explicit SDL type");
                registry.register(descriptor)?;
            }
        }
    }
    Ok(())
}

/// Parses an SDL fragment into descriptors.
fn parse_sdl(sdl: &str) -> Result<Vec<TypeDescriptor>, SchemaError> {
    let document = parse_schema(sdl).map_err(|err| {
        let excerpt = err.positions().next().map(|pos| code_frame(sdl, pos));
        SchemaError::Parse {
            message: err.to_string(),
            excerpt,
        }
    })?;

    let mut descriptors = Vec::new();
    for definition in document.definitions {
        let ast::TypeSystemDefinition::Type(def) = definition else {
            return Err(SchemaError::parse(
                "schema and directive definitions are not supported in type fragments",
            ));
        };
        let def = def.node;
        if def.extend {
            return Err(SchemaError::parse(format!(
                "cannot extend type `{}`: type extensions are not supported",
                def.name.node
            )));
        }
        descriptors.push(convert_definition(def)?);
    }
    Ok(descriptors)
}

fn convert_definition(def: ast::TypeDefinition) -> Result<TypeDescriptor, SchemaError> {
    let name = def.name.node.to_string();
    let description = def.description.map(|d| d.node);
    match def.kind {
        ast::TypeKind::Object(object) => {
            let mut out = ObjectType::new(name);
            out.description = description;
            for interface in object.implements {
                out = out.implement(interface.node.to_string());
            }
            for field in object.fields {
                let (field_name, descriptor) = convert_field(field.node);
                out = out.field(field_name, descriptor);
            }
            Ok(TypeDescriptor::Object(out))
        }
        ast::TypeKind::Interface(interface) => {
            let mut out = InterfaceType::new(name);
            out.description = description;
            for field in interface.fields {
                let (field_name, descriptor) = convert_field(field.node);
                out = out.field(field_name, descriptor);
            }
            Ok(TypeDescriptor::Interface(out))
        }
        ast::TypeKind::Union(union) => {
            let mut out = UnionType::new(name);
            out.description = description;
            for member in union.members {
                out = out.member(member.node.to_string());
            }
            Ok(TypeDescriptor::Union(out))
        }
        ast::TypeKind::InputObject(input) => {
            let mut out = InputObjectType::new(name);
            out.description = description;
            for field in input.fields {
                let (field_name, value) = convert_input_value(field.node);
                out = out.field(field_name, value);
            }
            Ok(TypeDescriptor::InputObject(out))
        }
        ast::TypeKind::Scalar | ast::TypeKind::Enum(_) => Err(SchemaError::parse(format!(
            "cannot define `{name}`: only object, interface, union and input object types may be contributed"
        ))),
    }
}

fn convert_field(field: ast::FieldDefinition) -> (String, FieldDescriptor) {
    let mut out = FieldDescriptor::new(convert_type(&field.ty.node));
    out.description = field.description.map(|d| d.node);
    for arg in field.arguments {
        let (arg_name, value) = convert_input_value(arg.node);
        out.args.insert(arg_name, value);
    }
    (field.name.node.to_string(), out)
}

fn convert_input_value(value: ast::InputValueDefinition) -> (String, InputValueSpec) {
    let mut out = InputValueSpec::new(convert_type(&value.ty.node));
    out.description = value.description.map(|d| d.node);
    out.default_value = value.default_value.map(|v| v.node);
    (value.name.node.to_string(), out)
}

fn convert_type(ty: &ast::Type) -> TypeRefSpec {
    let base = match &ty.base {
        ast::BaseType::Named(name) => TypeRefSpec::Named(name.to_string()),
        ast::BaseType::List(inner) => TypeRefSpec::List(Box::new(convert_type(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRefSpec::NonNull(Box::new(base))
    }
}

/// Renders a gutter-numbered excerpt around a parse position, two lines of
/// context on each side, with a caret under the offending column.
fn code_frame(source: &str, pos: Pos) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line = pos.line.max(1);
    let first = line.saturating_sub(2).max(1);
    let last = (line + 2).min(lines.len().max(1));
    let width = last.to_string().len();

    let mut out = String::new();
    for number in first..=last {
        let Some(text) = lines.get(number - 1) else {
            continue;
        };
        let marker = if number == line { ">" } else { " " };
        out.push_str(&format!("{marker} {number:>width$} | {text}\n"));
        if number == line {
            let caret_pad = " ".repeat(pos.column.saturating_sub(1));
            out.push_str(&format!("  {:>width$} | {caret_pad}^\n", ""));
        }
    }
    out.trim_end().to_string()
}
