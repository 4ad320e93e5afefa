//! Type descriptors: the engine's own representation of the type graph
//! under construction.
//!
//! Descriptors are name-based. A field declares the name of its type, not a
//! reference to it, so forward references across type sources are free and
//! resolution happens once at finalization. A descriptor is one of exactly
//! four kinds; each variant carries only the data relevant to its kind.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::TypeRef;
use indexmap::IndexMap;

use crate::resolve::ResolverChain;

/// The four composable type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    InputObject,
    Union,
    Interface,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Object => "object",
            Self::InputObject => "input object",
            Self::Union => "union",
            Self::Interface => "interface",
        };
        f.write_str(kind)
    }
}

/// A named type definition contributed to the registry.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Object(ObjectType),
    InputObject(InputObjectType),
    Union(UnionType),
    Interface(InterfaceType),
}

impl TypeDescriptor {
    /// Returns the type's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Object(t) => &t.name,
            Self::InputObject(t) => &t.name,
            Self::Union(t) => &t.name,
            Self::Interface(t) => &t.name,
        }
    }

    /// Returns the type's kind.
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Object(_) => TypeKind::Object,
            Self::InputObject(_) => TypeKind::InputObject,
            Self::Union(_) => TypeKind::Union,
            Self::Interface(_) => TypeKind::Interface,
        }
    }

    /// Returns the output field map for object and interface types.
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDescriptor>> {
        match self {
            Self::Object(t) => Some(&t.fields),
            Self::Interface(t) => Some(&t.fields),
            Self::InputObject(_) | Self::Union(_) => None,
        }
    }

    /// Mutable variant of [`TypeDescriptor::fields`].
    pub fn fields_mut(&mut self) -> Option<&mut IndexMap<String, FieldDescriptor>> {
        match self {
            Self::Object(t) => Some(&mut t.fields),
            Self::Interface(t) => Some(&mut t.fields),
            Self::InputObject(_) | Self::Union(_) => None,
        }
    }

    /// Returns the object descriptor, if this is an object type.
    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(t) => Some(t),
            _ => None,
        }
    }

    /// Mutable variant of [`TypeDescriptor::as_object`].
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectType> {
        match self {
            Self::Object(t) => Some(t),
            _ => None,
        }
    }
}

/// An object type: named output fields, optionally implementing interfaces.
#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDescriptor>,
    /// Implemented interfaces, by name. Forward references are fine; they
    /// are resolved at finalization.
    pub interfaces: Vec<String>,
}

impl ObjectType {
    /// Creates an empty object type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Declares an implemented interface by name.
    #[must_use]
    pub fn implement(mut self, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    /// Returns `true` if the type declares the given interface.
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }
}

/// An input object type: named input values only.
#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueSpec>,
}

impl InputObjectType {
    /// Creates an empty input object type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an input field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: InputValueSpec) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// A union type: member type names, no field map.
#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    /// Maps a runtime value to the concrete member type name. A default
    /// inspecting the value's internal type tag is installed at
    /// registration when absent.
    pub resolve_type: Option<TypeResolution>,
}

impl UnionType {
    /// Creates an empty union type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: Vec::new(),
            resolve_type: None,
        }
    }

    /// Adds a member type by name.
    #[must_use]
    pub fn member(mut self, member: impl Into<String>) -> Self {
        self.members.push(member.into());
        self
    }

    /// Sets the concrete-type resolution rule.
    #[must_use]
    pub fn resolve_type(mut self, resolution: TypeResolution) -> Self {
        self.resolve_type = Some(resolution);
        self
    }
}

/// An interface type: shared output fields plus a type-resolution rule.
#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDescriptor>,
    /// See [`UnionType::resolve_type`].
    pub resolve_type: Option<TypeResolution>,
}

impl InterfaceType {
    /// Creates an empty interface type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            resolve_type: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Sets the concrete-type resolution rule.
    #[must_use]
    pub fn resolve_type(mut self, resolution: TypeResolution) -> Self {
        self.resolve_type = Some(resolution);
        self
    }
}

/// A name-based type reference, resolved lazily at finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRefSpec {
    Named(String),
    NonNull(Box<TypeRefSpec>),
    List(Box<TypeRefSpec>),
}

impl TypeRefSpec {
    /// `Type`: a nullable named reference.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// `Type!`: a non-null named reference.
    pub fn named_nn(name: impl Into<String>) -> Self {
        Self::NonNull(Box::new(Self::Named(name.into())))
    }

    /// `[Type]`: a nullable list of nullable items.
    pub fn named_list(name: impl Into<String>) -> Self {
        Self::List(Box::new(Self::Named(name.into())))
    }

    /// `[Type!]!`: a non-null list of non-null items.
    pub fn named_nn_list_nn(name: impl Into<String>) -> Self {
        Self::NonNull(Box::new(Self::List(Box::new(Self::NonNull(Box::new(
            Self::Named(name.into()),
        ))))))
    }

    /// Returns the innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.base_name(),
        }
    }

    /// Returns `true` if a list wrapper appears anywhere in the reference.
    pub fn is_list(&self) -> bool {
        match self {
            Self::Named(_) => false,
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
        }
    }

    /// Converts into the runtime type reference.
    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            Self::Named(name) => TypeRef::Named(Cow::Owned(name.clone())),
            Self::NonNull(inner) => TypeRef::NonNull(Box::new(inner.to_type_ref())),
            Self::List(inner) => TypeRef::List(Box::new(inner.to_type_ref())),
        }
    }
}

impl fmt::Display for TypeRefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// An output field: declared type, arguments and a resolver chain.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub type_ref: TypeRefSpec,
    pub description: Option<String>,
    pub args: IndexMap<String, InputValueSpec>,
    pub resolver: ResolverChain,
}

impl FieldDescriptor {
    /// Creates a field with the default field-lookup resolver.
    pub fn new(type_ref: TypeRefSpec) -> Self {
        Self {
            type_ref,
            description: None,
            args: IndexMap::new(),
            resolver: ResolverChain::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an argument.
    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: InputValueSpec) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    /// Sets the resolver chain to a single step.
    #[must_use]
    pub fn resolver(mut self, step: Arc<dyn crate::resolve::Resolve>) -> Self {
        self.resolver = ResolverChain::of(step);
        self
    }
}

/// An input value: argument or input object field.
#[derive(Debug, Clone)]
pub struct InputValueSpec {
    pub type_ref: TypeRefSpec,
    pub description: Option<String>,
    pub default_value: Option<Value>,
}

impl InputValueSpec {
    /// Creates an input value of the given type.
    pub fn new(type_ref: TypeRefSpec) -> Self {
        Self {
            type_ref,
            description: None,
            default_value: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Maps a runtime value of an abstract type to a concrete type name.
#[derive(Clone)]
pub struct TypeResolution(Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>);

impl TypeResolution {
    /// Creates a resolution rule from a function.
    pub fn new(f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// The default rule: read the value's internal type tag
    /// (`internal.type`).
    pub fn by_internal_type() -> Self {
        Self::new(|value| {
            if let Value::Object(obj) = value
                && let Some(Value::Object(internal)) = obj.get("internal")
                && let Some(Value::String(type_name)) = internal.get("type")
            {
                return Some(type_name.clone());
            }
            None
        })
    }

    /// Applies the rule to a runtime value.
    pub fn resolve(&self, value: &Value) -> Option<String> {
        (self.0)(value)
    }
}

impl fmt::Debug for TypeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeResolution")
    }
}
