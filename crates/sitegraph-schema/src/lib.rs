//! # sitegraph-schema
//!
//! The schema composition engine: merges GraphQL type definitions from
//! several sources of differing authority into one coherent, queryable
//! schema over a node data graph.
//!
//! Sources contribute in a fixed order (explicit definitions, inferred
//! definitions, third-party schemas) and later sources never displace
//! earlier ones. Types implementing the reserved `Node` interface are
//! enriched with identity fields, generated filter/sort/pagination inputs,
//! standard `findOne`/`findManyPaginated` resolvers wired onto the root
//! query, and parent/child relationship fields derived from live data.
//! Plugins then overlay per-field resolver patches against a finished
//! intermediate schema before the final schema is materialized.
//!
//! The engine builds and finalizes the type graph; executing GraphQL
//! documents against the result is [`async_graphql`]'s job.
//!
//! ## Modules
//!
//! - [`builder`] - Build orchestration
//! - [`descriptor`] - Type descriptor model
//! - [`registry`] - Type registry and name validation
//! - [`sources`] - Explicit, inferred and third-party type sources
//! - [`node_interface`] - The reserved `Node` interface and identity fields
//! - [`enrich`] - Node-type enrichment and relationship analysis
//! - [`inputs`] - Generated filter/sort/pagination types
//! - [`query`] - Standard node query resolvers
//! - [`hooks`] - Plugin hook contracts
//! - [`overlay`] - Resolver overlay
//! - [`resolve`] - Resolver chains
//! - [`finalize`] - Materialization into an executable schema
//! - [`error`] - Error types

pub mod builder;
pub mod descriptor;
pub mod enrich;
pub mod error;
pub mod finalize;
pub mod hooks;
pub mod inputs;
pub mod node_interface;
pub mod overlay;
pub mod query;
pub mod registry;
pub mod resolve;
pub mod sources;

pub use builder::{SITE_PAGE_TYPE, SchemaBuilder, SchemaBuilderConfig};
pub use descriptor::{
    FieldDescriptor, InputObjectType, InputValueSpec, InterfaceType, ObjectType, TypeDescriptor,
    TypeKind, TypeRefSpec, TypeResolution, UnionType,
};
pub use error::SchemaError;
pub use hooks::{NodeTypeFields, SchemaPlugin};
pub use overlay::{IntermediateSchema, ResolverPatch};
pub use registry::{NODE_INTERFACE, TypeRegistry};
pub use resolve::{Next, Resolve, ResolverChain, ResolverContext, resolver};
pub use sources::{ForeignSchema, TypeInference, TypeSource, ValueSampleInference};

/// Result type for schema composition operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
