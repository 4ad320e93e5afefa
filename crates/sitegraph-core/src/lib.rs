//! # sitegraph-core
//!
//! Core building blocks shared by the sitegraph schema engine:
//!
//! - The node data model ([`Node`], [`NodeId`], [`NodeInternal`]): every
//!   storable record is a node with identity, lifecycle metadata and
//!   parent/child links.
//! - The storage abstraction ([`NodeStore`]) that schema composition and
//!   generated resolvers query against, plus an in-memory backend
//!   ([`InMemoryNodeStore`]) suitable for tests and small data sets.
//! - The diagnostics reporter ([`Reporter`]) through which recoverable
//!   composition conflicts are surfaced to the operator.
//!
//! ## Modules
//!
//! - [`node`] - Node data model
//! - [`store`] - Storage trait and in-memory backend
//! - [`report`] - Diagnostics reporter
//! - [`error`] - Core error type

pub mod error;
pub mod node;
pub mod report;
pub mod store;

pub use error::CoreError;
pub use node::{Node, NodeId, NodeInternal};
pub use report::{RecordingReporter, Reporter, TracingReporter};
pub use store::{InMemoryNodeStore, NodeStore, QueryPath};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
