//! Type source adapters.
//!
//! Three sources contribute types, applied strictly in this order: explicit
//! definitions, inferred definitions, third-party schemas. Later sources
//! never displace earlier ones; inference fills gaps and third-party types
//! are merged wholesale under their own names.

mod explicit;
mod inferred;
mod third_party;

pub use explicit::{TypeSource, register_type_source};
pub use inferred::{TypeInference, ValueSampleInference};
pub use third_party::{ForeignSchema, merge_foreign_schema};
