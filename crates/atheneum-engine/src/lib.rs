//! Atheneum Engine - filter-query compilation and search orchestration
//!
//! Compiles the textual filter language into parameterized SQL against the
//! denormalized resource columns, and orchestrates the count/page queries,
//! sorting, pagination metadata and soft warnings for a search request.
//!
//! The flow per request: sanitize the selection/sort/order parameters,
//! parse the filter into clauses, compile each clause through its field
//! type, run the count and page queries, then project the page into output
//! records. The field-type registry is built once at startup from an
//! [`EngineConfig`] and is immutable afterwards.

pub mod config;
pub mod engine;
pub mod field_map;
pub mod field_types;
pub mod links;
pub mod output;
pub mod sanitize;
pub mod transform;

pub use atheneum_core::errors::Result;
pub use config::{EngineConfig, NoopVisibility, VisibilityFilter};
pub use engine::{Pagination, QueryEngine, SearchOutcome, SearchRequest};
pub use field_map::{FieldDescriptor, FieldMap};
pub use field_types::{CompileContext, FieldType, SqlFragment};
