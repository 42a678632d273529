//! Atheneum Core - domain model and filter language
//!
//! This crate provides the foundational pieces of the Atheneum catalog,
//! including:
//! - Resource, Taxonomy, Alignment, Subject and ResourceStat models
//! - The filter expression grammar and its recursive-descent parser
//! - The canonical error facility with stable error codes
//! - Non-fatal warning types returned alongside degraded results
//! - Pagination page-number computation
//!
//! No database access happens here; persistence lives in atheneum-store and
//! query compilation in atheneum-engine.

pub mod errors;
pub mod filter;
pub mod logging_facility;
pub mod model;
pub mod pagination;

// Re-export commonly used types
pub use errors::{AthError, AthErrorKind, Result, Severity, Warning};
pub use filter::{parse_filter, Clause, ParseError};
pub use model::{
    Alignment, AlignmentStatus, Resource, ResourceStat, Subject, Taxonomy, TaxonomyMapping,
};
pub use pagination::PageNumbers;
