//! Engine configuration and external hooks
//!
//! Everything an embedding application can inject lives here: extension
//! field descriptors, the alias-search switch, and the global visibility
//! filter. The configuration is consumed once when the [`crate::QueryEngine`]
//! is constructed; there is no runtime-mutable global state.

#![allow(clippy::result_large_err)]

use rusqlite::types::Value;

use crate::field_map::FieldDescriptor;

/// Global row-visibility hook applied to every count and page query
///
/// Implementations return an extra boolean predicate that is ANDed into the
/// WHERE clause, or `None` for no restriction. The predicate must reference
/// only `resources` columns and use `?` placeholders for its parameters.
pub trait VisibilityFilter: Send + Sync {
    fn predicate(&self) -> Option<(String, Vec<Value>)>;
}

/// Default visibility filter: every resource is visible
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisibility;

impl VisibilityFilter for NoopVisibility {
    fn predicate(&self) -> Option<(String, Vec<Value>)> {
        None
    }
}

/// Startup configuration for the query engine
pub struct EngineConfig {
    /// Extra field descriptors registered by the embedding application.
    /// Descriptors marked custom skip the live-schema column check.
    pub extension_fields: Vec<FieldDescriptor>,

    /// When true, taxonomy name lookups also match the alias list
    pub search_by_aliases: bool,

    /// Row-visibility hook; defaults to [`NoopVisibility`]
    pub visibility: Box<dyn VisibilityFilter>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extension_fields: Vec::new(),
            search_by_aliases: false,
            visibility: Box::new(NoopVisibility),
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("extension_fields", &self.extension_fields.len())
            .field("search_by_aliases", &self.search_by_aliases)
            .finish()
    }
}
