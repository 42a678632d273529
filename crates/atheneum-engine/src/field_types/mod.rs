//! Field-type strategies
//!
//! One strategy per logical field translates a single filter comparison
//! into a parameterized boolean SQL fragment. Strategies receive canonical
//! operators from the sanitizer (`= <> > >= < <= LIKE`) and values with the
//! fuzzy wildcards already applied.
//!
//! Fragments never interpolate request text; the only interpolated values
//! are integer id sets resolved beforehand through parameterized lookups.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use rusqlite::types::Value;
use rusqlite::Connection;

mod arrays;
mod complexity;
mod null_field;
mod objective;
mod scalar;
mod search;
mod subject;
mod text;

pub use arrays::{JsonField, LearningResourceTypeField, StringArrayField};
pub use complexity::{TextComplexityAttr, TextComplexityField, TypicalAgeRangeField};
pub use null_field::NullFieldType;
pub use objective::{LearningObjectiveField, ObjectiveAttr};
pub use scalar::{DurationField, NumberField, TimestampField};
pub use search::SearchFieldType;
pub use subject::{EfficacyField, SubjectField};
pub use text::CaseInsensitiveStringField;

/// Per-request flags that change how clauses compile
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileContext {
    /// Test taxonomy containment against the one-hop-expanded closure
    /// instead of only directly confirmed alignments
    pub expand_objectives: bool,

    /// Taxonomy name lookups also match the alias list
    pub alias_search: bool,
}

impl CompileContext {
    /// The resource closure column taxonomy containment tests read
    pub fn closure_column(&self) -> &'static str {
        if self.expand_objectives {
            "resources.all_taxonomy_ids"
        } else {
            "resources.direct_taxonomy_ids"
        }
    }
}

/// A compiled boolean predicate with its bound parameters
#[derive(Debug, Clone)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,

    /// Full-text query term, set only by text-search clauses so the engine
    /// can assemble a relevance rank expression
    pub text_match: Option<String>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            text_match: None,
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            text_match: None,
        }
    }
}

/// One field-type strategy
///
/// `compile` turns one comparison into a predicate fragment. Strategies may
/// run parameterized lookup queries (taxonomy and subject id resolution)
/// but never write.
pub trait FieldType: Send + Sync {
    fn compile(&self, conn: &Connection, clause: &Clause, ctx: &CompileContext)
        -> Result<SqlFragment>;
}

/// Unconditional no-match fragment
pub(crate) fn match_nothing() -> SqlFragment {
    SqlFragment::new("1=0")
}

/// Unconditional all-match fragment
pub(crate) fn match_everything() -> SqlFragment {
    SqlFragment::new("1=1")
}

/// `IS NULL` / `IS NOT NULL` test honoring not-equal inversion
pub(crate) fn null_clause(storage: &str, operator: &str) -> SqlFragment {
    SqlFragment::new(format!("{} IS {}NULL", storage, not_prefix(operator)))
}

/// `"NOT "` when the comparison is not-equal, empty otherwise
pub(crate) fn not_prefix(operator: &str) -> &'static str {
    if operator == "<>" {
        "NOT "
    } else {
        ""
    }
}

/// Interpolate a pre-resolved integer id list into an IN list
///
/// Only ids produced by our own lookup queries reach this; request text
/// never does.
pub(crate) fn id_in_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
