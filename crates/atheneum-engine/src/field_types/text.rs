//! Case-insensitive text fields

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::field_types::{null_clause, CompileContext, FieldType, SqlFragment};

/// Plain text column
///
/// Equality and ordering compare as typed; the fuzzy operator compares
/// case-insensitively. `truncate` preserves the historical long-text
/// behavior of comparing only a fixed prefix.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveStringField {
    column: String,
    truncate: Option<usize>,
}

impl CaseInsensitiveStringField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            truncate: None,
        }
    }

    pub fn truncated(column: impl Into<String>, prefix_len: usize) -> Self {
        Self {
            column: column.into(),
            truncate: Some(prefix_len),
        }
    }
}

impl FieldType for CaseInsensitiveStringField {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() {
            return Ok(null_clause(&self.column, &clause.operator));
        }

        if clause.operator == "LIKE" {
            return Ok(SqlFragment::with_params(
                format!("lower({}) LIKE ?", self.column),
                vec![Value::Text(clause.value.to_lowercase())],
            ));
        }

        let lhs = match self.truncate {
            Some(len) => format!("substr({}, 1, {})", self.column, len),
            None => self.column.clone(),
        };
        Ok(SqlFragment::with_params(
            format!("{} {} ?", lhs, clause.operator),
            vec![Value::Text(clause.value.clone())],
        ))
    }
}
