//! Full-text search field
//!
//! Matches against the external-content FTS index over resource name and
//! description. The raw value is stripped of wildcards, lowercased and
//! tokenized into quoted FTS terms so user input can never reach the MATCH
//! syntax unescaped. The compiled fragment carries its query term so the
//! engine can assemble a relevance rank expression from it.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::field_types::{match_nothing, CompileContext, FieldType, SqlFragment};

/// Ranked full-text match over name and description
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFieldType;

/// Quote each whitespace token for FTS5 so operators and punctuation in the
/// value are treated literally
pub fn fts_query(value: &str) -> String {
    value
        .replace('%', "")
        .to_lowercase()
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

impl FieldType for SearchFieldType {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() {
            // no searchable text and no alignment at all
            let absent = "(trim(resources.name) = '' \
                 AND trim(coalesce(resources.description, '')) = '' \
                 AND NOT EXISTS (SELECT 1 FROM alignments \
                 WHERE alignments.resource_id = resources.id))";
            let sql = if clause.operator == "<>" {
                format!("NOT {}", absent)
            } else {
                absent.to_string()
            };
            return Ok(SqlFragment::new(sql));
        }

        let query = fts_query(&clause.value);
        if query.is_empty() {
            return Ok(match_nothing());
        }

        let negate = if clause.operator == "<>" { "NOT " } else { "" };
        let mut fragment = SqlFragment::with_params(
            format!(
                "{}resources.id IN (SELECT rowid FROM resources_fts WHERE resources_fts MATCH ?)",
                negate
            ),
            vec![Value::Text(query.clone())],
        );
        fragment.text_match = Some(query);
        Ok(fragment)
    }
}
