//! Array- and JSON-backed fields
//!
//! The array columns hold JSON arrays of strings; containment tests run
//! through `json_each`. Null checks test emptiness rather than SQL NULL
//! because the columns default to `'[]'`.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::field_types::{
    match_everything, not_prefix, null_clause, CompileContext, FieldType, SqlFragment,
};

/// JSON string-array column (accessibility attributes, audience roles)
#[derive(Debug, Clone)]
pub struct StringArrayField {
    column: String,
}

impl StringArrayField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl FieldType for StringArrayField {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() {
            let comparison = if clause.operator == "<>" { ">" } else { "=" };
            return Ok(SqlFragment::new(format!(
                "json_array_length({}) {} 0",
                self.column, comparison
            )));
        }

        if clause.operator == "LIKE" {
            return Ok(SqlFragment::with_params(
                format!(
                    "EXISTS (SELECT 1 FROM json_each({}) WHERE lower(json_each.value) LIKE ?)",
                    self.column
                ),
                vec![Value::Text(clause.value.to_lowercase())],
            ));
        }

        // comma-split overlap, case-insensitively
        let values: Vec<Value> = clause
            .value
            .split(',')
            .map(|v| Value::Text(v.trim().to_lowercase()))
            .collect();
        let placeholders = vec!["?"; values.len()].join(", ");
        Ok(SqlFragment::with_params(
            format!(
                "{}EXISTS (SELECT 1 FROM json_each({}) WHERE lower(json_each.value) IN ({}))",
                not_prefix(&clause.operator),
                self.column,
                placeholders
            ),
            values,
        ))
    }
}

/// Resource-type enum column matched by comma-split IN list
#[derive(Debug, Clone)]
pub struct LearningResourceTypeField {
    column: String,
}

impl LearningResourceTypeField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl FieldType for LearningResourceTypeField {
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

        let values: Vec<Value> = clause
            .value
            .split(',')
            .map(|v| Value::Text(v.trim().to_string()))
            .collect();
        let placeholders = vec!["?"; values.len()].join(", ");
        Ok(SqlFragment::with_params(
            format!(
                "{}{} IN ({})",
                not_prefix(&clause.operator),
                self.column,
                placeholders
            ),
            values,
        ))
    }
}

/// JSON document column, optionally addressed at one subkey
///
/// `array_subkey` marks subkeys holding string arrays; those compare by
/// case-insensitive overlap instead of scalar comparison.
#[derive(Debug, Clone)]
pub struct JsonField {
    column: String,
    subkey: Option<String>,
    array_subkey: bool,
}

impl JsonField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            subkey: None,
            array_subkey: false,
        }
    }

    pub fn subkey(column: impl Into<String>, subkey: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            subkey: Some(subkey.into()),
            array_subkey: false,
        }
    }

    pub fn array_subkey(column: impl Into<String>, subkey: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            subkey: Some(subkey.into()),
            array_subkey: true,
        }
    }

    fn path(&self) -> Option<String> {
        self.subkey
            .as_ref()
            .map(|k| format!("$.\"{}\"", k.replace('"', "")))
    }
}

impl FieldType for JsonField {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        let Some(path) = self.path() else {
            // whole-document comparisons are only meaningful for null checks
            if clause.is_null_sentinel() {
                return Ok(null_clause(&self.column, &clause.operator));
            }
            return Ok(match_everything());
        };

        if clause.is_null_sentinel() {
            return Ok(SqlFragment::with_params(
                format!(
                    "json_extract({}, ?) IS {}NULL",
                    self.column,
                    not_prefix(&clause.operator)
                ),
                vec![Value::Text(path)],
            ));
        }

        if self.array_subkey {
            let mut params = vec![Value::Text(path)];
            let values: Vec<Value> = clause
                .value
                .split(',')
                .map(|v| Value::Text(v.trim().to_lowercase()))
                .collect();
            let placeholders = vec!["?"; values.len()].join(", ");
            params.extend(values);
            return Ok(SqlFragment::with_params(
                format!(
                    "{}EXISTS (SELECT 1 FROM json_each(json_extract({}, ?)) \
                     WHERE lower(json_each.value) IN ({}))",
                    not_prefix(&clause.operator),
                    self.column,
                    placeholders
                ),
                params,
            ));
        }

        if clause.operator == "LIKE" {
            return Ok(SqlFragment::with_params(
                format!("lower(json_extract({}, ?)) LIKE ?", self.column),
                vec![Value::Text(path), Value::Text(clause.value.to_lowercase())],
            ));
        }

        Ok(SqlFragment::with_params(
            format!("json_extract({}, ?) {} ?", self.column, clause.operator),
            vec![Value::Text(path), Value::Text(clause.value.clone())],
        ))
    }
}
