//! Numeric, timestamp and duration fields
//!
//! All six comparison operators compare typed values. A value that fails to
//! parse into the field's scalar type compiles to a no-match fragment, like
//! any other malformed clause value.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::field_types::{match_nothing, null_clause, CompileContext, FieldType, SqlFragment};

/// Floating-point column (e.g. rating)
#[derive(Debug, Clone)]
pub struct NumberField {
    column: String,
}

impl NumberField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl FieldType for NumberField {
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
                format!("CAST({} AS TEXT) LIKE ?", self.column),
                vec![Value::Text(clause.value.clone())],
            ));
        }

        match clause.value.trim().parse::<f64>() {
            Ok(number) => Ok(SqlFragment::with_params(
                format!("{} {} ?", self.column, clause.operator),
                vec![Value::Real(number)],
            )),
            Err(_) => Ok(match_nothing()),
        }
    }
}

/// Timestamp column stored as RFC 3339 text
///
/// Accepts a full RFC 3339 value or a bare `YYYY-MM-DD` date, which is read
/// as midnight UTC. Normalized UTC text compares correctly as text.
#[derive(Debug, Clone)]
pub struct TimestampField {
    column: String,
}

impl TimestampField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    }
}

impl FieldType for TimestampField {
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
                format!("{} LIKE ?", self.column),
                vec![Value::Text(clause.value.clone())],
            ));
        }

        match Self::parse(clause.value.trim()) {
            Some(ts) => Ok(SqlFragment::with_params(
                format!("{} {} ?", self.column, clause.operator),
                vec![Value::Text(ts.to_rfc3339())],
            )),
            None => Ok(match_nothing()),
        }
    }
}

/// Duration column stored as integer minutes
///
/// Accepts a short ISO-8601 duration (`PT1H30M`, `PT45M`, `PT90S`) or a bare
/// integer minute count.
#[derive(Debug, Clone)]
pub struct DurationField {
    column: String,
}

impl DurationField {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

/// Parse a short duration into whole minutes
pub fn parse_duration_minutes(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(minutes) = trimmed.parse::<i64>() {
        return Some(minutes);
    }

    let upper = trimmed.to_uppercase();
    let body = upper.strip_prefix("PT")?;
    if body.is_empty() {
        return None;
    }

    let mut seconds: i64 = 0;
    let mut digits = String::new();
    for ch in body.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let amount: i64 = digits.parse().ok()?;
        digits.clear();
        match ch {
            'H' => seconds += amount * 3600,
            'M' => seconds += amount * 60,
            'S' => seconds += amount,
            _ => return None,
        }
    }
    if !digits.is_empty() {
        return None;
    }
    Some(seconds / 60)
}

impl FieldType for DurationField {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() {
            return Ok(null_clause(&self.column, &clause.operator));
        }

        let operator = if clause.operator == "LIKE" {
            "="
        } else {
            clause.operator.as_str()
        };
        match parse_duration_minutes(&clause.value.replace('%', "")) {
            Some(minutes) => Ok(SqlFragment::with_params(
                format!("{} {} ?", self.column, operator),
                vec![Value::Integer(minutes)],
            )),
            None => Ok(match_nothing()),
        }
    }
}
