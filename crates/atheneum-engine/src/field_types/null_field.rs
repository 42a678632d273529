//! No-op field type
//!
//! For fields exposed in output but intentionally not filterable. An
//! equality null check matches everything, a not-equal null check matches
//! nothing, and any concrete value matches nothing.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use rusqlite::Connection;

use crate::field_types::{match_everything, match_nothing, CompileContext, FieldType, SqlFragment};

#[derive(Debug, Clone, Copy, Default)]
pub struct NullFieldType;

impl FieldType for NullFieldType {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() && clause.operator != "<>" {
            return Ok(match_everything());
        }
        Ok(match_nothing())
    }
}
