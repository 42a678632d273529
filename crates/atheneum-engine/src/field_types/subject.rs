//! Subject and efficacy fields

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use atheneum_store::repo::SubjectRepo;
use rusqlite::Connection;

use crate::field_types::{
    id_in_list, match_everything, match_nothing, not_prefix, CompileContext, FieldType,
    SqlFragment,
};

/// Subject tag filter
///
/// Resolves subject names to ids through the subjects table, then tests
/// containment in the resource's subject-id closure. No matching subject
/// resolves to no-match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectField;

impl FieldType for SubjectField {
    fn compile(
        &self,
        conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() {
            let comparison = if clause.operator == "<>" { ">" } else { "=" };
            return Ok(SqlFragment::new(format!(
                "json_array_length(resources.subject_ids) {} 0",
                comparison
            )));
        }

        let ids = if clause.operator == "LIKE" {
            SubjectRepo::ids_by_name_contains(conn, &clause.value.replace('%', ""))?
        } else {
            SubjectRepo::ids_by_name(conn, &clause.value)?
        };
        if ids.is_empty() {
            return Ok(match_nothing());
        }

        Ok(SqlFragment::new(format!(
            "{}EXISTS (SELECT 1 FROM json_each(resources.subject_ids) \
             WHERE json_each.value IN ({}))",
            not_prefix(&clause.operator),
            id_in_list(&ids)
        )))
    }
}

/// Efficacy pseudo-field
///
/// Only the null check is meaningful as a filter: it tests whether any
/// effectiveness statistics back the resource. Any concrete value matches
/// everything; per-taxonomy scores are reached through sort subkeys and
/// output, not filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EfficacyField;

impl FieldType for EfficacyField {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() {
            return Ok(SqlFragment::new(format!(
                "{}(json_array_length(resources.resource_stat_ids) = 0)",
                not_prefix(&clause.operator)
            )));
        }
        Ok(match_everything())
    }
}
