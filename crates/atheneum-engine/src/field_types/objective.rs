//! Learning-objective (taxonomy) field family
//!
//! Every filterable taxonomy attribute first resolves a set of matching
//! taxonomy ids through a parameterized lookup, expands it with descendants,
//! and then tests containment against the resource's closure column. An
//! empty resolved set short-circuits to no-match; the closure column is
//! never queried with an empty id list.
//!
//! For null-sentinel attribute queries the inversion is already folded into
//! the id lookup (ids where the attribute IS NULL), so the containment test
//! itself is never negated on that branch.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use atheneum_store::repo::{TaxonomyRepo, TaxonomyTextColumn};
use rusqlite::Connection;

use crate::field_types::{
    id_in_list, match_nothing, not_prefix, CompileContext, FieldType, SqlFragment,
};

/// Which taxonomy attribute a clause addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveAttr {
    /// The bare `learningObjectives` token: any alignment at all
    Bare,
    /// Identifier, exact case-insensitive list match
    TargetName,
    /// External GUID, contains match
    CaseItemGuid,
    /// Human description, contains match
    TargetDescription,
    /// Source URI, contains match with a GUID-tail fallback
    CaseItemUri,
    /// Alignment-type tag, exact match
    AlignmentType,
    /// Numeric taxonomy id list
    Id,
    /// No backing storage; never matches
    TargetUrl,
    /// No backing storage; never matches
    EducationalFramework,
}

/// Field type for `learningObjectives` and its dotted attributes
#[derive(Debug, Clone, Copy)]
pub struct LearningObjectiveField {
    attr: ObjectiveAttr,
}

impl LearningObjectiveField {
    pub fn new(attr: ObjectiveAttr) -> Self {
        Self { attr }
    }

    fn resolve_ids(
        &self,
        conn: &Connection,
        clause: &Clause,
        ctx: &CompileContext,
    ) -> Result<Vec<i64>> {
        let is_null = clause.is_null_sentinel();
        let value = clause.value.replace('%', "");

        match self.attr {
            ObjectiveAttr::TargetName => {
                if is_null {
                    return TaxonomyRepo::ids_where_column_null(
                        conn,
                        TaxonomyTextColumn::Identifier,
                    );
                }
                let names: Vec<String> =
                    value.split(',').map(|v| v.trim().to_string()).collect();
                let mut ids = TaxonomyRepo::ids_by_identifiers(conn, &names)?;
                if ctx.alias_search {
                    ids.extend(TaxonomyRepo::ids_by_aliases(conn, &names)?);
                    ids.sort_unstable();
                    ids.dedup();
                }
                Ok(ids)
            }
            ObjectiveAttr::CaseItemGuid => {
                if is_null {
                    return TaxonomyRepo::ids_where_column_null(
                        conn,
                        TaxonomyTextColumn::OpensaltIdentifier,
                    );
                }
                TaxonomyRepo::ids_containing(
                    conn,
                    TaxonomyTextColumn::OpensaltIdentifier,
                    &[value],
                )
            }
            ObjectiveAttr::TargetDescription => {
                if is_null {
                    return TaxonomyRepo::ids_where_column_null(
                        conn,
                        TaxonomyTextColumn::Description,
                    );
                }
                TaxonomyRepo::ids_containing(conn, TaxonomyTextColumn::Description, &[value])
            }
            ObjectiveAttr::CaseItemUri => {
                if is_null {
                    return TaxonomyRepo::ids_where_column_null(conn, TaxonomyTextColumn::Source);
                }
                let parts: Vec<String> = value
                    .replace(',', "|")
                    .split('|')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                let ids = TaxonomyRepo::ids_containing(conn, TaxonomyTextColumn::Source, &parts)?;
                if !ids.is_empty() {
                    return Ok(ids);
                }
                // URI did not match a source; fall back to matching its
                // trailing path segment against the external GUID
                let tails: Vec<String> = parts
                    .iter()
                    .map(|p| p.rsplit('/').next().unwrap_or(p).to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                TaxonomyRepo::ids_containing(conn, TaxonomyTextColumn::OpensaltIdentifier, &tails)
            }
            ObjectiveAttr::AlignmentType => {
                if is_null {
                    return TaxonomyRepo::ids_where_column_null(
                        conn,
                        TaxonomyTextColumn::AlignmentType,
                    );
                }
                TaxonomyRepo::ids_by_alignment_type(conn, &value)
            }
            ObjectiveAttr::Id => Ok(value
                .split(',')
                .filter_map(|v| v.trim().parse::<i64>().ok())
                .collect()),
            ObjectiveAttr::Bare
            | ObjectiveAttr::TargetUrl
            | ObjectiveAttr::EducationalFramework => Ok(Vec::new()),
        }
    }
}

impl FieldType for LearningObjectiveField {
    fn compile(
        &self,
        conn: &Connection,
        clause: &Clause,
        ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        match self.attr {
            ObjectiveAttr::Bare => {
                if clause.is_null_sentinel() {
                    let exists =
                        "EXISTS (SELECT 1 FROM alignments WHERE alignments.resource_id = resources.id)";
                    let sql = if clause.operator == "<>" {
                        exists.to_string()
                    } else {
                        format!("NOT {}", exists)
                    };
                    return Ok(SqlFragment::new(sql));
                }
                Ok(match_nothing())
            }
            ObjectiveAttr::TargetUrl | ObjectiveAttr::EducationalFramework => Ok(match_nothing()),
            _ => {
                let ids = self.resolve_ids(conn, clause, ctx)?;
                let expanded = TaxonomyRepo::expand_descendants(conn, &ids)?;
                if expanded.is_empty() {
                    return Ok(match_nothing());
                }

                let overlap = format!(
                    "EXISTS (SELECT 1 FROM json_each({}) WHERE json_each.value IN ({}))",
                    ctx.closure_column(),
                    id_in_list(&expanded)
                );
                let sql = if clause.is_null_sentinel() {
                    overlap
                } else {
                    format!("{}{}", not_prefix(&clause.operator), overlap)
                };
                Ok(SqlFragment::new(sql))
            }
        }
    }
}
