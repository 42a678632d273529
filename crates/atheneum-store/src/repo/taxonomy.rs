//! Taxonomy repository and lookup helpers
//!
//! The lookup helpers resolve filter values to taxonomy id sets for the
//! query engine; resolution happens here with parameterized statements so
//! only pre-resolved integer ids ever reach compiled SQL.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::{datetime_from_text, string_vec_from_json, strings_to_json};
use atheneum_core::errors::{AthError, AthErrorKind};
use atheneum_core::model::Taxonomy;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

/// Searchable text columns on the taxonomies table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyTextColumn {
    Identifier,
    OpensaltIdentifier,
    Description,
    AlignmentType,
    Source,
}

impl TaxonomyTextColumn {
    fn as_sql(self) -> &'static str {
        match self {
            TaxonomyTextColumn::Identifier => "identifier",
            TaxonomyTextColumn::OpensaltIdentifier => "opensalt_identifier",
            TaxonomyTextColumn::Description => "description",
            TaxonomyTextColumn::AlignmentType => "alignment_type",
            TaxonomyTextColumn::Source => "source",
        }
    }
}

/// SQLite repository for Taxonomies
pub struct TaxonomyRepo;

impl TaxonomyRepo {
    /// Persist a taxonomy, inserting when unsaved and updating otherwise
    pub fn persist(conn: &Connection, taxonomy: &mut Taxonomy) -> Result<()> {
        if taxonomy.id == 0 {
            conn.execute(
                "INSERT INTO taxonomies (identifier, opensalt_identifier, description,
                    alignment_type, source, ancestry, min_age, max_age, aliases, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    taxonomy.identifier,
                    taxonomy.opensalt_identifier,
                    taxonomy.description,
                    taxonomy.alignment_type,
                    taxonomy.source,
                    taxonomy.ancestry,
                    taxonomy.min_age,
                    taxonomy.max_age,
                    strings_to_json(&taxonomy.aliases),
                    taxonomy.created_at.to_rfc3339(),
                ],
            )
            .map_err(from_rusqlite)?;
            taxonomy.id = conn.last_insert_rowid();
        } else {
            conn.execute(
                "UPDATE taxonomies SET identifier = ?1, opensalt_identifier = ?2,
                    description = ?3, alignment_type = ?4, source = ?5, ancestry = ?6,
                    min_age = ?7, max_age = ?8, aliases = ?9
                 WHERE id = ?10",
                rusqlite::params![
                    taxonomy.identifier,
                    taxonomy.opensalt_identifier,
                    taxonomy.description,
                    taxonomy.alignment_type,
                    taxonomy.source,
                    taxonomy.ancestry,
                    taxonomy.min_age,
                    taxonomy.max_age,
                    strings_to_json(&taxonomy.aliases),
                    taxonomy.id,
                ],
            )
            .map_err(from_rusqlite)?;
        }

        Ok(())
    }

    /// Get a taxonomy by id
    pub fn get(conn: &Connection, id: i64) -> Result<Option<Taxonomy>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, identifier, opensalt_identifier, description, alignment_type,
                        source, ancestry, min_age, max_age, aliases, created_at
                 FROM taxonomies WHERE id = ?",
            )
            .map_err(from_rusqlite)?;

        let result = stmt
            .query_row([id], |row| {
                let mut t = Taxonomy::new(row.get::<_, String>(1)?);
                t.id = row.get(0)?;
                t.opensalt_identifier = row.get(2)?;
                t.description = row.get(3)?;
                t.alignment_type = row.get(4)?;
                t.source = row.get(5)?;
                t.ancestry = row.get(6)?;
                t.min_age = row.get(7)?;
                t.max_age = row.get(8)?;
                t.aliases = string_vec_from_json(row.get(9)?);
                t.created_at = datetime_from_text(row.get(10)?);
                Ok(t)
            })
            .optional()
            .map_err(from_rusqlite)?;

        Ok(result)
    }

    /// Get several taxonomies at once, in id order
    pub fn by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<Taxonomy>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, identifier, opensalt_identifier, description, alignment_type,
                    source, ancestry, min_age, max_age, aliases, created_at
             FROM taxonomies WHERE id IN ({}) ORDER BY id",
            placeholders
        );
        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let taxonomies = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                let mut t = Taxonomy::new(row.get::<_, String>(1)?);
                t.id = row.get(0)?;
                t.opensalt_identifier = row.get(2)?;
                t.description = row.get(3)?;
                t.alignment_type = row.get(4)?;
                t.source = row.get(5)?;
                t.ancestry = row.get(6)?;
                t.min_age = row.get(7)?;
                t.max_age = row.get(8)?;
                t.aliases = string_vec_from_json(row.get(9)?);
                t.created_at = datetime_from_text(row.get(10)?);
                Ok(t)
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(taxonomies)
    }

    /// Delete a taxonomy, refused while dependent alignments exist
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let dependents: i64 = conn
            .query_row(
                "SELECT count(*) FROM alignments WHERE taxonomy_id = ?",
                [id],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        if dependents > 0 {
            return Err(AthError::new(AthErrorKind::TaxonomyInUse)
                .with_op("taxonomy_delete")
                .with_entity_id(id.to_string())
                .with_message(format!(
                    "taxonomy {} has {} dependent alignments",
                    id, dependents
                )));
        }

        let deleted = conn
            .execute("DELETE FROM taxonomies WHERE id = ?", [id])
            .map_err(from_rusqlite)?;
        Ok(deleted > 0)
    }

    /// Ids whose identifier matches any of `identifiers`, case-insensitively
    pub fn ids_by_identifiers(conn: &Connection, identifiers: &[String]) -> Result<Vec<i64>> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; identifiers.len()].join(", ");
        let sql = format!(
            "SELECT id FROM taxonomies WHERE lower(identifier) IN ({}) ORDER BY id",
            placeholders
        );
        let lowered: Vec<String> = identifiers.iter().map(|s| s.to_lowercase()).collect();
        collect_ids(conn, &sql, lowered)
    }

    /// Ids with any alias matching any of `aliases`, case-insensitively
    pub fn ids_by_aliases(conn: &Connection, aliases: &[String]) -> Result<Vec<i64>> {
        if aliases.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; aliases.len()].join(", ");
        let sql = format!(
            "SELECT DISTINCT taxonomies.id FROM taxonomies
             WHERE EXISTS (
                 SELECT 1 FROM json_each(taxonomies.aliases)
                 WHERE lower(json_each.value) IN ({})
             )
             ORDER BY taxonomies.id",
            placeholders
        );
        let lowered: Vec<String> = aliases.iter().map(|s| s.to_lowercase()).collect();
        collect_ids(conn, &sql, lowered)
    }

    /// Ids where `column` contains any of `values` as a substring,
    /// case-insensitively
    pub fn ids_containing(
        conn: &Connection,
        column: TaxonomyTextColumn,
        values: &[String],
    ) -> Result<Vec<i64>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let predicate = vec![format!("lower({}) LIKE ?", column.as_sql()); values.len()]
            .join(" OR ");
        let sql = format!(
            "SELECT id FROM taxonomies WHERE {} ORDER BY id",
            predicate
        );
        let patterns: Vec<String> = values
            .iter()
            .map(|v| format!("%{}%", v.to_lowercase()))
            .collect();
        collect_ids(conn, &sql, patterns)
    }

    /// Ids with exactly this alignment type tag
    pub fn ids_by_alignment_type(conn: &Connection, alignment_type: &str) -> Result<Vec<i64>> {
        collect_ids(
            conn,
            "SELECT id FROM taxonomies WHERE alignment_type = ? ORDER BY id",
            vec![alignment_type.to_string()],
        )
    }

    /// Ids where `column` is NULL
    pub fn ids_where_column_null(conn: &Connection, column: TaxonomyTextColumn) -> Result<Vec<i64>> {
        let sql = format!(
            "SELECT id FROM taxonomies WHERE {} IS NULL ORDER BY id",
            column.as_sql()
        );
        collect_ids(conn, &sql, Vec::<String>::new())
    }

    /// Expand a taxonomy id set with every descendant, selves included
    ///
    /// Descendants are rows whose ancestry path contains one of the ids as a
    /// whole segment.
    pub fn expand_descendants(conn: &Connection, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut expanded: Vec<i64> = ids.to_vec();
        for id in ids {
            let sql = "SELECT id FROM taxonomies
                 WHERE ancestry = ?1
                    OR ancestry LIKE ?1 || '/%'
                    OR ancestry LIKE '%/' || ?1
                    OR ancestry LIKE '%/' || ?1 || '/%'";
            let descendants = collect_ids(conn, sql, vec![id.to_string()])?;
            expanded.extend(descendants);
        }

        expanded.sort_unstable();
        expanded.dedup();
        Ok(expanded)
    }
}

fn collect_ids(
    conn: &Connection,
    sql: &str,
    params: Vec<String>,
) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<i64>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}
