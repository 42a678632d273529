//! Taxonomy mapping repository
//!
//! Mappings are stored directed; symmetric matching happens in the
//! denormalizer. Writes recompute every resource confirmed-aligned to
//! either end.

#![allow(clippy::result_large_err)]

use crate::denorm;
use crate::errors::{from_rusqlite, Result};
use atheneum_core::model::TaxonomyMapping;
use rusqlite::{Connection, OptionalExtension};

/// SQLite repository for TaxonomyMappings
pub struct TaxonomyMappingRepo;

impl TaxonomyMappingRepo {
    /// Persist a mapping; one row per directed pair
    pub fn persist(conn: &Connection, mapping: &mut TaxonomyMapping) -> Result<()> {
        conn.execute(
            "INSERT INTO taxonomy_mappings (taxonomy_id, target_id)
             VALUES (?1, ?2)
             ON CONFLICT(taxonomy_id, target_id) DO NOTHING",
            [mapping.taxonomy_id, mapping.target_id],
        )
        .map_err(from_rusqlite)?;

        let id: i64 = conn
            .query_row(
                "SELECT id FROM taxonomy_mappings WHERE taxonomy_id = ? AND target_id = ?",
                [mapping.taxonomy_id, mapping.target_id],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        mapping.id = id;

        let affected =
            denorm::resources_touching_taxonomies(conn, &[mapping.taxonomy_id, mapping.target_id])?;
        denorm::recompute(conn, &affected)?;
        Ok(())
    }

    /// Delete a mapping
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let ends: Option<(i64, i64)> = conn
            .query_row(
                "SELECT taxonomy_id, target_id FROM taxonomy_mappings WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(from_rusqlite)?;

        let Some((taxonomy_id, target_id)) = ends else {
            return Ok(false);
        };

        conn.execute("DELETE FROM taxonomy_mappings WHERE id = ?", [id])
            .map_err(from_rusqlite)?;

        let affected = denorm::resources_touching_taxonomies(conn, &[taxonomy_id, target_id])?;
        denorm::recompute(conn, &affected)?;
        Ok(true)
    }
}
