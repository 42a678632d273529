//! Resource statistics repository

#![allow(clippy::result_large_err)]

use crate::denorm;
use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::datetime_from_text;
use atheneum_core::model::ResourceStat;
use rusqlite::Connection;

/// SQLite repository for ResourceStats
pub struct ResourceStatRepo;

impl ResourceStatRepo {
    /// Persist a stat row and recompute the owning resource's closures
    pub fn persist(conn: &Connection, stat: &mut ResourceStat) -> Result<()> {
        conn.execute(
            "INSERT INTO resource_stats (resource_id, taxonomy_id, taxonomy_ident,
                effectiveness, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                stat.resource_id,
                stat.taxonomy_id,
                stat.taxonomy_ident,
                stat.effectiveness,
                stat.created_at.to_rfc3339(),
            ],
        )
        .map_err(from_rusqlite)?;
        stat.id = conn.last_insert_rowid();

        denorm::recompute(conn, &[stat.resource_id])?;
        Ok(())
    }

    /// All stats for a resource, in insertion order
    pub fn for_resource(conn: &Connection, resource_id: i64) -> Result<Vec<ResourceStat>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, resource_id, taxonomy_id, taxonomy_ident, effectiveness, created_at
                 FROM resource_stats WHERE resource_id = ? ORDER BY id",
            )
            .map_err(from_rusqlite)?;

        let stats = stmt
            .query_map([resource_id], |row| {
                let mut stat = ResourceStat::new(
                    row.get(1)?,
                    row.get(2)?,
                    row.get::<_, String>(3)?,
                    row.get(4)?,
                );
                stat.id = row.get(0)?;
                stat.created_at = datetime_from_text(row.get(5)?);
                Ok(stat)
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(stats)
    }

    /// Remove all stats for a resource and recompute
    pub fn delete_for_resource(conn: &Connection, resource_id: i64) -> Result<usize> {
        let deleted = conn
            .execute(
                "DELETE FROM resource_stats WHERE resource_id = ?",
                [resource_id],
            )
            .map_err(from_rusqlite)?;
        denorm::recompute(conn, &[resource_id])?;
        Ok(deleted)
    }
}
