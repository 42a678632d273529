//! Alignment repository
//!
//! Every write recomputes the owning resource's closures before returning,
//! so confirmed-status changes are immediately visible to queries.

#![allow(clippy::result_large_err)]

use crate::denorm;
use crate::errors::{from_rusqlite, not_found, Result};
use crate::repo::hydration::datetime_from_text;
use atheneum_core::model::{Alignment, AlignmentStatus};
use rusqlite::{Connection, OptionalExtension};

/// SQLite repository for Alignments
pub struct AlignmentRepo;

impl AlignmentRepo {
    /// Persist an alignment; one row per (resource, taxonomy) pair
    pub fn persist(conn: &Connection, alignment: &mut Alignment) -> Result<()> {
        conn.execute(
            "INSERT INTO alignments (resource_id, taxonomy_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(resource_id, taxonomy_id) DO UPDATE SET
                status = excluded.status",
            rusqlite::params![
                alignment.resource_id,
                alignment.taxonomy_id,
                alignment.status.as_i64(),
                alignment.created_at.to_rfc3339(),
            ],
        )
        .map_err(from_rusqlite)?;

        let id: i64 = conn
            .query_row(
                "SELECT id FROM alignments WHERE resource_id = ? AND taxonomy_id = ?",
                [alignment.resource_id, alignment.taxonomy_id],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        alignment.id = id;

        denorm::recompute(conn, &[alignment.resource_id])?;
        Ok(())
    }

    /// Get an alignment by id
    pub fn get(conn: &Connection, id: i64) -> Result<Option<Alignment>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, resource_id, taxonomy_id, status, created_at
                 FROM alignments WHERE id = ?",
            )
            .map_err(from_rusqlite)?;

        let result = stmt
            .query_row([id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .optional()
            .map_err(from_rusqlite)?;

        match result {
            Some((id, resource_id, taxonomy_id, status_code, created_at)) => {
                let mut alignment = Alignment::new(resource_id, taxonomy_id);
                alignment.id = id;
                alignment.status = AlignmentStatus::from_i64(status_code)?;
                alignment.created_at = datetime_from_text(created_at);
                Ok(Some(alignment))
            }
            None => Ok(None),
        }
    }

    /// All alignments for a resource, in taxonomy order
    pub fn for_resource(conn: &Connection, resource_id: i64) -> Result<Vec<Alignment>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, resource_id, taxonomy_id, status, created_at
                 FROM alignments WHERE resource_id = ? ORDER BY taxonomy_id",
            )
            .map_err(from_rusqlite)?;

        let rows = stmt
            .query_map([resource_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        let mut alignments = Vec::with_capacity(rows.len());
        for (id, resource_id, taxonomy_id, status_code, created_at) in rows {
            let mut alignment = Alignment::new(resource_id, taxonomy_id);
            alignment.id = id;
            alignment.status = AlignmentStatus::from_i64(status_code)?;
            alignment.created_at = datetime_from_text(created_at);
            alignments.push(alignment);
        }
        Ok(alignments)
    }

    /// Curation op: move an alignment to a new review status
    pub fn set_status(conn: &Connection, id: i64, status: AlignmentStatus) -> Result<()> {
        let resource_id: Option<i64> = conn
            .query_row(
                "SELECT resource_id FROM alignments WHERE id = ?",
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;
        let resource_id = resource_id.ok_or_else(|| not_found("alignment", id))?;

        conn.execute(
            "UPDATE alignments SET status = ? WHERE id = ?",
            [status.as_i64(), id],
        )
        .map_err(from_rusqlite)?;

        denorm::recompute(conn, &[resource_id])?;
        Ok(())
    }

    /// Delete an alignment
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let resource_id: Option<i64> = conn
            .query_row(
                "SELECT resource_id FROM alignments WHERE id = ?",
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        let Some(resource_id) = resource_id else {
            return Ok(false);
        };

        conn.execute("DELETE FROM alignments WHERE id = ?", [id])
            .map_err(from_rusqlite)?;
        denorm::recompute(conn, &[resource_id])?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use crate::repo::{ResourceRepo, TaxonomyRepo};
    use atheneum_core::model::{Resource, Taxonomy};

    fn setup_test_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::configure(&conn).unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    fn seed(conn: &Connection) -> (i64, i64) {
        let mut r = Resource::new("r", "d");
        ResourceRepo::persist(conn, &mut r).unwrap();
        let mut t = Taxonomy::new("MATH.1");
        TaxonomyRepo::persist(conn, &mut t).unwrap();
        (r.id, t.id)
    }

    #[test]
    fn test_persist_updates_closures() {
        let conn = setup_test_db();
        let (r, t) = seed(&conn);

        let mut a = Alignment::new(r, t);
        AlignmentRepo::persist(&conn, &mut a).unwrap();
        assert!(a.id > 0);

        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert_eq!(loaded.direct_taxonomy_ids, vec![t]);
    }

    #[test]
    fn test_persist_same_pair_upserts() {
        let conn = setup_test_db();
        let (r, t) = seed(&conn);

        let mut a = Alignment::new(r, t);
        AlignmentRepo::persist(&conn, &mut a).unwrap();
        let first_id = a.id;

        let mut again = Alignment::new(r, t);
        again.status = AlignmentStatus::Rejected;
        AlignmentRepo::persist(&conn, &mut again).unwrap();
        assert_eq!(again.id, first_id);

        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert!(loaded.direct_taxonomy_ids.is_empty());
    }

    #[test]
    fn test_set_status_recomputes() {
        let conn = setup_test_db();
        let (r, t) = seed(&conn);

        let mut a = Alignment::new(r, t);
        a.status = AlignmentStatus::Unreviewed;
        AlignmentRepo::persist(&conn, &mut a).unwrap();
        assert!(ResourceRepo::get(&conn, r)
            .unwrap()
            .unwrap()
            .direct_taxonomy_ids
            .is_empty());

        AlignmentRepo::set_status(&conn, a.id, AlignmentStatus::Confirmed).unwrap();
        assert_eq!(
            ResourceRepo::get(&conn, r).unwrap().unwrap().direct_taxonomy_ids,
            vec![t]
        );

        let err = AlignmentRepo::set_status(&conn, 999, AlignmentStatus::Confirmed).unwrap_err();
        assert_eq!(err.code(), "ERR_NOT_FOUND");
    }

    #[test]
    fn test_delete_recomputes() {
        let conn = setup_test_db();
        let (r, t) = seed(&conn);

        let mut a = Alignment::new(r, t);
        AlignmentRepo::persist(&conn, &mut a).unwrap();
        assert!(AlignmentRepo::delete(&conn, a.id).unwrap());
        assert!(!AlignmentRepo::delete(&conn, a.id).unwrap());

        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert!(loaded.direct_taxonomy_ids.is_empty());
    }

    #[test]
    fn test_for_resource_ordering() {
        let conn = setup_test_db();
        let (r, t1) = seed(&conn);
        let mut t2 = Taxonomy::new("MATH.2");
        TaxonomyRepo::persist(&conn, &mut t2).unwrap();

        AlignmentRepo::persist(&conn, &mut Alignment::new(r, t2.id)).unwrap();
        AlignmentRepo::persist(&conn, &mut Alignment::new(r, t1)).unwrap();

        let alignments = AlignmentRepo::for_resource(&conn, r).unwrap();
        assert_eq!(alignments.len(), 2);
        assert_eq!(alignments[0].taxonomy_id, t1);
        assert_eq!(alignments[1].taxonomy_id, t2.id);
    }
}
