//! Subject repository

#![allow(clippy::result_large_err)]

use crate::denorm;
use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::datetime_from_text;
use atheneum_core::model::Subject;
use rusqlite::{Connection, OptionalExtension};

/// SQLite repository for Subjects and their resource links
pub struct SubjectRepo;

impl SubjectRepo {
    /// Persist a subject, inserting when unsaved and updating otherwise
    pub fn persist(conn: &Connection, subject: &mut Subject) -> Result<()> {
        if subject.id == 0 {
            conn.execute(
                "INSERT INTO subjects (name, parent_id, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    subject.name,
                    subject.parent_id,
                    subject.created_at.to_rfc3339()
                ],
            )
            .map_err(from_rusqlite)?;
            subject.id = conn.last_insert_rowid();
        } else {
            conn.execute(
                "UPDATE subjects SET name = ?1, parent_id = ?2 WHERE id = ?3",
                rusqlite::params![subject.name, subject.parent_id, subject.id],
            )
            .map_err(from_rusqlite)?;
        }
        Ok(())
    }

    /// Get a subject by id
    pub fn get(conn: &Connection, id: i64) -> Result<Option<Subject>> {
        let mut stmt = conn
            .prepare("SELECT id, name, parent_id, created_at FROM subjects WHERE id = ?")
            .map_err(from_rusqlite)?;
        let result = stmt
            .query_row([id], |row| {
                let mut s = Subject::new(row.get::<_, String>(1)?);
                s.id = row.get(0)?;
                s.parent_id = row.get(2)?;
                s.created_at = datetime_from_text(row.get(3)?);
                Ok(s)
            })
            .optional()
            .map_err(from_rusqlite)?;
        Ok(result)
    }

    /// Link a resource to a subject and recompute its closures
    pub fn link(conn: &Connection, resource_id: i64, subject_id: i64) -> Result<()> {
        conn.execute(
            "INSERT INTO resource_subjects (resource_id, subject_id)
             VALUES (?1, ?2)
             ON CONFLICT(resource_id, subject_id) DO NOTHING",
            [resource_id, subject_id],
        )
        .map_err(from_rusqlite)?;
        denorm::recompute(conn, &[resource_id])?;
        Ok(())
    }

    /// Remove a resource-subject link and recompute
    pub fn unlink(conn: &Connection, resource_id: i64, subject_id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM resource_subjects WHERE resource_id = ? AND subject_id = ?",
            [resource_id, subject_id],
        )
        .map_err(from_rusqlite)?;
        denorm::recompute(conn, &[resource_id])?;
        Ok(())
    }

    /// Subject ids by exact name, case-insensitively
    pub fn ids_by_name(conn: &Connection, name: &str) -> Result<Vec<i64>> {
        let mut stmt = conn
            .prepare("SELECT id FROM subjects WHERE lower(name) = lower(?) ORDER BY id")
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map([name], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids)
    }

    /// Subject ids whose name contains the value, case-insensitively
    pub fn ids_by_name_contains(conn: &Connection, value: &str) -> Result<Vec<i64>> {
        let pattern = format!("%{}%", value.to_lowercase());
        let mut stmt = conn
            .prepare("SELECT id FROM subjects WHERE lower(name) LIKE ? ORDER BY id")
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map([pattern], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids)
    }

    /// Names for a set of subject ids, in id order
    pub fn names_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT name FROM subjects WHERE id IN ({}) ORDER BY id",
            placeholders
        );
        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let names = stmt
            .query_map(rusqlite::params_from_iter(ids.iter()), |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use crate::repo::ResourceRepo;
    use atheneum_core::model::Resource;

    fn setup_test_db() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::configure(&conn).unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_persist_and_lookup_by_name() {
        let conn = setup_test_db();
        let mut s = Subject::new("Mathematics");
        SubjectRepo::persist(&conn, &mut s).unwrap();
        assert!(s.id > 0);

        assert_eq!(SubjectRepo::ids_by_name(&conn, "mathematics").unwrap(), vec![s.id]);
        assert!(SubjectRepo::ids_by_name(&conn, "History").unwrap().is_empty());
    }

    #[test]
    fn test_link_and_unlink_update_closures() {
        let conn = setup_test_db();
        let mut r = Resource::new("r", "d");
        ResourceRepo::persist(&conn, &mut r).unwrap();
        let mut s = Subject::new("Science");
        SubjectRepo::persist(&conn, &mut s).unwrap();

        SubjectRepo::link(&conn, r.id, s.id).unwrap();
        // linking twice is a no-op
        SubjectRepo::link(&conn, r.id, s.id).unwrap();
        let loaded = ResourceRepo::get(&conn, r.id).unwrap().unwrap();
        assert_eq!(loaded.subject_ids, vec![s.id]);

        SubjectRepo::unlink(&conn, r.id, s.id).unwrap();
        let loaded = ResourceRepo::get(&conn, r.id).unwrap().unwrap();
        assert!(loaded.subject_ids.is_empty());
    }

    #[test]
    fn test_subject_tree_parent() {
        let conn = setup_test_db();
        let mut root = Subject::new("Science");
        SubjectRepo::persist(&conn, &mut root).unwrap();
        let mut child = Subject::new("Biology");
        child.parent_id = Some(root.id);
        SubjectRepo::persist(&conn, &mut child).unwrap();

        let loaded = SubjectRepo::get(&conn, child.id).unwrap().unwrap();
        assert_eq!(loaded.parent_id, Some(root.id));
        assert!(!loaded.is_root());
    }
}
