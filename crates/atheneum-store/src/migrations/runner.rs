//! Migration runner
//!
//! Applies pending embedded migrations, each in its own transaction, and
//! records a digest per applied migration. On later runs the recorded
//! digests are compared against the embedded SQL; an edited already-applied
//! migration is refused instead of silently re-run.

#![allow(clippy::result_large_err)]

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::sql_digest;
use crate::migrations::embedded;
use rusqlite::{Connection, OptionalExtension};

/// Bring the schema up to date
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    ensure_version_table(conn)?;

    for migration in embedded::all() {
        let digest = sql_digest(migration.sql);
        match recorded_digest(conn, migration.id)? {
            Some(stored) if stored != digest => {
                return Err(checksum_mismatch(migration.id, &stored, &digest));
            }
            Some(_) => {}
            None => apply_one(conn, migration.id, migration.sql, &digest)?,
        }
    }
    Ok(())
}

fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT NOT NULL
        )",
        [],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

fn recorded_digest(conn: &Connection, migration_id: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT checksum FROM schema_version WHERE migration_id = ?",
        [migration_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(from_rusqlite)
}

fn apply_one(conn: &mut Connection, migration_id: &str, sql: &str, digest: &str) -> Result<()> {
    tracing::info!(migration_id, "applying migration");

    let tx = conn.transaction().map_err(from_rusqlite)?;
    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![migration_id, chrono::Utc::now().timestamp(), digest],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        let result = apply_migrations(&mut conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_idempotency() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        let result = apply_migrations(&mut conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_drifted_migration_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn.execute(
            "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_initial_schema'",
            [],
        )
        .unwrap();

        let err = apply_migrations(&mut conn).unwrap_err();
        assert_eq!(err.code(), "ERR_CHECKSUM_MISMATCH");
    }

    #[test]
    fn test_schema_has_expected_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        for table in [
            "resources",
            "taxonomies",
            "alignments",
            "taxonomy_mappings",
            "subjects",
            "resource_subjects",
            "resource_stats",
            "resources_fts",
        ] {
            let found: i64 = conn
                .query_row(
                    "SELECT count(*) FROM sqlite_master WHERE name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_fts_triggers_track_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO resources (name, description, created_at, updated_at)
             VALUES ('Volcano lab', 'Erupting volcano experiment', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let hits: i64 = conn
            .query_row(
                "SELECT count(*) FROM resources_fts WHERE resources_fts MATCH 'volcano'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 1);

        conn.execute("UPDATE resources SET name = 'Geyser lab', description = 'Steam' WHERE name = 'Volcano lab'", [])
            .unwrap();
        let hits: i64 = conn
            .query_row(
                "SELECT count(*) FROM resources_fts WHERE resources_fts MATCH 'volcano'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 0);
    }
}
