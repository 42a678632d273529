//! Denormalization of relationship closures onto resources
//!
//! Recomputes, per resource, the taxonomy id closures, stat and subject id
//! sets, and the efficacy map. The recompute is a pure function of current
//! relationship rows; running it twice in a row writes identical values.

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;

use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::{ids_to_json, score_map_to_json};
use rusqlite::Connection;

/// Recompute the denormalized closure columns for the given resources
///
/// Callers invoke this inside the same transaction as the relationship
/// mutation so readers never observe stale closures.
pub fn recompute(conn: &Connection, resource_ids: &[i64]) -> Result<()> {
    for &resource_id in resource_ids {
        recompute_one(conn, resource_id)?;
    }
    Ok(())
}

fn recompute_one(conn: &Connection, resource_id: i64) -> Result<()> {
    let direct = direct_taxonomy_ids(conn, resource_id)?;
    let all = with_mapped_ids(conn, &direct)?;
    let (stat_ids, efficacy) = stats_for(conn, resource_id, &direct)?;
    let subject_ids = subject_ids_for(conn, resource_id)?;

    let avg_efficacy = if efficacy.is_empty() {
        None
    } else {
        Some(efficacy.values().sum::<f64>() / efficacy.len() as f64)
    };

    tracing::debug!(
        resource_id,
        direct = direct.len(),
        all = all.len(),
        stats = stat_ids.len(),
        "recomputed closures"
    );

    conn.execute(
        "UPDATE resources SET
            direct_taxonomy_ids = ?1,
            all_taxonomy_ids = ?2,
            resource_stat_ids = ?3,
            subject_ids = ?4,
            efficacy = ?5,
            avg_efficacy = ?6
         WHERE id = ?7",
        rusqlite::params![
            ids_to_json(&direct),
            ids_to_json(&all),
            ids_to_json(&stat_ids),
            ids_to_json(&subject_ids),
            score_map_to_json(&efficacy),
            avg_efficacy,
            resource_id,
        ],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Recompute every resource in the catalog, for bulk imports
pub fn recompute_all(conn: &Connection) -> Result<usize> {
    let ids = crate::repo::ResourceRepo::list_ids(conn)?;
    recompute(conn, &ids)?;
    Ok(ids.len())
}

/// Resource ids whose closures depend on either end of a mapping
pub fn resources_touching_taxonomies(conn: &Connection, taxonomy_ids: &[i64]) -> Result<Vec<i64>> {
    if taxonomy_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; taxonomy_ids.len()].join(", ");
    let sql = format!(
        "SELECT DISTINCT resource_id FROM alignments
         WHERE status = 2 AND taxonomy_id IN ({})
         ORDER BY resource_id",
        placeholders
    );
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
    let ids = stmt
        .query_map(rusqlite::params_from_iter(taxonomy_ids), |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<i64>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}

fn direct_taxonomy_ids(conn: &Connection, resource_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare(
            "SELECT taxonomy_id FROM alignments
             WHERE resource_id = ? AND status = 2
             ORDER BY taxonomy_id",
        )
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map([resource_id], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<i64>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
}

/// Direct ids plus the opposite end of every mapping touching one of them
fn with_mapped_ids(conn: &Connection, direct: &[i64]) -> Result<Vec<i64>> {
    if direct.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; direct.len()].join(", ");
    let sql = format!(
        "SELECT taxonomy_id, target_id FROM taxonomy_mappings
         WHERE taxonomy_id IN ({0}) OR target_id IN ({0})",
        placeholders
    );
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
    let mut bind: Vec<i64> = Vec::with_capacity(direct.len() * 2);
    bind.extend_from_slice(direct);
    bind.extend_from_slice(direct);
    let pairs = stmt
        .query_map(rusqlite::params_from_iter(bind), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<(i64, i64)>, _>>()
        .map_err(from_rusqlite)?;

    let mut all = direct.to_vec();
    for (taxonomy_id, target_id) in pairs {
        if direct.contains(&taxonomy_id) {
            all.push(target_id);
        }
        if direct.contains(&target_id) {
            all.push(taxonomy_id);
        }
    }
    all.sort_unstable();
    all.dedup();
    Ok(all)
}

/// Stat ids and the efficacy map over stats for confirmed-aligned taxonomies
fn stats_for(
    conn: &Connection,
    resource_id: i64,
    direct: &[i64],
) -> Result<(Vec<i64>, BTreeMap<String, f64>)> {
    if direct.is_empty() {
        return Ok((Vec::new(), BTreeMap::new()));
    }

    let placeholders = vec!["?"; direct.len()].join(", ");
    let sql = format!(
        "SELECT id, taxonomy_ident, effectiveness FROM resource_stats
         WHERE resource_id = ? AND taxonomy_id IN ({})
         ORDER BY id",
        placeholders
    );
    let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
    let mut params: Vec<i64> = vec![resource_id];
    params.extend_from_slice(direct);
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<(i64, String, f64)>, _>>()
        .map_err(from_rusqlite)?;

    let mut stat_ids = Vec::with_capacity(rows.len());
    let mut efficacy = BTreeMap::new();
    for (id, ident, effectiveness) in rows {
        stat_ids.push(id);
        efficacy.insert(ident, effectiveness);
    }
    Ok((stat_ids, efficacy))
}

fn subject_ids_for(conn: &Connection, resource_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare(
            "SELECT subject_id FROM resource_subjects
             WHERE resource_id = ? ORDER BY subject_id",
        )
        .map_err(from_rusqlite)?;
    let ids = stmt
        .query_map([resource_id], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<i64>, _>>()
        .map_err(from_rusqlite)?;
    Ok(ids)
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

    fn seed_resource(conn: &Connection) -> i64 {
        let mut r = Resource::new("r", "d");
        ResourceRepo::persist(conn, &mut r).unwrap();
        r.id
    }

    fn seed_taxonomy(conn: &Connection, identifier: &str) -> i64 {
        let mut t = Taxonomy::new(identifier);
        TaxonomyRepo::persist(conn, &mut t).unwrap();
        t.id
    }

    fn align(conn: &Connection, resource_id: i64, taxonomy_id: i64, status: i64) {
        conn.execute(
            "INSERT INTO alignments (resource_id, taxonomy_id, status, created_at)
             VALUES (?, ?, ?, '2024-01-01T00:00:00Z')",
            [resource_id, taxonomy_id, status],
        )
        .unwrap();
    }

    #[test]
    fn test_only_confirmed_alignments_in_direct() {
        let conn = setup_test_db();
        let r = seed_resource(&conn);
        let confirmed = seed_taxonomy(&conn, "MATH.1");
        let rejected = seed_taxonomy(&conn, "MATH.2");
        align(&conn, r, confirmed, 2);
        align(&conn, r, rejected, 3);

        recompute(&conn, &[r]).unwrap();

        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert_eq!(loaded.direct_taxonomy_ids, vec![confirmed]);
        assert_eq!(loaded.all_taxonomy_ids, vec![confirmed]);
    }

    #[test]
    fn test_mapping_expansion_is_symmetric_one_hop() {
        let conn = setup_test_db();
        let r = seed_resource(&conn);
        let direct = seed_taxonomy(&conn, "MATH.1");
        let forward = seed_taxonomy(&conn, "STATE.1");
        let backward = seed_taxonomy(&conn, "STATE.2");
        let two_hops = seed_taxonomy(&conn, "STATE.3");
        align(&conn, r, direct, 2);
        conn.execute(
            "INSERT INTO taxonomy_mappings (taxonomy_id, target_id) VALUES (?, ?)",
            [direct, forward],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO taxonomy_mappings (taxonomy_id, target_id) VALUES (?, ?)",
            [backward, direct],
        )
        .unwrap();
        // reachable only through two mapping hops, excluded
        conn.execute(
            "INSERT INTO taxonomy_mappings (taxonomy_id, target_id) VALUES (?, ?)",
            [forward, two_hops],
        )
        .unwrap();

        recompute(&conn, &[r]).unwrap();

        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert_eq!(loaded.direct_taxonomy_ids, vec![direct]);
        assert_eq!(loaded.all_taxonomy_ids, vec![direct, forward, backward]);
    }

    #[test]
    fn test_stats_and_efficacy_follow_confirmed_taxonomies() {
        let conn = setup_test_db();
        let r = seed_resource(&conn);
        let confirmed = seed_taxonomy(&conn, "MATH.1");
        let unconfirmed = seed_taxonomy(&conn, "MATH.2");
        align(&conn, r, confirmed, 2);
        align(&conn, r, unconfirmed, 1);

        conn.execute(
            "INSERT INTO resource_stats (resource_id, taxonomy_id, taxonomy_ident, effectiveness, created_at)
             VALUES (?1, ?2, 'MATH.1', 0.8, '2024-01-01T00:00:00Z')",
            [r, confirmed],
        )
        .unwrap();
        let stat_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO resource_stats (resource_id, taxonomy_id, taxonomy_ident, effectiveness, created_at)
             VALUES (?1, ?2, 'MATH.2', 0.4, '2024-01-01T00:00:00Z')",
            [r, unconfirmed],
        )
        .unwrap();

        recompute(&conn, &[r]).unwrap();

        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert_eq!(loaded.resource_stat_ids, vec![stat_id]);
        assert_eq!(loaded.efficacy.get("MATH.1"), Some(&0.8));
        assert!(!loaded.efficacy.contains_key("MATH.2"));
        assert_eq!(loaded.avg_efficacy, Some(0.8));
    }

    #[test]
    fn test_recompute_is_idempotent_and_clears() {
        let conn = setup_test_db();
        let r = seed_resource(&conn);
        let t = seed_taxonomy(&conn, "MATH.1");
        align(&conn, r, t, 2);

        recompute(&conn, &[r]).unwrap();
        recompute(&conn, &[r]).unwrap();
        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert_eq!(loaded.direct_taxonomy_ids, vec![t]);

        conn.execute("DELETE FROM alignments", []).unwrap();
        recompute(&conn, &[r]).unwrap();
        let loaded = ResourceRepo::get(&conn, r).unwrap().unwrap();
        assert!(loaded.direct_taxonomy_ids.is_empty());
        assert!(loaded.all_taxonomy_ids.is_empty());
        assert_eq!(loaded.avg_efficacy, None);
    }
}
