//! Resource repository

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::{
    datetime_from_text, id_vec_from_json, optional_datetime_from_text, score_map_from_json,
    string_vec_from_json, value_from_json, value_to_json,
};
use atheneum_core::model::Resource;
use rusqlite::{Connection, OptionalExtension};

/// Column list matching the index layout [`ResourceRepo::from_row`] expects
pub const SELECT_COLUMNS: &str = "id, name, description, url, publisher, author, \
     learning_resource_type, language, thumbnail_url, technical_format, use_rights_url, \
     rating, publish_date, time_required, min_age, max_age, \
     lti_link, text_complexity, extensions, \
     educational_audience, accessibility_api, accessibility_input_methods, access_mode, \
     accessibility_features, accessibility_hazards, \
     direct_taxonomy_ids, all_taxonomy_ids, resource_stat_ids, subject_ids, \
     efficacy, avg_efficacy, created_at, updated_at";

/// SQLite repository for Resources
///
/// The denormalized closure columns are read here but only ever written by
/// the denormalization pass.
pub struct ResourceRepo;

impl ResourceRepo {
    /// Persist a resource, inserting when unsaved and updating otherwise
    ///
    /// Validation runs first; the assigned row id is written back onto the
    /// model after an insert.
    pub fn persist(conn: &Connection, resource: &mut Resource) -> Result<()> {
        resource.validate()?;

        if resource.id == 0 {
            conn.execute(
                "INSERT INTO resources (name, description, url, publisher, author,
                    learning_resource_type, language, thumbnail_url, technical_format,
                    use_rights_url, rating, publish_date, time_required, min_age, max_age,
                    lti_link, text_complexity, extensions,
                    educational_audience, accessibility_api, accessibility_input_methods,
                    access_mode, accessibility_features, accessibility_hazards,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
                rusqlite::params![
                    resource.name,
                    resource.description,
                    resource.url,
                    resource.publisher,
                    resource.author,
                    resource.learning_resource_type,
                    resource.language,
                    resource.thumbnail_url,
                    resource.technical_format,
                    resource.use_rights_url,
                    resource.rating,
                    resource.publish_date.map(|dt| dt.to_rfc3339()),
                    resource.time_required,
                    resource.min_age,
                    resource.max_age,
                    value_to_json(&resource.lti_link),
                    value_to_json(&resource.text_complexity),
                    value_to_json(&resource.extensions),
                    serde_json::to_string(&resource.educational_audience)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_api)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_input_methods)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.access_mode)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_features)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_hazards)
                        .unwrap_or_else(|_| "[]".to_string()),
                    resource.created_at.to_rfc3339(),
                    resource.updated_at.to_rfc3339(),
                ],
            )
            .map_err(from_rusqlite)?;
            resource.id = conn.last_insert_rowid();
        } else {
            resource.updated_at = chrono::Utc::now();
            conn.execute(
                "UPDATE resources SET name = ?1, description = ?2, url = ?3, publisher = ?4,
                    author = ?5, learning_resource_type = ?6, language = ?7,
                    thumbnail_url = ?8, technical_format = ?9, use_rights_url = ?10,
                    rating = ?11, publish_date = ?12, time_required = ?13,
                    min_age = ?14, max_age = ?15,
                    lti_link = ?16, text_complexity = ?17, extensions = ?18,
                    educational_audience = ?19, accessibility_api = ?20,
                    accessibility_input_methods = ?21, access_mode = ?22,
                    accessibility_features = ?23, accessibility_hazards = ?24,
                    updated_at = ?25
                 WHERE id = ?26",
                rusqlite::params![
                    resource.name,
                    resource.description,
                    resource.url,
                    resource.publisher,
                    resource.author,
                    resource.learning_resource_type,
                    resource.language,
                    resource.thumbnail_url,
                    resource.technical_format,
                    resource.use_rights_url,
                    resource.rating,
                    resource.publish_date.map(|dt| dt.to_rfc3339()),
                    resource.time_required,
                    resource.min_age,
                    resource.max_age,
                    value_to_json(&resource.lti_link),
                    value_to_json(&resource.text_complexity),
                    value_to_json(&resource.extensions),
                    serde_json::to_string(&resource.educational_audience)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_api)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_input_methods)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.access_mode)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_features)
                        .unwrap_or_else(|_| "[]".to_string()),
                    serde_json::to_string(&resource.accessibility_hazards)
                        .unwrap_or_else(|_| "[]".to_string()),
                    resource.updated_at.to_rfc3339(),
                    resource.id,
                ],
            )
            .map_err(from_rusqlite)?;
        }

        Ok(())
    }

    /// Get a resource by id
    pub fn get(conn: &Connection, id: i64) -> Result<Option<Resource>> {
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM resources WHERE id = ?", SELECT_COLUMNS))
            .map_err(from_rusqlite)?;

        let result = stmt
            .query_row([id], Self::from_row)
            .optional()
            .map_err(from_rusqlite)?;

        Ok(result)
    }

    /// Delete a resource; alignments, stats and subject links cascade
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let deleted = conn
            .execute("DELETE FROM resources WHERE id = ?", [id])
            .map_err(from_rusqlite)?;
        Ok(deleted > 0)
    }

    /// All resource ids in id order
    pub fn list_ids(conn: &Connection) -> Result<Vec<i64>> {
        let mut stmt = conn
            .prepare("SELECT id FROM resources ORDER BY id")
            .map_err(from_rusqlite)?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<i64>, _>>()
            .map_err(from_rusqlite)?;
        Ok(ids)
    }

    /// Hydrate a resource from a row selected with [`SELECT_COLUMNS`]
    ///
    /// Extra trailing columns (e.g. a computed relevance projection) are
    /// ignored here and read by the caller.
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
        let mut resource = Resource::new("", "");
        resource.id = row.get(0)?;
        resource.name = row.get(1)?;
        resource.description = row.get(2)?;
        resource.url = row.get(3)?;
        resource.publisher = row.get(4)?;
        resource.author = row.get(5)?;
        resource.learning_resource_type = row.get(6)?;
        resource.language = row.get(7)?;
        resource.thumbnail_url = row.get(8)?;
        resource.technical_format = row.get(9)?;
        resource.use_rights_url = row.get(10)?;
        resource.rating = row.get(11)?;
        resource.publish_date = optional_datetime_from_text(row.get(12)?);
        resource.time_required = row.get(13)?;
        resource.min_age = row.get(14)?;
        resource.max_age = row.get(15)?;
        resource.lti_link = value_from_json(row.get(16)?);
        resource.text_complexity = value_from_json(row.get(17)?);
        resource.extensions = value_from_json(row.get(18)?);
        resource.educational_audience = string_vec_from_json(row.get(19)?);
        resource.accessibility_api = string_vec_from_json(row.get(20)?);
        resource.accessibility_input_methods = string_vec_from_json(row.get(21)?);
        resource.access_mode = string_vec_from_json(row.get(22)?);
        resource.accessibility_features = string_vec_from_json(row.get(23)?);
        resource.accessibility_hazards = string_vec_from_json(row.get(24)?);
        resource.direct_taxonomy_ids = id_vec_from_json(row.get(25)?);
        resource.all_taxonomy_ids = id_vec_from_json(row.get(26)?);
        resource.resource_stat_ids = id_vec_from_json(row.get(27)?);
        resource.subject_ids = id_vec_from_json(row.get(28)?);
        resource.efficacy = score_map_from_json(row.get(29)?);
        resource.avg_efficacy = row.get(30)?;
        resource.created_at = datetime_from_text(row.get(31)?);
        resource.updated_at = datetime_from_text(row.get(32)?);
        Ok(resource)
    }
}
