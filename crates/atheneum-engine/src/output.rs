//! Record projection
//!
//! Builds the output record for one resource as a JSON object holding only
//! the selected fields. Related entities (learning objectives, subjects)
//! are hydrated through the repositories here rather than in the page
//! query, keeping the SQL surface flat. `id` is always present whatever
//! the selection says.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::model::Resource;
use atheneum_store::repo::{SubjectRepo, TaxonomyRepo};
use rusqlite::Connection;
use serde_json::{json, Value};

/// Project one resource into an output record
///
/// `relevance` is the rank computed by the page query (0.0 outside text
/// searches). With `expand_objectives` the objective list covers the
/// one-hop mapping closure instead of direct alignments only.
pub fn project(
    conn: &Connection,
    resource: &Resource,
    fields: &[String],
    relevance: f64,
    expand_objectives: bool,
) -> Result<Value> {
    let mut record = serde_json::Map::new();
    record.insert("id".to_string(), json!(resource.id));

    for field in fields {
        let value = match field.as_str() {
            "name" => json!(resource.name),
            "description" => json!(resource.description),
            "url" => json!(resource.url),
            "publisher" => json!(resource.publisher),
            "author" => json!(resource.author),
            "learningResourceType" => json!(resource.learning_resource_type),
            "language" => json!(resource.language),
            "thumbnailUrl" => json!(resource.thumbnail_url),
            "technicalFormat" => json!(resource.technical_format),
            "useRightsUrl" => json!(resource.use_rights_url),
            "rating" => json!(resource.rating),
            "publishDate" => match resource.publish_date {
                Some(dt) => json!(dt.to_rfc3339()),
                None => Value::Null,
            },
            "timeRequired" => match resource.time_required {
                Some(minutes) => json!(format!("PT{}M", minutes)),
                None => Value::Null,
            },
            "typicalAgeRange" => age_range(resource),
            "ltiLink" => resource.lti_link.clone().unwrap_or(Value::Null),
            "textComplexity" => resource.text_complexity.clone().unwrap_or(Value::Null),
            "extensions" => resource.extensions.clone().unwrap_or(Value::Null),
            "educationalAudience" => json!(resource.educational_audience),
            "accessibilityAPI" => json!(resource.accessibility_api),
            "accessibilityInputMethods" => json!(resource.accessibility_input_methods),
            "accessMode" => json!(resource.access_mode),
            "accessibilityFeatures" => json!(resource.accessibility_features),
            "accessibilityHazards" => json!(resource.accessibility_hazards),
            "subject" => json!(SubjectRepo::names_by_ids(conn, &resource.subject_ids)?),
            "learningObjectives" => objectives(conn, resource, expand_objectives)?,
            "efficacy" => json!(resource.efficacy),
            "relevance" => json!(relevance),
            _ => continue,
        };
        record.insert(field.clone(), value);
    }

    Ok(Value::Object(record))
}

/// Hydrate the objective list from the requested closure column
fn objectives(conn: &Connection, resource: &Resource, expand: bool) -> Result<Value> {
    let ids = if expand {
        &resource.all_taxonomy_ids
    } else {
        &resource.direct_taxonomy_ids
    };
    let taxonomies = TaxonomyRepo::by_ids(conn, ids)?;
    let entries: Vec<Value> = taxonomies
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "targetName": t.identifier,
                "caseItemGUID": t.opensalt_identifier,
                "targetDescription": t.description,
                "alignmentType": t.alignment_type,
                "caseItemUri": t.source,
            })
        })
        .collect();
    Ok(Value::Array(entries))
}

/// `min-max` range string; a single known bound stands in for both ends
fn age_range(resource: &Resource) -> Value {
    let min = resource.min_age.or(resource.max_age);
    let max = resource.max_age.or(resource.min_age);
    match (min, max) {
        (Some(min), Some(max)) => json!(format!("{}-{}", min, max)),
        _ => Value::Null,
    }
}
