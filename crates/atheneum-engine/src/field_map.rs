//! Field-type registry
//!
//! The ordered, immutable list of field descriptors the sanitizer and
//! transformer dispatch through. Built once at startup; descriptors whose
//! storage column is missing from the live schema are dropped so the engine
//! keeps working across schema versions, unless the descriptor is marked
//! custom (runtime-defined storage, exempt from the check).

#![allow(clippy::result_large_err)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use atheneum_core::errors::Result;
use atheneum_store::errors::from_rusqlite;
use rusqlite::Connection;

use crate::config::EngineConfig;
use crate::field_types::{
    CaseInsensitiveStringField, DurationField, EfficacyField, FieldType, JsonField,
    LearningObjectiveField, LearningResourceTypeField, NullFieldType, NumberField, ObjectiveAttr,
    SearchFieldType, StringArrayField, SubjectField, TextComplexityAttr, TextComplexityField,
    TimestampField, TypicalAgeRangeField,
};

/// Default sort field substituted for unknown sort input
pub const DEFAULT_SORT_FIELD: &str = "name";

/// One registered field
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Public filter token, possibly dotted
    pub filter_field: String,

    /// `table.column` backing storage, checked against the live schema;
    /// `None` for computed fields
    pub storage: Option<String>,

    /// Output record key, when the field appears in projected records
    pub output_field: Option<String>,

    pub sortable: bool,
    pub search_allowed: bool,

    /// Skip the schema check; storage is runtime-defined
    pub custom: bool,

    pub field_type: Arc<dyn FieldType>,
}

impl FieldDescriptor {
    pub fn new(filter_field: impl Into<String>, field_type: Arc<dyn FieldType>) -> Self {
        Self {
            filter_field: filter_field.into(),
            storage: None,
            output_field: None,
            sortable: false,
            search_allowed: true,
            custom: false,
            field_type,
        }
    }

    pub fn storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    pub fn output(mut self, output_field: impl Into<String>) -> Self {
        self.output_field = Some(output_field.into());
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn not_searchable(mut self) -> Self {
        self.search_allowed = false;
        self
    }

    pub fn custom(mut self) -> Self {
        self.custom = true;
        self
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("filter_field", &self.filter_field)
            .field("storage", &self.storage)
            .field("sortable", &self.sortable)
            .field("search_allowed", &self.search_allowed)
            .finish()
    }
}

/// The registry itself: ordered descriptors plus name lookups
pub struct FieldMap {
    descriptors: Vec<FieldDescriptor>,
}

impl FieldMap {
    /// Build the registry against a live connection
    ///
    /// Extension descriptors from the configuration are appended after the
    /// built-in inventory and go through the same schema check unless
    /// marked custom.
    pub fn build(conn: &Connection, config: &EngineConfig) -> Result<Self> {
        let schema = live_schema(conn)?;

        let mut descriptors = Vec::new();
        for descriptor in inventory()
            .into_iter()
            .chain(config.extension_fields.iter().cloned())
        {
            if descriptor.custom || storage_exists(&schema, descriptor.storage.as_deref()) {
                descriptors.push(descriptor);
            } else {
                tracing::debug!(
                    field = %descriptor.filter_field,
                    storage = ?descriptor.storage,
                    "dropping field descriptor without backing column"
                );
            }
        }

        Ok(Self { descriptors })
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Look up a descriptor by its exact filter token
    pub fn find(&self, filter_field: &str) -> Option<&FieldDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.filter_field == filter_field)
    }

    /// Filterable field tokens, in registry order
    pub fn search_allowed_names(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .filter(|d| d.search_allowed)
            .map(|d| d.filter_field.clone())
            .collect()
    }

    /// Sortable field tokens, in registry order
    pub fn sortable_names(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .filter(|d| d.sortable)
            .map(|d| d.filter_field.clone())
            .collect()
    }

    /// Output record keys, in registry order
    pub fn output_names(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .filter_map(|d| d.output_field.clone())
            .collect()
    }
}

impl std::fmt::Debug for FieldMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMap")
            .field("descriptors", &self.descriptors.len())
            .finish()
    }
}

/// The built-in field inventory, in output order
fn inventory() -> Vec<FieldDescriptor> {
    fn text(column: &str) -> Arc<dyn FieldType> {
        Arc::new(CaseInsensitiveStringField::new(column))
    }
    fn objective(attr: ObjectiveAttr) -> Arc<dyn FieldType> {
        Arc::new(LearningObjectiveField::new(attr))
    }

    vec![
        FieldDescriptor::new("search", Arc::new(SearchFieldType)),
        FieldDescriptor::new("name", text("resources.name"))
            .storage("resources.name")
            .output("name")
            .sortable(),
        FieldDescriptor::new(
            "description",
            Arc::new(CaseInsensitiveStringField::truncated(
                "resources.description",
                200,
            )),
        )
        .storage("resources.description")
        .output("description")
        .sortable(),
        FieldDescriptor::new("publisher", text("resources.publisher"))
            .storage("resources.publisher")
            .output("publisher")
            .sortable(),
        FieldDescriptor::new("subject", Arc::new(SubjectField)).output("subject"),
        FieldDescriptor::new("efficacy", Arc::new(EfficacyField))
            .storage("resources.efficacy")
            .output("efficacy")
            .sortable(),
        FieldDescriptor::new("learningObjectives", objective(ObjectiveAttr::Bare))
            .output("learningObjectives"),
        FieldDescriptor::new("learningObjectives.id", objective(ObjectiveAttr::Id)),
        FieldDescriptor::new(
            "learningObjectives.targetName",
            objective(ObjectiveAttr::TargetName),
        )
        .storage("taxonomies.identifier"),
        FieldDescriptor::new(
            "learningObjectives.caseItemGUID",
            objective(ObjectiveAttr::CaseItemGuid),
        )
        .storage("taxonomies.opensalt_identifier"),
        FieldDescriptor::new(
            "learningObjectives.alignmentType",
            objective(ObjectiveAttr::AlignmentType),
        )
        .storage("taxonomies.alignment_type"),
        FieldDescriptor::new(
            "learningObjectives.targetDescription",
            objective(ObjectiveAttr::TargetDescription),
        )
        .storage("taxonomies.description"),
        FieldDescriptor::new(
            "learningObjectives.caseItemUri",
            objective(ObjectiveAttr::CaseItemUri),
        )
        .storage("taxonomies.source"),
        FieldDescriptor::new(
            "learningObjectives.targetURL",
            objective(ObjectiveAttr::TargetUrl),
        ),
        FieldDescriptor::new(
            "learningObjectives.educationalFramework",
            objective(ObjectiveAttr::EducationalFramework),
        ),
        FieldDescriptor::new(
            "learningResourceType",
            Arc::new(LearningResourceTypeField::new(
                "resources.learning_resource_type",
            )),
        )
        .storage("resources.learning_resource_type")
        .output("learningResourceType")
        .sortable(),
        FieldDescriptor::new("language", text("resources.language"))
            .storage("resources.language")
            .output("language")
            .sortable(),
        FieldDescriptor::new("rating", Arc::new(NumberField::new("resources.rating")))
            .storage("resources.rating")
            .output("rating")
            .sortable(),
        FieldDescriptor::new("author", text("resources.author"))
            .storage("resources.author")
            .output("author")
            .sortable(),
        FieldDescriptor::new("url", text("resources.url"))
            .storage("resources.url")
            .output("url")
            .not_searchable(),
        FieldDescriptor::new("useRightsUrl", text("resources.use_rights_url"))
            .storage("resources.use_rights_url")
            .output("useRightsUrl"),
        FieldDescriptor::new("thumbnailUrl", text("resources.thumbnail_url"))
            .storage("resources.thumbnail_url")
            .output("thumbnailUrl"),
        FieldDescriptor::new("technicalFormat", text("resources.technical_format"))
            .storage("resources.technical_format")
            .output("technicalFormat"),
        FieldDescriptor::new("extensions", Arc::new(JsonField::new("resources.extensions")))
            .storage("resources.extensions")
            .output("extensions"),
        FieldDescriptor::new("relevance", Arc::new(NullFieldType))
            .output("relevance")
            .sortable()
            .not_searchable()
            .custom(),
        FieldDescriptor::new(
            "publishDate",
            Arc::new(TimestampField::new("resources.publish_date")),
        )
        .storage("resources.publish_date")
        .output("publishDate")
        .sortable(),
        FieldDescriptor::new(
            "timeRequired",
            Arc::new(DurationField::new("resources.time_required")),
        )
        .storage("resources.time_required")
        .output("timeRequired")
        .sortable(),
        FieldDescriptor::new("typicalAgeRange", Arc::new(TypicalAgeRangeField))
            .output("typicalAgeRange"),
        FieldDescriptor::new(
            "textComplexity",
            Arc::new(TextComplexityField::new(TextComplexityAttr::Bare)),
        )
        .storage("resources.text_complexity")
        .output("textComplexity"),
        FieldDescriptor::new(
            "textComplexity.name",
            Arc::new(TextComplexityField::new(TextComplexityAttr::Name)),
        )
        .storage("resources.text_complexity"),
        FieldDescriptor::new(
            "textComplexity.value",
            Arc::new(TextComplexityField::new(TextComplexityAttr::Value)),
        )
        .storage("resources.text_complexity"),
        FieldDescriptor::new(
            "accessibilityAPI",
            Arc::new(StringArrayField::new("resources.accessibility_api")),
        )
        .storage("resources.accessibility_api")
        .output("accessibilityAPI"),
        FieldDescriptor::new(
            "accessibilityInputMethods",
            Arc::new(StringArrayField::new(
                "resources.accessibility_input_methods",
            )),
        )
        .storage("resources.accessibility_input_methods")
        .output("accessibilityInputMethods"),
        FieldDescriptor::new(
            "accessMode",
            Arc::new(StringArrayField::new("resources.access_mode")),
        )
        .storage("resources.access_mode")
        .output("accessMode"),
        FieldDescriptor::new(
            "educationalAudience",
            Arc::new(StringArrayField::new("resources.educational_audience")),
        )
        .storage("resources.educational_audience")
        .output("educationalAudience"),
        FieldDescriptor::new(
            "accessibilityFeatures",
            Arc::new(StringArrayField::new("resources.accessibility_features")),
        )
        .storage("resources.accessibility_features")
        .output("accessibilityFeatures"),
        FieldDescriptor::new(
            "accessibilityHazards",
            Arc::new(StringArrayField::new("resources.accessibility_hazards")),
        )
        .storage("resources.accessibility_hazards")
        .output("accessibilityHazards"),
        FieldDescriptor::new("ltiLink", Arc::new(NullFieldType))
            .storage("resources.lti_link")
            .output("ltiLink")
            .not_searchable(),
    ]
}

fn live_schema(conn: &Connection) -> Result<HashMap<String, HashSet<String>>> {
    let mut schema = HashMap::new();
    for table in ["resources", "taxonomies", "subjects", "resource_stats"] {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .map_err(from_rusqlite)?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<HashSet<String>, _>>()
            .map_err(from_rusqlite)?;
        schema.insert(table.to_string(), columns);
    }
    Ok(schema)
}

fn storage_exists(schema: &HashMap<String, HashSet<String>>, storage: Option<&str>) -> bool {
    let Some(storage) = storage else {
        // computed fields have nothing to check
        return true;
    };
    let Some((table, column)) = storage.split_once('.') else {
        return false;
    };
    schema
        .get(table)
        .is_some_and(|columns| columns.contains(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atheneum_store::migrations::apply_migrations;

    fn setup_map() -> FieldMap {
        let mut conn = Connection::open_in_memory().unwrap();
        atheneum_store::db::configure(&conn).unwrap();
        apply_migrations(&mut conn).unwrap();
        FieldMap::build(&conn, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_inventory_survives_schema_check() {
        let map = setup_map();
        for field in [
            "search",
            "name",
            "learningObjectives.targetName",
            "textComplexity.value",
            "accessibilityHazards",
            "relevance",
        ] {
            assert!(map.find(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_missing_column_drops_descriptor() {
        let conn = Connection::open_in_memory().unwrap();
        // a schema without most resource columns
        conn.execute_batch(
            "CREATE TABLE resources (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE taxonomies (id INTEGER PRIMARY KEY);
             CREATE TABLE subjects (id INTEGER PRIMARY KEY);
             CREATE TABLE resource_stats (id INTEGER PRIMARY KEY);",
        )
        .unwrap();

        let map = FieldMap::build(&conn, &EngineConfig::default()).unwrap();
        assert!(map.find("name").is_some());
        assert!(map.find("rating").is_none());
        // custom descriptors are exempt
        assert!(map.find("relevance").is_some());
    }

    #[test]
    fn test_extension_fields_are_appended() {
        let mut conn = Connection::open_in_memory().unwrap();
        atheneum_store::db::configure(&conn).unwrap();
        apply_migrations(&mut conn).unwrap();

        let config = EngineConfig {
            extension_fields: vec![FieldDescriptor::new(
                "gradeLevel",
                Arc::new(JsonField::subkey("resources.extensions", "gradeLevel")),
            )
            .custom()],
            ..Default::default()
        };
        let map = FieldMap::build(&conn, &config).unwrap();
        assert!(map.find("gradeLevel").is_some());
        assert!(map.search_allowed_names().contains(&"gradeLevel".to_string()));
    }

    #[test]
    fn test_url_not_filterable_but_output() {
        let map = setup_map();
        assert!(!map.search_allowed_names().contains(&"url".to_string()));
        assert!(map.output_names().contains(&"url".to_string()));
    }

    #[test]
    fn test_sortable_set() {
        let map = setup_map();
        let sortable = map.sortable_names();
        for field in ["name", "rating", "publishDate", "timeRequired", "relevance"] {
            assert!(sortable.contains(&field.to_string()), "missing {}", field);
        }
        assert!(!sortable.contains(&"search".to_string()));
    }
}
