use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AthError, AthErrorKind, Result};

use super::enums::{
    ACCESSIBILITY_API, ACCESSIBILITY_HAZARDS, ACCESSIBILITY_INPUT_METHODS, ACCESS_MODE,
    EDUCATIONAL_AUDIENCE, LEARNING_RESOURCE_TYPES, TEXT_COMPLEXITY_METRICS,
};

/// Resource - the catalog entity
///
/// Carries the descriptive fields clients filter and sort on, plus the
/// denormalized closure columns maintained exclusively by the
/// denormalization pass in atheneum-store. The closure columns are never
/// written by user edits; the query path only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Row id (0 until persisted)
    pub id: i64,

    pub name: String,

    pub description: String,

    pub url: Option<String>,

    pub publisher: Option<String>,

    pub author: Option<String>,

    /// One of [`LEARNING_RESOURCE_TYPES`]
    pub learning_resource_type: Option<String>,

    /// Two-letter language code
    pub language: Option<String>,

    pub thumbnail_url: Option<String>,

    pub technical_format: Option<String>,

    pub use_rights_url: Option<String>,

    pub rating: Option<f64>,

    pub publish_date: Option<DateTime<Utc>>,

    /// Typical time required, in whole minutes
    pub time_required: Option<i64>,

    /// Typical age range bounds
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,

    /// Launch descriptor for tool consumers, opaque to the query engine
    pub lti_link: Option<Value>,

    /// Map keyed by [`TEXT_COMPLEXITY_METRICS`] names
    pub text_complexity: Option<Value>,

    /// Free-form ecosystem extension map
    pub extensions: Option<Value>,

    pub educational_audience: Vec<String>,
    pub accessibility_api: Vec<String>,
    pub accessibility_input_methods: Vec<String>,
    pub access_mode: Vec<String>,
    pub accessibility_features: Vec<String>,
    pub accessibility_hazards: Vec<String>,

    /// Closure column: taxonomy ids reachable via confirmed alignments
    pub direct_taxonomy_ids: Vec<i64>,

    /// Closure column: direct ids plus one mapping hop
    pub all_taxonomy_ids: Vec<i64>,

    /// Closure column: statistic row ids for confirmed-aligned taxonomies
    pub resource_stat_ids: Vec<i64>,

    /// Closure column: linked subject ids
    pub subject_ids: Vec<i64>,

    /// Closure column: taxonomy identifier -> effectiveness score
    pub efficacy: BTreeMap<String, f64>,

    /// Closure column: mean of `efficacy` values
    pub avg_efficacy: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Create a new unpersisted resource with empty closure columns
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            url: None,
            publisher: None,
            author: None,
            learning_resource_type: None,
            language: None,
            thumbnail_url: None,
            technical_format: None,
            use_rights_url: None,
            rating: None,
            publish_date: None,
            time_required: None,
            min_age: None,
            max_age: None,
            lti_link: None,
            text_complexity: None,
            extensions: None,
            educational_audience: Vec::new(),
            accessibility_api: Vec::new(),
            accessibility_input_methods: Vec::new(),
            access_mode: Vec::new(),
            accessibility_features: Vec::new(),
            accessibility_hazards: Vec::new(),
            direct_taxonomy_ids: Vec::new(),
            all_taxonomy_ids: Vec::new(),
            resource_stat_ids: Vec::new(),
            subject_ids: Vec::new(),
            efficacy: BTreeMap::new(),
            avg_efficacy: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the closed-vocabulary and format constraints
    ///
    /// Checked before every persist. Violations are `ERR_INVALID_INPUT`.
    pub fn validate(&self) -> Result<()> {
        if let Some(lrt) = &self.learning_resource_type {
            if !LEARNING_RESOURCE_TYPES.contains(&lrt.as_str()) {
                return Err(invalid(format!(
                    "learning_resource_type '{}' is not a known type",
                    lrt
                )));
            }
        }
        if let Some(lang) = &self.language {
            if lang.chars().count() != 2 {
                return Err(invalid(format!("language '{}' must be 2 characters", lang)));
            }
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(invalid(format!("rating {} must be within 0.0..=5.0", rating)));
            }
        }
        if let Some(minutes) = self.time_required {
            if minutes <= 0 {
                return Err(invalid("time_required must be greater than 0"));
            }
        }
        if let Some(tc) = &self.text_complexity {
            match tc.as_object() {
                Some(map) => {
                    for key in map.keys() {
                        if !TEXT_COMPLEXITY_METRICS.contains(&key.as_str()) {
                            return Err(invalid(format!(
                                "text_complexity should contain {:?} keys",
                                TEXT_COMPLEXITY_METRICS
                            )));
                        }
                    }
                }
                None => return Err(invalid("text_complexity must be an object")),
            }
        }

        check_vocabulary(
            "educational_audience",
            &self.educational_audience,
            EDUCATIONAL_AUDIENCE,
        )?;
        check_vocabulary("accessibility_api", &self.accessibility_api, ACCESSIBILITY_API)?;
        check_vocabulary(
            "accessibility_input_methods",
            &self.accessibility_input_methods,
            ACCESSIBILITY_INPUT_METHODS,
        )?;
        check_vocabulary("access_mode", &self.access_mode, ACCESS_MODE)?;
        check_vocabulary(
            "accessibility_hazards",
            &self.accessibility_hazards,
            ACCESSIBILITY_HAZARDS,
        )?;
        Ok(())
    }

    pub fn has_age_range(&self) -> bool {
        self.min_age.is_some() || self.max_age.is_some()
    }
}

fn invalid(message: impl Into<String>) -> AthError {
    AthError::new(AthErrorKind::InvalidInput)
        .with_op("resource_validate")
        .with_message(message)
}

fn check_vocabulary(field: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    for v in values {
        if !allowed.contains(&v.as_str()) {
            return Err(invalid(format!(
                "{} should contain {:?} elements, got '{}'",
                field, allowed, v
            )));
        }
    }
    Ok(())
}
