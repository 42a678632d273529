use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ResourceStat - an effectiveness measurement for a (resource, taxonomy) pair
///
/// `taxonomy_ident` is denormalized onto the row so the efficacy closure map
/// can be keyed without a taxonomy join at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStat {
    pub id: i64,
    pub resource_id: i64,
    pub taxonomy_id: i64,
    pub taxonomy_ident: String,
    pub effectiveness: f64,
    pub created_at: DateTime<Utc>,
}

impl ResourceStat {
    pub fn new(
        resource_id: i64,
        taxonomy_id: i64,
        taxonomy_ident: impl Into<String>,
        effectiveness: f64,
    ) -> Self {
        Self {
            id: 0,
            resource_id,
            taxonomy_id,
            taxonomy_ident: taxonomy_ident.into(),
            effectiveness,
            created_at: Utc::now(),
        }
    }
}
