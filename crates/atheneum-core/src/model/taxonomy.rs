use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Taxonomy - a node in a learning-standard forest
///
/// Parent/child structure is carried by `ancestry`, a `/`-separated path of
/// ancestor ids from root to parent (`None` for roots), so descendant lookups
/// are path matches rather than recursive queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: i64,

    /// Human-facing identifier within its framework (e.g. "CCSS.Math.5.NF.1")
    pub identifier: String,

    /// External GUID in the source standards registry
    pub opensalt_identifier: Option<String>,

    pub description: Option<String>,

    /// Tag such as "teaches" or "assesses"
    pub alignment_type: Option<String>,

    /// URI of the source framework item
    pub source: Option<String>,

    /// Ancestor id path, e.g. "1/5/9"
    pub ancestry: Option<String>,

    pub min_age: Option<i64>,
    pub max_age: Option<i64>,

    /// Alternative identifiers matched when alias search is enabled
    pub aliases: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl Taxonomy {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: 0,
            identifier: identifier.into(),
            opensalt_identifier: None,
            description: None,
            alignment_type: None,
            source: None,
            ancestry: None,
            min_age: None,
            max_age: None,
            aliases: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.ancestry.is_none()
    }

    /// Ancestor ids parsed from the ancestry path, root first
    pub fn ancestor_ids(&self) -> Vec<i64> {
        match &self.ancestry {
            Some(path) => path.split('/').filter_map(|s| s.parse().ok()).collect(),
            None => Vec::new(),
        }
    }
}

/// TaxonomyMapping - a one-hop cross-reference between two taxonomies
///
/// Stored directed, matched symmetrically: a mapping row applies to a
/// taxonomy id equal to either end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyMapping {
    pub id: i64,
    pub taxonomy_id: i64,
    pub target_id: i64,
}

impl TaxonomyMapping {
    pub fn new(taxonomy_id: i64, target_id: i64) -> Self {
        Self {
            id: 0,
            taxonomy_id,
            target_id,
        }
    }

    /// True when either end of the mapping is `taxonomy_id`
    pub fn touches(&self, taxonomy_id: i64) -> bool {
        self.taxonomy_id == taxonomy_id || self.target_id == taxonomy_id
    }

    /// The opposite end of the mapping from `taxonomy_id`
    pub fn other_end(&self, taxonomy_id: i64) -> Option<i64> {
        if self.taxonomy_id == taxonomy_id {
            Some(self.target_id)
        } else if self.target_id == taxonomy_id {
            Some(self.taxonomy_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestor_ids_parsed() {
        let mut t = Taxonomy::new("MATH.1");
        assert!(t.is_root());
        assert!(t.ancestor_ids().is_empty());

        t.ancestry = Some("1/5/9".to_string());
        assert!(!t.is_root());
        assert_eq!(t.ancestor_ids(), vec![1, 5, 9]);
    }

    #[test]
    fn test_mapping_is_symmetric_in_use() {
        let m = TaxonomyMapping::new(3, 7);
        assert!(m.touches(3));
        assert!(m.touches(7));
        assert!(!m.touches(5));
        assert_eq!(m.other_end(3), Some(7));
        assert_eq!(m.other_end(7), Some(3));
        assert_eq!(m.other_end(5), None);
    }
}
