use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AthError, AthErrorKind, Result};

/// Review status of an alignment
///
/// Integer codes are stable in storage. Only `Confirmed` alignments
/// contribute to the direct taxonomy closure column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentStatus {
    Unreviewed = 1,
    Confirmed = 2,
    Rejected = 3,
}

impl AlignmentStatus {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(code: i64) -> Result<Self> {
        match code {
            1 => Ok(AlignmentStatus::Unreviewed),
            2 => Ok(AlignmentStatus::Confirmed),
            3 => Ok(AlignmentStatus::Rejected),
            other => Err(AthError::new(AthErrorKind::InvalidInput)
                .with_op("alignment_status_decode")
                .with_message(format!("unknown alignment status code {}", other))),
        }
    }
}

/// Alignment - join entity between a Resource and a Taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub id: i64,
    pub resource_id: i64,
    pub taxonomy_id: i64,
    pub status: AlignmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Alignment {
    /// New alignment, confirmed by default as curated imports are
    pub fn new(resource_id: i64, taxonomy_id: i64) -> Self {
        Self {
            id: 0,
            resource_id,
            taxonomy_id,
            status: AlignmentStatus::Confirmed,
            created_at: Utc::now(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == AlignmentStatus::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            AlignmentStatus::Unreviewed,
            AlignmentStatus::Confirmed,
            AlignmentStatus::Rejected,
        ] {
            assert_eq!(AlignmentStatus::from_i64(status.as_i64()).unwrap(), status);
        }
        assert!(AlignmentStatus::from_i64(9).is_err());
    }

    #[test]
    fn test_new_alignment_confirmed() {
        let a = Alignment::new(1, 2);
        assert!(a.is_confirmed());
    }
}
