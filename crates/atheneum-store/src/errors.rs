//! Error handling for atheneum-store
//!
//! Wraps atheneum-core AthError with store-specific helpers

use atheneum_core::errors::{AthError, AthErrorKind};

/// Result type alias using AthError
pub type Result<T> = std::result::Result<T, AthError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> AthError {
    AthError::new(AthErrorKind::Migration)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> AthError {
    AthError::new(AthErrorKind::ChecksumMismatch)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> AthError {
    AthError::new(AthErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a not-found error for an entity
pub fn not_found(entity: &str, id: i64) -> AthError {
    AthError::new(AthErrorKind::NotFound)
        .with_op(format!("{}_lookup", entity))
        .with_entity_id(id.to_string())
        .with_message(format!("{} {} not found", entity, id))
}

/// Create a serialization error for a JSON column
pub fn json_column_error(column: &str, err: serde_json::Error) -> AthError {
    AthError::new(AthErrorKind::Serialization)
        .with_op("json_column")
        .with_message(format!("column {}: {}", column, err))
}
