//! Migration checksum helper
//!
//! Applied migrations record a digest of their SQL so later startups can
//! detect in-place edits to already-applied files.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a migration's SQL text
pub fn sql_digest(sql: &str) -> String {
    hex::encode(Sha256::digest(sql.as_bytes()))
}
