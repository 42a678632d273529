use serde::{Deserialize, Serialize};

/// Result type alias using AthError
pub type Result<T> = std::result::Result<T, AthError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Stable, structured classification of all errors in the Atheneum system.
/// Each kind maps to a stable error code usable for programmatic handling,
/// testing, and external API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AthErrorKind {
    // Request validation
    InvalidFilter,
    UnknownFilterField,
    UnknownOperator,
    EmptyFieldSelection,
    InvalidInput,

    // Catalog mutation
    NotFound,
    TaxonomyInUse,
    Denormalization,

    // Storage
    Migration,
    ChecksumMismatch,
    Persistence,
    Serialization,
    Io,

    // Internal
    Internal,
}

impl AthErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            AthErrorKind::InvalidFilter => "ERR_INVALID_FILTER",
            AthErrorKind::UnknownFilterField => "ERR_UNKNOWN_FILTER_FIELD",
            AthErrorKind::UnknownOperator => "ERR_UNKNOWN_OPERATOR",
            AthErrorKind::EmptyFieldSelection => "ERR_EMPTY_FIELD_SELECTION",
            AthErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            AthErrorKind::NotFound => "ERR_NOT_FOUND",
            AthErrorKind::TaxonomyInUse => "ERR_TAXONOMY_IN_USE",
            AthErrorKind::Denormalization => "ERR_DENORMALIZATION",
            AthErrorKind::Migration => "ERR_MIGRATION",
            AthErrorKind::ChecksumMismatch => "ERR_CHECKSUM_MISMATCH",
            AthErrorKind::Persistence => "ERR_PERSISTENCE",
            AthErrorKind::Serialization => "ERR_SERIALIZATION",
            AthErrorKind::Io => "ERR_IO",
            AthErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the error kind plus optional context for debugging and for
/// building the structured failure object returned to clients. Fatal
/// request errors that name a valid set (unknown filter field, unknown
/// operator) carry it in `valid_set`.
#[derive(Debug, Clone)]
pub struct AthError {
    kind: AthErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<AthError>>,
    valid_set: Option<Vec<String>>,
}

impl AthError {
    /// Create a new error with the specified kind
    pub fn new(kind: AthErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
            source: None,
            valid_set: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: AthError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Add the valid token set named by the error
    pub fn with_valid_set(mut self, names: Vec<String>) -> Self {
        self.valid_set = Some(names);
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> AthErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&AthError> {
        self.source.as_deref()
    }

    /// Get the valid token set, if any
    pub fn valid_set(&self) -> Option<&[String]> {
        self.valid_set.as_deref()
    }
}

impl std::fmt::Display for AthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(valid_set) = &self.valid_set {
            write!(f, " (valid: {})", valid_set.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for AthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

/// Warning severity reported alongside otherwise-successful results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Non-fatal degradation report
///
/// Emitted when selection, sort or order input was invalid and a safe
/// fallback was substituted. Returned in the response body, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub severity: Severity,
    pub code: String,
    pub description: String,
}

impl Warning {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            description: description.into(),
        }
    }
}
