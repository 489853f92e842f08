//! Schema registry error types
//!
//! Error codes:
//! - MDF_SCHEMA_UNKNOWN_RESOURCE (REJECT)
//! - MDF_SCHEMA_MALFORMED (FATAL)
//! - MDF_SCHEMA_IMMUTABLE (REJECT)
//!
//! Document validation failures are not errors: they are reported through
//! [`ValidationReport`](super::ValidationReport) so callers can skip a record
//! and continue.

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, registry unchanged
    Reject,
    /// Registry could not be built; the pipeline cannot start
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// No rule set registered for the resource type
    MdfSchemaUnknownResource,
    /// Rule file unreadable or structurally invalid
    MdfSchemaMalformed,
    /// Attempt to replace a registered rule set
    MdfSchemaImmutable,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::MdfSchemaUnknownResource => "MDF_SCHEMA_UNKNOWN_RESOURCE",
            SchemaErrorCode::MdfSchemaMalformed => "MDF_SCHEMA_MALFORMED",
            SchemaErrorCode::MdfSchemaImmutable => "MDF_SCHEMA_IMMUTABLE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::MdfSchemaMalformed => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
}

impl SchemaError {
    /// No rule set for the given resource type
    pub fn unknown_resource(resource_type: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::MdfSchemaUnknownResource,
            message: format!("No schema registered for resource type '{}'", resource_type),
        }
    }

    /// Rule file or in-memory rule set is malformed
    pub fn malformed_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MdfSchemaMalformed,
            message: format!("Malformed schema '{}': {}", path.into(), reason.into()),
        }
    }

    /// Rule set already registered
    pub fn schema_immutable(resource_type: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::MdfSchemaImmutable,
            message: format!("Schema for resource type '{}' is already registered", resource_type),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SchemaErrorCode::MdfSchemaUnknownResource.code(),
            "MDF_SCHEMA_UNKNOWN_RESOURCE"
        );
        assert_eq!(SchemaErrorCode::MdfSchemaMalformed.code(), "MDF_SCHEMA_MALFORMED");
        assert_eq!(SchemaErrorCode::MdfSchemaImmutable.code(), "MDF_SCHEMA_IMMUTABLE");
    }

    #[test]
    fn test_malformed_is_fatal() {
        assert!(SchemaError::malformed_schema("x.json", "bad").is_fatal());
        assert!(!SchemaError::schema_immutable("record").is_fatal());
    }

    #[test]
    fn test_display_includes_code() {
        let err = SchemaError::unknown_resource("record");
        let display = format!("{}", err);
        assert!(display.contains("MDF_SCHEMA_UNKNOWN_RESOURCE"));
        assert!(display.contains("record"));
    }
}
