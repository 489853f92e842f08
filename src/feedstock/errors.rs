//! Feedstock error types
//!
//! Error codes:
//! - MDF_INVALID_METADATA (schema violation)
//! - MDF_DUPLICATE_SUBJECT (relational violation)
//! - MDF_DATA_CLASS_MISMATCH (relational violation)
//! - MDF_NOT_INITIALIZED (state misuse)
//! - MDF_ALREADY_INITIALIZED (state misuse)
//! - MDF_FEEDSTOCK_IO (I/O failure)
//! - MDF_SCHEMA_UNAVAILABLE (registry has no rules)
//!
//! Every one of these is reported per call. Only a failure while opening a
//! dataset leaves the validator unusable.

use std::fmt;
use std::io;

use crate::schema::{FieldViolation, SchemaError};

/// Broad failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Relational,
    State,
    Io,
}

/// Feedstock error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedstockErrorCode {
    MdfInvalidMetadata,
    MdfDuplicateSubject,
    MdfDataClassMismatch,
    MdfNotInitialized,
    MdfAlreadyInitialized,
    MdfFeedstockIo,
    MdfSchemaUnavailable,
}

impl FeedstockErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            FeedstockErrorCode::MdfInvalidMetadata => "MDF_INVALID_METADATA",
            FeedstockErrorCode::MdfDuplicateSubject => "MDF_DUPLICATE_SUBJECT",
            FeedstockErrorCode::MdfDataClassMismatch => "MDF_DATA_CLASS_MISMATCH",
            FeedstockErrorCode::MdfNotInitialized => "MDF_NOT_INITIALIZED",
            FeedstockErrorCode::MdfAlreadyInitialized => "MDF_ALREADY_INITIALIZED",
            FeedstockErrorCode::MdfFeedstockIo => "MDF_FEEDSTOCK_IO",
            FeedstockErrorCode::MdfSchemaUnavailable => "MDF_SCHEMA_UNAVAILABLE",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FeedstockErrorCode::MdfInvalidMetadata | FeedstockErrorCode::MdfSchemaUnavailable => {
                ErrorCategory::Schema
            }
            FeedstockErrorCode::MdfDuplicateSubject | FeedstockErrorCode::MdfDataClassMismatch => {
                ErrorCategory::Relational
            }
            FeedstockErrorCode::MdfNotInitialized | FeedstockErrorCode::MdfAlreadyInitialized => {
                ErrorCategory::State
            }
            FeedstockErrorCode::MdfFeedstockIo => ErrorCategory::Io,
        }
    }
}

impl fmt::Display for FeedstockErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Feedstock error with full context
#[derive(Debug)]
pub struct FeedstockError {
    code: FeedstockErrorCode,
    message: String,
    invalid_fields: Vec<FieldViolation>,
    source: Option<io::Error>,
}

impl FeedstockError {
    fn new(code: FeedstockErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            invalid_fields: Vec::new(),
            source: None,
        }
    }

    /// Document failed schema validation
    pub fn invalid_metadata(resource: &str, invalid_fields: Vec<FieldViolation>) -> Self {
        let listed = invalid_fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            invalid_fields,
            ..Self::new(
                FeedstockErrorCode::MdfInvalidMetadata,
                format!("Invalid {} metadata: {}", resource, listed),
            )
        }
    }

    pub fn duplicate_subject(subject: &str) -> Self {
        Self::new(
            FeedstockErrorCode::MdfDuplicateSubject,
            format!("Subject '{}' already written to this dataset", subject),
        )
    }

    pub fn data_class_mismatch(record: &str, dataset: &str) -> Self {
        Self::new(
            FeedstockErrorCode::MdfDataClassMismatch,
            format!(
                "Record data_class '{}' does not match dataset data_class '{}'",
                record, dataset
            ),
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            FeedstockErrorCode::MdfNotInitialized,
            "Validator not initialized: no open dataset",
        )
    }

    pub fn already_initialized() -> Self {
        Self::new(
            FeedstockErrorCode::MdfAlreadyInitialized,
            "Validator already holds a dataset",
        )
    }

    /// Writer refused a line after an earlier failed write
    pub fn poisoned(path: &std::path::Path, lines_written: u64) -> Self {
        Self::new(
            FeedstockErrorCode::MdfFeedstockIo,
            format!(
                "Feedstock {} stopped after line {} because a write failed",
                path.display(),
                lines_written
            ),
        )
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        let context = context.into();
        Self {
            source: Some(source),
            ..Self::new(FeedstockErrorCode::MdfFeedstockIo, context)
        }
    }

    /// Returns the error code
    pub fn code(&self) -> FeedstockErrorCode {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field violations behind an `MDF_INVALID_METADATA` error
    pub fn invalid_fields(&self) -> &[FieldViolation] {
        &self.invalid_fields
    }
}

impl fmt::Display for FeedstockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for FeedstockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<SchemaError> for FeedstockError {
    fn from(err: SchemaError) -> Self {
        Self::new(FeedstockErrorCode::MdfSchemaUnavailable, err.to_string())
    }
}

/// Result type for feedstock operations
pub type FeedstockResult<T> = Result<T, FeedstockError>;
