//! Schema registry and field-rule engine
//!
//! Every dataset and record is checked against the rule set for its
//! resource type before it reaches the feedstock.
//!
//! # Rules
//!
//! - Required fields must be present and non-empty
//! - Present fields must match their declared type
//! - List and dict elements must be non-empty and of the declared type
//! - Undeclared fields are rejected
//! - Oversized free-form payloads are pruned with a warning, or rejected in
//!   strict mode

mod errors;
mod loader;
mod types;
mod user_data;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::SchemaRegistry;
pub use types::{ElementKind, FieldKind, FieldRule, ResourceSchema, ResourceType};
pub use user_data::{prune_user_data, PayloadLimits, PrunedPayload, MAX_LIST_LENGTH, MAX_TOTAL_KEYS};
pub use validator::{
    is_empty_value, FieldViolation, SchemaValidator, ValidationReport, Violation,
    RESERVED_DATA_KEYS, TOP_LEVEL_KEYS,
};
