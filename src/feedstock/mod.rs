//! Feedstock generation
//!
//! Turns one dataset document and its records into newline-delimited JSON:
//! the normalized dataset on line 1, then one normalized record per line,
//! each pointing back to the dataset through `mdf.parent_id`.
//!
//! A [`Validator`] exclusively owns its feedstock file. Feeding one dataset
//! from several producers requires serializing their writes.

mod errors;
mod normalize;
mod validator;
mod writer;

pub use errors::{ErrorCategory, FeedstockError, FeedstockErrorCode, FeedstockResult};
pub use normalize::{escape_uri, normalize_source_name};
pub use validator::{
    BulkReport, FeedstockSummary, Validator, ValidatorOptions, ValidatorState, WriteOutcome,
};
pub use writer::FeedstockWriter;
