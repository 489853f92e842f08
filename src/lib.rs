//! mdfpipe - materials metadata curation and search
//!
//! Validates dataset and record metadata against resource schemas, writes
//! newline-delimited feedstock files, and retrieves documents from a remote
//! search index, including result sets larger than the service cap.

pub mod cli;
pub mod composition;
pub mod config;
pub mod feedstock;
pub mod observability;
pub mod query;
pub mod schema;
pub mod search;
