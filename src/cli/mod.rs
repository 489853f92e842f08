//! CLI module for mdfpipe
//!
//! Provides command-line interface for:
//! - validate: Validate a dataset and records into a feedstock file
//! - search: One bounded search
//! - aggregate: Exhaustive retrieval for a query or source
//! - composition: Element extraction

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{aggregate, composition, run, run_command, search, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json_file, read_ndjson, write_error, write_response};
