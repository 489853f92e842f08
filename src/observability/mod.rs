//! Observability for mdfpipe
//!
//! Structured, synchronous JSON logging. One event per line.
//!
//! ```ignore
//! use mdfpipe::observability::Logger;
//!
//! Logger::info("FEEDSTOCK_CLOSED", &[("records", "42")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
