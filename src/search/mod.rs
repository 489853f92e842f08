//! Search subsystem
//!
//! - [`SearchExecutor`] runs one bounded query with retry
//! - [`Aggregator`] pages through `mdf.scroll_id` windows to collect
//!   results larger than the hard cap
//! - [`SearchTransport`] is the service boundary; [`HttpTransport`] talks to
//!   the real service, [`MemoryTransport`] is a synthetic index
//!
//! Both the retry loop and the window loop check a [`CancelToken`] before
//! each request.

mod aggregator;
mod cancel;
mod errors;
mod executor;
mod memory;
mod transport;

pub use aggregator::Aggregator;
pub use cancel::CancelToken;
pub use errors::{SearchError, SearchResult, TransportError};
pub use executor::{SearchExecutor, SearchInfo, SearchOptions};
pub use memory::MemoryTransport;
pub use transport::{GMetaEntry, GMetaResponse, HttpTransport, SearchRequest, SearchTransport};
