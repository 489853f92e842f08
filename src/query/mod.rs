//! Query construction for the search service
//!
//! [`QueryBuilder`] accumulates terms, fields and operators; the cleaned
//! string is what gets sent.

mod builder;

pub use builder::{
    clean_query, QueryBuilder, ELEMENTS_FIELD, OPERATORS, SCROLL_ID_FIELD, SOURCE_NAME_FIELD,
    TITLE_FIELD,
};
