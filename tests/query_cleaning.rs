//! Query Cleaning Tests
//!
//! Whatever the builder accumulated, the cleaned query has no empty groups,
//! no dangling operators and balanced parentheses.

use mdfpipe::query::{clean_query, QueryBuilder};

// =============================================================================
// Helper Functions
// =============================================================================

fn balanced(query: &str) -> bool {
    let mut depth = 0i64;
    for c in query.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

// =============================================================================
// Cleaning Tests
// =============================================================================

#[test]
fn test_documented_examples() {
    assert_eq!(clean_query("() term "), "term");
    assert_eq!(clean_query("(term AND term2"), "(term AND term2)");
    assert_eq!(clean_query("term AND term2))))"), "((((term AND term2))))");
}

#[test]
fn test_cleaning_is_idempotent() {
    for raw in ["() term ", "(a AND b OR ", "((x) AND (", "a))", "(((", ""] {
        let once = clean_query(raw);
        assert_eq!(clean_query(&once), once, "input {:?}", raw);
    }
}

#[test]
fn test_builder_output_always_balanced() {
    let mut query = QueryBuilder::new();
    query
        .match_elements(&["Fe", "O"], false)
        .match_sources(&["oqmd", "nist_xps"])
        .exclude_field("mdf.tags", "deprecated", true)
        .match_range("mdf.year", "2000", "2010", true, true, true)
        .and_join(true);

    let cleaned = query.clean_query();
    assert!(balanced(&cleaned), "{}", cleaned);
    assert!(!cleaned.ends_with("AND"));
    assert!(!cleaned.contains("()"));
    assert!(query.is_advanced());
}

#[test]
fn test_raw_query_untouched_by_cleaning() {
    let mut query = QueryBuilder::new();
    query.term("band gap").and_join(false);

    let raw = query.current_query().to_string();
    let _ = query.clean_query();
    assert_eq!(query.current_query(), raw);
    assert_eq!(query.clean_query(), "(band gap)");
}

#[test]
fn test_plain_term_stays_simple() {
    let mut query = QueryBuilder::new();
    query.term("perovskite");
    assert!(!query.is_advanced());
    assert_eq!(query.to_string(), "(perovskite)");
}
