//! Composition string parsing
//!
//! `"Bi2S3"` and `"bismuth and sulfur"` both yield `{Bi, S}`. A string that
//! produces any token outside the periodic table yields nothing at all.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::elements::{is_element_symbol, names_longest_first};

struct NameTable {
    pattern: Regex,
    symbols: Vec<(&'static str, &'static str)>,
}

// Alternation is leftmost-first, so longest names go first.
static NAME_TABLE: LazyLock<NameTable> = LazyLock::new(|| {
    let symbols = names_longest_first();
    let alternation = symbols
        .iter()
        .map(|(_, name)| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("element name pattern failed to compile: {}", e));
    NameTable { pattern, symbols }
});

fn symbol_for_name(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    NAME_TABLE
        .symbols
        .iter()
        .find(|(_, n)| *n == lower)
        .map(|(symbol, _)| *symbol)
}

/// Extracts the element symbols named by `composition`.
///
/// Returns `None` unless every token is a known element symbol, or when no
/// token is found.
pub fn parse_composition(composition: &str) -> Option<BTreeSet<String>> {
    let stripped = composition.replace(" and ", "");

    let substituted = NAME_TABLE
        .pattern
        .replace_all(&stripped, |caps: &regex::Captures| {
            symbol_for_name(&caps[0]).unwrap_or_default().to_string()
        });

    let mut spaced = String::with_capacity(substituted.len() * 2);
    for c in substituted.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
            spaced.push(c);
        } else if c.is_lowercase() {
            spaced.push(c);
        }
    }

    let tokens: BTreeSet<String> = spaced.split_whitespace().map(str::to_string).collect();

    if tokens.is_empty() || !tokens.iter().all(|t| is_element_symbol(t)) {
        return None;
    }
    Some(tokens)
}
