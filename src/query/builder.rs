//! Fluent boolean query assembly
//!
//! The builder keeps one raw expression string that always starts with `(`.
//! Nothing is validated while building; [`clean_query`] turns the raw string
//! into something the search service accepts by dropping empty groups and
//! dangling operators and then balancing parentheses.

use std::fmt;

use crate::observability::Logger;

/// Boolean operators understood by the search service
pub const OPERATORS: [&str; 3] = ["AND", "OR", "NOT"];

pub const SOURCE_NAME_FIELD: &str = "mdf.source_name";
pub const ELEMENTS_FIELD: &str = "mdf.elements";
pub const TITLE_FIELD: &str = "mdf.title";
pub const SCROLL_ID_FIELD: &str = "mdf.scroll_id";

/// Mutable query under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    query: String,
    advanced: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            query: "(".to_string(),
            advanced: false,
        }
    }

    /// Starts from an existing raw query.
    pub fn from_query(query: impl Into<String>, advanced: bool) -> Self {
        let query = query.into();
        Self {
            query: if query.is_empty() { "(".to_string() } else { query },
            advanced,
        }
    }

    /// The raw, uncleaned expression.
    pub fn current_query(&self) -> &str {
        &self.query
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    pub fn set_advanced(&mut self, advanced: bool) -> &mut Self {
        self.advanced = advanced;
        self
    }

    /// True once anything beyond the opening parenthesis was added.
    pub fn initialized(&self) -> bool {
        let trimmed = self.query.trim();
        !trimmed.is_empty() && trimmed != "("
    }

    /// Discards the expression and returns to plain-text mode.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new();
        self
    }

    /// Appends raw text.
    pub fn term(&mut self, text: &str) -> &mut Self {
        self.query.push_str(text);
        self
    }

    /// Appends `name:value` and switches to the advanced dialect.
    ///
    /// Values containing spaces are double-quoted unless they are already
    /// quoted, are a range, or use wildcard characters.
    pub fn field(&mut self, name: &str, value: &str) -> &mut Self {
        if name.is_empty() || value.is_empty() {
            return self;
        }
        let needs_quotes = value.contains(' ')
            && !value.contains('"')
            && !value.contains(['*', '?', '~'])
            && !value.starts_with(['[', '{']);

        self.advanced = true;
        if needs_quotes {
            self.term(&format!("{}:\"{}\"", name, value))
        } else {
            self.term(&format!("{}:{}", name, value))
        }
    }

    /// Appends an operator. With `close_group`, the current group is closed
    /// and a new one opened around it.
    pub fn operator(&mut self, op: &str, close_group: bool) -> &mut Self {
        let op = op.trim().to_uppercase();
        if !OPERATORS.contains(&op.as_str()) {
            Logger::error("QUERY_INVALID_OPERATOR", &[("operator", &op)]);
            return self;
        }
        if close_group {
            self.query.push_str(&format!(") {} (", op));
        } else {
            self.query.push_str(&format!(" {} ", op));
        }
        self
    }

    pub fn and_join(&mut self, close_group: bool) -> &mut Self {
        self.join("AND", close_group)
    }

    pub fn or_join(&mut self, close_group: bool) -> &mut Self {
        self.join("OR", close_group)
    }

    pub fn negate(&mut self) -> &mut Self {
        self.operator("NOT", false)
    }

    fn join(&mut self, op: &str, close_group: bool) -> &mut Self {
        if !self.initialized() {
            Logger::warn(
                "QUERY_JOIN_IGNORED",
                &[("operator", op), ("reason", "no term added yet")],
            );
            return self;
        }
        self.operator(op, close_group)
    }

    /// Adds `field:value`, joined with AND when `required`, OR otherwise.
    pub fn match_field(
        &mut self,
        field: &str,
        value: &str,
        required: bool,
        new_group: bool,
    ) -> &mut Self {
        if self.initialized() {
            if required {
                self.and_join(new_group);
            } else {
                self.or_join(new_group);
            }
        }
        self.field(field, value)
    }

    /// Adds `NOT field:value`.
    pub fn exclude_field(&mut self, field: &str, value: &str, new_group: bool) -> &mut Self {
        if field.is_empty() || value.is_empty() {
            return self;
        }
        if self.initialized() {
            self.and_join(new_group);
        }
        self.term("NOT ").field(field, value)
    }

    /// Adds a range match; `"*"` leaves an end open.
    pub fn match_range(
        &mut self,
        field: &str,
        start: &str,
        stop: &str,
        inclusive: bool,
        required: bool,
        new_group: bool,
    ) -> &mut Self {
        let start = if start.is_empty() { "*" } else { start };
        let stop = if stop.is_empty() { "*" } else { stop };
        let value = if inclusive {
            format!("[{} TO {}]", start, stop)
        } else {
            format!("{{{} TO {}}}", start, stop)
        };
        self.match_field(field, &value, required, new_group)
    }

    /// Matches any of the given source names, as one group.
    pub fn match_sources(&mut self, sources: &[&str]) -> &mut Self {
        self.match_any(SOURCE_NAME_FIELD, sources)
    }

    /// Matches any of the given titles, as one group.
    pub fn match_titles(&mut self, titles: &[&str]) -> &mut Self {
        self.match_any(TITLE_FIELD, titles)
    }

    /// Matches records containing all (or any) of the given elements.
    pub fn match_elements(&mut self, elements: &[&str], match_all: bool) -> &mut Self {
        if let Some((first, rest)) = elements.split_first() {
            self.match_field(ELEMENTS_FIELD, first, true, true);
            for element in rest {
                self.match_field(ELEMENTS_FIELD, element, match_all, false);
            }
        }
        self
    }

    fn match_any(&mut self, field: &str, values: &[&str]) -> &mut Self {
        if let Some((first, rest)) = values.split_first() {
            self.match_field(field, first, true, true);
            for value in rest {
                self.match_field(field, value, false, false);
            }
        }
        self
    }

    /// Cleaned copy of the expression; the builder is left untouched.
    pub fn clean_query(&self) -> String {
        clean_query(&self.query)
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clean_query())
    }
}

/// Removes empty groups and dangling trailing `(` or operators, then
/// balances parentheses.
pub fn clean_query(raw: &str) -> String {
    let mut query = raw.trim().to_string();

    while query.contains("()") {
        query = query.replace("()", "");
    }
    query = query.trim().to_string();

    loop {
        let before = query.len();
        if let Some(stripped) = query.strip_suffix('(') {
            query = stripped.trim_end().to_string();
        }
        for op in OPERATORS {
            if ends_with_operator(&query, op) {
                query.truncate(query.len() - op.len());
                query = query.trim_end().to_string();
            }
        }
        if query.len() == before {
            break;
        }
    }

    let opens = query.matches('(').count();
    let closes = query.matches(')').count();
    if opens > closes {
        query.push_str(&")".repeat(opens - closes));
    } else if closes > opens {
        query = format!("{}{}", "(".repeat(closes - opens), query);
    }

    query
}

fn ends_with_operator(query: &str, op: &str) -> bool {
    match query.strip_suffix(op) {
        Some("") => true,
        Some(rest) => rest.ends_with([' ', '(', ')']),
        None => false,
    }
}
