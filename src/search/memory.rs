//! In-memory search index
//!
//! Stands in for the remote service in tests and offline runs. It enforces
//! a hard cap like the real service and understands enough of the advanced
//! dialect for scroll-window pagination:
//!
//! - `field:value` terms on the same field are alternatives, terms on
//!   different fields must all hold;
//! - `field:>=N`, `field:>N`, `field:<N`, `field:<=N` compare numerically;
//! - boolean operators and grouping are not evaluated.
//!
//! Plain-text queries match documents whose JSON contains the text, and
//! `*` matches everything.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use serde_json::Value;

use super::errors::TransportError;
use super::transport::{GMetaEntry, GMetaResponse, SearchRequest, SearchTransport};

static FIELD_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w.]*):("[^"]*"|[^\s()]+)"#)
        .unwrap_or_else(|e| panic!("field term pattern: {}", e))
});

/// Synthetic index honoring a hard cap
#[derive(Debug)]
pub struct MemoryTransport {
    documents: Vec<Value>,
    hard_cap: usize,
    failures_left: AtomicUsize,
    requests: Mutex<Vec<(String, SearchRequest)>>,
}

impl MemoryTransport {
    pub fn new(documents: Vec<Value>, hard_cap: usize) -> Self {
        Self {
            documents,
            hard_cap,
            failures_left: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next `count` requests fail with a transport error.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Every request received so far, with the index it targeted.
    pub fn requests(&self) -> Vec<(String, SearchRequest)> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn matching(&self, request: &SearchRequest) -> Vec<&Value> {
        if !request.advanced {
            let text = request.q.trim().to_lowercase();
            return self
                .documents
                .iter()
                .filter(|doc| text == "*" || doc.to_string().to_lowercase().contains(&text))
                .collect();
        }

        let mut equalities: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut comparisons: Vec<(&str, Comparison)> = Vec::new();
        for caps in FIELD_TERM.captures_iter(&request.q) {
            let (Some(field), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            match Comparison::parse(value.as_str()) {
                Some(cmp) => comparisons.push((field.as_str(), cmp)),
                None => equalities
                    .entry(field.as_str())
                    .or_default()
                    .push(value.as_str().trim_matches('"').to_string()),
            }
        }

        self.documents
            .iter()
            .filter(|doc| {
                comparisons.iter().all(|(field, cmp)| {
                    lookup(doc, field)
                        .and_then(Value::as_f64)
                        .is_some_and(|n| cmp.holds(n))
                }) && equalities.iter().all(|(field, values)| {
                    lookup(doc, field).is_some_and(|found| values.iter().any(|v| equals(found, v)))
                })
            })
            .collect()
    }
}

impl SearchTransport for MemoryTransport {
    fn post_search(
        &self,
        index_id: &str,
        request: &SearchRequest,
    ) -> Result<GMetaResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((index_id.to_string(), request.clone()));

        let pending = self.failures_left.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures_left.store(pending - 1, Ordering::SeqCst);
            return Err(TransportError::Unavailable("injected failure".into()));
        }

        let matches = self.matching(request);
        let take = request.limit.min(self.hard_cap);
        let gmeta: Vec<GMetaEntry> = matches
            .iter()
            .skip(request.offset)
            .take(take)
            .map(|doc| GMetaEntry {
                subject: lookup(doc, "mdf.id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                content: vec![(*doc).clone()],
            })
            .collect();

        Ok(GMetaResponse {
            total: matches.len(),
            count: gmeta.len(),
            gmeta,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Ge(f64),
    Gt(f64),
    Le(f64),
    Lt(f64),
}

impl Comparison {
    fn parse(value: &str) -> Option<Self> {
        let (ctor, rest): (fn(f64) -> Self, &str) = if let Some(rest) = value.strip_prefix(">=") {
            (Self::Ge, rest)
        } else if let Some(rest) = value.strip_prefix("<=") {
            (Self::Le, rest)
        } else if let Some(rest) = value.strip_prefix('>') {
            (Self::Gt, rest)
        } else if let Some(rest) = value.strip_prefix('<') {
            (Self::Lt, rest)
        } else {
            return None;
        };
        rest.parse().ok().map(ctor)
    }

    fn holds(&self, n: f64) -> bool {
        match *self {
            Self::Ge(bound) => n >= bound,
            Self::Gt(bound) => n > bound,
            Self::Le(bound) => n <= bound,
            Self::Lt(bound) => n < bound,
        }
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, key| value.get(key))
}

fn equals(found: &Value, expected: &str) -> bool {
    match found {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        Value::Array(items) => items.iter().any(|item| equals(item, expected)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> MemoryTransport {
        let docs = (0..10)
            .map(|i| {
                json!({"mdf": {
                    "id": format!("doc-{}", i),
                    "source_name": if i % 2 == 0 { "even" } else { "odd" },
                    "elements": ["Fe", "O"],
                    "scroll_id": i
                }})
            })
            .collect();
        MemoryTransport::new(docs, 3)
    }

    fn advanced(q: &str, limit: usize) -> SearchRequest {
        SearchRequest {
            q: q.into(),
            advanced: true,
            limit,
            offset: 0,
        }
    }

    #[test]
    fn test_hard_cap_applies_to_page_not_total() {
        let response = index()
            .post_search("idx", &advanced("(mdf.source_name:even)", 100))
            .unwrap();
        assert_eq!(response.total, 5);
        assert_eq!(response.count, 3);
    }

    #[test]
    fn test_scroll_range() {
        let response = index()
            .post_search(
                "idx",
                &advanced("(mdf.elements:Fe) AND (mdf.scroll_id:>=4 AND mdf.scroll_id:<6)", 10),
            )
            .unwrap();
        let ids: Vec<_> = response
            .into_documents()
            .iter()
            .map(|d| d["mdf"]["scroll_id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn test_same_field_terms_are_alternatives() {
        let response = index()
            .post_search(
                "idx",
                &advanced("(mdf.source_name:even OR mdf.source_name:odd)", 0),
            )
            .unwrap();
        assert_eq!(response.total, 10);
        assert!(response.gmeta.is_empty());
    }

    #[test]
    fn test_injected_failures() {
        let transport = index();
        transport.fail_next(1);
        assert!(transport.post_search("idx", &advanced("x:y", 1)).is_err());
        assert!(transport.post_search("idx", &advanced("x:y", 1)).is_ok());
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_plain_text() {
        let request = SearchRequest {
            q: "doc-7".into(),
            advanced: false,
            limit: 10,
            offset: 0,
        };
        assert_eq!(index().post_search("idx", &request).unwrap().total, 1);
    }
}
