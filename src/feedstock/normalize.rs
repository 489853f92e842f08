//! Document normalization applied before a line is written

use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde_json::{Map, Value};

use crate::schema::{is_empty_value, RESERVED_DATA_KEYS};

/// Characters left as-is in file URIs: unreserved plus `/` and `:`.
const URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/')
    .remove(b':');

static NON_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[^a-z0-9_]+").unwrap_or_else(|e| panic!("source name pattern: {}", e))
});

const PERSON_LISTS: [&str; 2] = ["author", "data_contributor"];
const PERSON_DICTS: [&str; 1] = ["data_contact"];

/// Lowercases and collapses every run of non `[a-z0-9_]` characters to `_`.
pub fn normalize_source_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    NON_NAME_CHARS
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Percent-encodes a file URI, keeping its scheme and path separators.
pub fn escape_uri(uri: &str) -> String {
    utf8_percent_encode(uri, URI_ESCAPE).to_string()
}

/// Removes fields whose value is empty.
pub fn drop_empty_fields(mdf: &mut Map<String, Value>) {
    mdf.retain(|_, value| !is_empty_value(value));
}

/// Derives `full_name` from `given_name` and `family_name` on every person
/// entry that lacks one.
pub fn add_full_names(mdf: &mut Map<String, Value>) {
    for key in PERSON_LISTS {
        if let Some(Value::Array(people)) = mdf.get_mut(key) {
            for person in people.iter_mut() {
                if let Value::Object(person) = person {
                    add_full_name(person);
                }
            }
        }
    }
    for key in PERSON_DICTS {
        if let Some(Value::Object(person)) = mdf.get_mut(key) {
            add_full_name(person);
        }
    }
}

fn add_full_name(person: &mut Map<String, Value>) {
    if person.get("full_name").is_some_and(|v| !is_empty_value(v)) {
        return;
    }
    let part = |key: &str| {
        person
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };
    let full_name = format!("{} {}", part("given_name"), part("family_name"))
        .trim()
        .to_string();
    if !full_name.is_empty() {
        person.insert("full_name".into(), Value::String(full_name));
    }
}

/// Free-form payload split into the shared `data` block and the
/// source-namespaced block.
#[derive(Debug, Default, PartialEq)]
pub struct NamespacedData {
    pub data: Option<Map<String, Value>>,
    pub source_block: Option<Map<String, Value>>,
}

/// Splits a pruned `data` block. Reserved keys stay under `data` (file URIs
/// escaped); everything else moves under the source name.
pub fn namespace_data(pruned: Option<Map<String, Value>>) -> NamespacedData {
    let Some(pruned) = pruned else {
        return NamespacedData::default();
    };

    let mut data = Map::new();
    let mut source_block = Map::new();

    for (key, value) in pruned {
        if !RESERVED_DATA_KEYS.contains(&key.as_str()) {
            source_block.insert(key, value);
            continue;
        }
        let value = match (key.as_str(), value) {
            ("files", Value::Object(files)) => Value::Object(
                files
                    .into_iter()
                    .map(|(file_type, uri)| {
                        let escaped = match uri {
                            Value::String(uri) => Value::String(escape_uri(&uri)),
                            other => other,
                        };
                        (file_type, escaped)
                    })
                    .collect(),
            ),
            (_, value) => value,
        };
        if !is_empty_value(&value) {
            data.insert(key, value);
        }
    }

    NamespacedData {
        data: (!data.is_empty()).then_some(data),
        source_block: (!source_block.is_empty()).then_some(source_block),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_source_name() {
        assert_eq!(normalize_source_name("OQMD"), "oqmd");
        assert_eq!(normalize_source_name(" Ab-Initio  Set v2 "), "ab_initio_set_v2");
        assert_eq!(normalize_source_name("nist_xps"), "nist_xps");
        assert_eq!(normalize_source_name("--x--"), "x");
    }

    #[test]
    fn test_escape_uri() {
        assert_eq!(
            escape_uri("globus://endpoint/data/file name.cif"),
            "globus://endpoint/data/file%20name.cif"
        );
        assert_eq!(
            escape_uri("https://host/a?b=c"),
            "https://host/a%3Fb%3Dc"
        );
    }

    #[test]
    fn test_full_names_derived() {
        let mut mdf = map(json!({
            "author": [
                {"given_name": "Ada", "family_name": "Lovelace"},
                {"given_name": "X", "family_name": "Y", "full_name": "Kept"}
            ],
            "data_contact": {"family_name": "Curie"}
        }));

        add_full_names(&mut mdf);

        assert_eq!(mdf["author"][0]["full_name"], "Ada Lovelace");
        assert_eq!(mdf["author"][1]["full_name"], "Kept");
        assert_eq!(mdf["data_contact"]["full_name"], "Curie");
    }

    #[test]
    fn test_drop_empty_fields() {
        let mut mdf = map(json!({"title": "t", "license": "", "tags": []}));
        drop_empty_fields(&mut mdf);
        assert_eq!(Value::Object(mdf), json!({"title": "t"}));
    }

    #[test]
    fn test_namespace_data_splits_reserved_keys() {
        let pruned = map(json!({
            "raw": "a b c",
            "files": {"cif": "globus://ep/x y.cif"},
            "band_gap": 1.2
        }));

        let split = namespace_data(Some(pruned));

        assert_eq!(
            split.data.map(Value::Object),
            Some(json!({"raw": "a b c", "files": {"cif": "globus://ep/x%20y.cif"}}))
        );
        assert_eq!(split.source_block.map(Value::Object), Some(json!({"band_gap": 1.2})));
    }

    #[test]
    fn test_namespace_nothing() {
        assert_eq!(namespace_data(None), NamespacedData::default());
        assert_eq!(namespace_data(Some(Map::new())), NamespacedData::default());
    }
}
