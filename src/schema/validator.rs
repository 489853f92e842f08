//! Document validation against a registered rule set
//!
//! A document is a JSON object with at most three top-level blocks:
//! - `mdf` (required dict): checked field by field against the rules
//! - `dc` (optional dict): passed through untouched
//! - `data` (optional dict): free-form payload, pruned by size limits
//!
//! Empty strings, lists and dicts count as absent. Validation never mutates
//! the input and produces the same report for the same document.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::SchemaResult;
use super::loader::SchemaRegistry;
use super::types::{ElementKind, FieldKind, FieldRule, ResourceType};
use super::user_data::{prune_user_data, PayloadLimits};

/// Keys of the `data` block that bypass payload pruning
pub const RESERVED_DATA_KEYS: [&str; 2] = ["raw", "files"];

/// Top-level keys a document may carry besides the source-named block
pub const TOP_LEVEL_KEYS: [&str; 3] = ["mdf", "dc", "data"];

/// Why a field failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Required field absent or empty
    Missing,
    /// Present with the wrong shape
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
    /// A list element or dict value is empty
    EmptyElement,
    /// A list element or dict value has the wrong type
    WrongElementType {
        expected: &'static str,
        actual: &'static str,
    },
    /// Field not declared for this resource type
    Unknown,
    /// Payload limit exceeded while strict mode is active
    PayloadLimit { detail: String },
    /// Value collides with a reserved top-level key
    ReservedName { value: String },
}

/// One invalid field with its dotted path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    #[serde(flatten)]
    pub violation: Violation,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, violation: Violation) -> Self {
        Self {
            field: field.into(),
            violation,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.violation {
            Violation::Missing => write!(f, "{}: required field missing or empty", self.field),
            Violation::WrongType { expected, actual } => {
                write!(f, "{}: expected {}, got {}", self.field, expected, actual)
            }
            Violation::EmptyElement => write!(f, "{}: elements must not be empty", self.field),
            Violation::WrongElementType { expected, actual } => write!(
                f,
                "{}: elements must be {}, got {}",
                self.field, expected, actual
            ),
            Violation::Unknown => write!(f, "{}: unknown field", self.field),
            Violation::PayloadLimit { detail } => write!(f, "{}", detail),
            Violation::ReservedName { value } => {
                write!(f, "{}: '{}' is a reserved key", self.field, value)
            }
        }
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub success: bool,
    pub invalid_fields: Vec<FieldViolation>,
    pub warnings: Vec<String>,
    /// The `data` block after pruning; reserved keys are kept as given
    #[serde(skip)]
    pub pruned_data: Option<Map<String, Value>>,
}

/// Checks documents against the rules held by a [`SchemaRegistry`].
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
    limits: PayloadLimits,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            limits: PayloadLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: PayloadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates `document` as a `resource_type`.
    ///
    /// With `strict`, payload warnings are promoted to invalid fields.
    ///
    /// # Errors
    ///
    /// Only fails when no rule set is registered for `resource_type`;
    /// document problems are reported in the returned [`ValidationReport`].
    pub fn validate(
        &self,
        document: &Value,
        resource_type: ResourceType,
        strict: bool,
    ) -> SchemaResult<ValidationReport> {
        let schema = self.registry.get(resource_type)?;
        let mut invalid_fields = Vec::new();
        let mut warnings = Vec::new();
        let mut pruned_data = None;

        let Some(doc) = document.as_object() else {
            invalid_fields.push(FieldViolation::new(
                "$root",
                Violation::WrongType {
                    expected: "dict",
                    actual: json_type_name(document),
                },
            ));
            return Ok(finish(invalid_fields, warnings, None, strict));
        };

        for key in doc.keys() {
            if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
                invalid_fields.push(FieldViolation::new(key.as_str(), Violation::Unknown));
            }
        }

        match doc.get("mdf") {
            Some(Value::Object(mdf)) => {
                for (name, rule) in &schema.fields {
                    check_field(mdf.get(name), rule, &format!("mdf.{}", name), &mut invalid_fields);
                }
                for key in mdf.keys() {
                    if !schema.fields.contains_key(key) {
                        invalid_fields.push(FieldViolation::new(
                            format!("mdf.{}", key),
                            Violation::Unknown,
                        ));
                    }
                }
            }
            Some(other) if !is_empty_value(other) => {
                invalid_fields.push(FieldViolation::new(
                    "mdf",
                    Violation::WrongType {
                        expected: "dict",
                        actual: json_type_name(other),
                    },
                ));
            }
            _ => invalid_fields.push(FieldViolation::new("mdf", Violation::Missing)),
        }

        if let Some(dc) = doc.get("dc") {
            if !dc.is_object() {
                invalid_fields.push(FieldViolation::new(
                    "dc",
                    Violation::WrongType {
                        expected: "dict",
                        actual: json_type_name(dc),
                    },
                ));
            }
        }

        match doc.get("data") {
            None => {}
            Some(Value::Object(data)) => {
                pruned_data = Some(self.check_data(data, &mut invalid_fields, &mut warnings));
            }
            Some(other) => invalid_fields.push(FieldViolation::new(
                "data",
                Violation::WrongType {
                    expected: "dict",
                    actual: json_type_name(other),
                },
            )),
        }

        Ok(finish(invalid_fields, warnings, pruned_data, strict))
    }

    fn check_data(
        &self,
        data: &Map<String, Value>,
        invalid_fields: &mut Vec<FieldViolation>,
        warnings: &mut Vec<String>,
    ) -> Map<String, Value> {
        let mut kept = Map::new();
        let mut free_form = Map::new();

        for (key, value) in data {
            match key.as_str() {
                "raw" => {
                    check_field(Some(value), &FieldRule::optional_string(), "data.raw", invalid_fields);
                    kept.insert(key.clone(), value.clone());
                }
                "files" => {
                    check_field(
                        Some(value),
                        &FieldRule::optional_dict(Some(ElementKind::String)),
                        "data.files",
                        invalid_fields,
                    );
                    kept.insert(key.clone(), value.clone());
                }
                _ => {
                    free_form.insert(key.clone(), value.clone());
                }
            }
        }

        if !free_form.is_empty() {
            let pruned = prune_user_data(&Value::Object(free_form), self.limits);
            warnings.extend(pruned.warnings);
            if let Some(Value::Object(map)) = pruned.value {
                kept.extend(map);
            }
        }

        kept
    }
}

fn finish(
    mut invalid_fields: Vec<FieldViolation>,
    mut warnings: Vec<String>,
    pruned_data: Option<Map<String, Value>>,
    strict: bool,
) -> ValidationReport {
    if strict {
        invalid_fields.extend(warnings.drain(..).map(|detail| {
            FieldViolation::new("data", Violation::PayloadLimit { detail })
        }));
    }

    ValidationReport {
        success: invalid_fields.is_empty(),
        invalid_fields,
        warnings,
        pruned_data,
    }
}

fn check_field(value: Option<&Value>, rule: &FieldRule, path: &str, out: &mut Vec<FieldViolation>) {
    let value = match value {
        Some(v) if !is_empty_value(v) => v,
        _ => {
            if rule.required {
                out.push(FieldViolation::new(path, Violation::Missing));
            }
            return;
        }
    };

    let wrong_type = || {
        FieldViolation::new(
            path,
            Violation::WrongType {
                expected: rule.kind.type_name(),
                actual: json_type_name(value),
            },
        )
    };

    match &rule.kind {
        FieldKind::String => {
            if !value.is_string() {
                out.push(wrong_type());
            }
        }
        FieldKind::Int => {
            if !value.is_i64() && !value.is_u64() {
                out.push(wrong_type());
            }
        }
        FieldKind::List { contains } => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_element(item, *contains, &format!("{}[{}]", path, i), out);
                }
            }
            None => out.push(wrong_type()),
        },
        FieldKind::Dict { contains } => match value.as_object() {
            Some(map) => {
                for (key, item) in map {
                    check_element(item, *contains, &format!("{}.{}", path, key), out);
                }
            }
            None => out.push(wrong_type()),
        },
    }
}

fn check_element(
    item: &Value,
    contains: Option<ElementKind>,
    path: &str,
    out: &mut Vec<FieldViolation>,
) {
    if is_empty_value(item) {
        out.push(FieldViolation::new(path, Violation::EmptyElement));
        return;
    }
    if let Some(kind) = contains {
        if !kind.matches(item) {
            out.push(FieldViolation::new(
                path,
                Violation::WrongElementType {
                    expected: kind.type_name(),
                    actual: json_type_name(item),
                },
            ));
        }
    }
}

/// Null, `""`, `[]` and `{}` are treated as absent.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Returns the JSON type name for violation messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(mdf: Value) -> Value {
        json!({ "mdf": mdf })
    }

    fn valid_record() -> Value {
        record(json!({
            "subject": "https://example.org/rec/1",
            "title": "Bi2S3 sample",
            "composition": "Bi2S3",
            "tags": ["chalcogenide"]
        }))
    }

    fn fields(report: &ValidationReport) -> Vec<&str> {
        report.invalid_fields.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_valid_record_passes() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let report = validator
            .validate(&valid_record(), ResourceType::Record, false)
            .unwrap();
        assert!(report.success, "{:?}", report.invalid_fields);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_title_same_as_missing() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let empty = record(json!({"subject": "s", "title": ""}));
        let missing = record(json!({"subject": "s"}));

        let a = validator.validate(&empty, ResourceType::Record, false).unwrap();
        let b = validator.validate(&missing, ResourceType::Record, false).unwrap();
        assert!(!a.success);
        assert_eq!(a.invalid_fields, b.invalid_fields);
        assert_eq!(a.invalid_fields[0].violation, Violation::Missing);
    }

    #[test]
    fn test_wrong_type_reported() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let doc = record(json!({"subject": "s", "title": "t", "year": "2017"}));
        let report = validator.validate(&doc, ResourceType::Record, false).unwrap();

        assert_eq!(fields(&report), vec!["mdf.year"]);
        assert_eq!(
            report.invalid_fields[0].violation,
            Violation::WrongType {
                expected: "int",
                actual: "string"
            }
        );
    }

    #[test]
    fn test_list_elements_checked() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let doc = record(json!({"subject": "s", "title": "t", "tags": ["ok", "", 3]}));
        let report = validator.validate(&doc, ResourceType::Record, false).unwrap();

        assert_eq!(fields(&report), vec!["mdf.tags[1]", "mdf.tags[2]"]);
        assert_eq!(report.invalid_fields[0].violation, Violation::EmptyElement);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({
            "mdf": {"subject": "s", "title": "t", "scroll_id": 4},
            "extra": {}
        });
        let report = validator.validate(&doc, ResourceType::Record, false).unwrap();

        assert!(fields(&report).contains(&"extra"));
        assert!(fields(&report).contains(&"mdf.scroll_id"));
    }

    #[test]
    fn test_non_object_document() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let report = validator.validate(&json!([1]), ResourceType::Record, false).unwrap();
        assert_eq!(fields(&report), vec!["$root"]);
    }

    #[test]
    fn test_payload_warning_and_strict_promotion() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let mut doc = valid_record();
        doc["data"] = json!({"raw": "line", "values": [1, 2, 3, 4, 5, 6], "n": 1});

        let lenient = validator.validate(&doc, ResourceType::Record, false).unwrap();
        assert!(lenient.success);
        assert_eq!(lenient.warnings.len(), 1);
        let data = lenient.pruned_data.unwrap();
        assert_eq!(data.get("raw"), Some(&json!("line")));
        assert_eq!(data.get("n"), Some(&json!(1)));
        assert!(data.get("values").is_none());

        let strict = validator.validate(&doc, ResourceType::Record, true).unwrap();
        assert!(!strict.success);
        assert!(strict.warnings.is_empty());
        assert!(matches!(
            strict.invalid_fields[0].violation,
            Violation::PayloadLimit { .. }
        ));
    }

    #[test]
    fn test_files_values_must_be_strings() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let mut doc = valid_record();
        doc["data"] = json!({"files": {"cif": 12}});
        let report = validator.validate(&doc, ResourceType::Record, false).unwrap();

        assert_eq!(fields(&report), vec!["data.files.cif"]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let registry = SchemaRegistry::with_defaults();
        let validator = SchemaValidator::new(&registry);

        let doc = json!({"mdf": {"title": 5, "bogus": true}, "dc": "x"});
        let first = validator.validate(&doc, ResourceType::Dataset, false).unwrap();
        let second = validator.validate(&doc, ResourceType::Dataset, false).unwrap();
        assert_eq!(first.invalid_fields, second.invalid_fields);
        assert!(!first.success);
    }
}
