//! Field rule definitions
//!
//! A rule set maps field names of the `mdf` block to a [`FieldRule`]:
//! whether the field is required, and which shape it must have.
//!
//! Rule files use the same shape as the serialized types:
//!
//! ```json
//! {
//!   "resource_type": "record",
//!   "fields": {
//!     "subject": { "type": "string", "required": true },
//!     "tags": { "type": "list", "contains": "string" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The two kinds of document the pipeline emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Dataset,
    Record,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Dataset => "dataset",
            ResourceType::Record => "record",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Element type for list and dict contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    String,
    Int,
    List,
    Dict,
}

impl ElementKind {
    /// Returns the type name for violation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::String => "string",
            ElementKind::Int => "int",
            ElementKind::List => "list",
            ElementKind::Dict => "dict",
        }
    }

    /// Checks a single value against this element type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ElementKind::String => value.is_string(),
            ElementKind::Int => value.is_i64() || value.is_u64(),
            ElementKind::List => value.is_array(),
            ElementKind::Dict => value.is_object(),
        }
    }
}

/// Shape of a field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Int,
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contains: Option<ElementKind>,
    },
    Dict {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contains: Option<ElementKind>,
    },
}

impl FieldKind {
    /// Returns the type name for violation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::List { .. } => "list",
            FieldKind::Dict { .. } => "dict",
        }
    }
}

/// Requirement rule for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl FieldRule {
    pub fn required_string() -> Self {
        Self {
            kind: FieldKind::String,
            required: true,
        }
    }

    pub fn optional_string() -> Self {
        Self {
            kind: FieldKind::String,
            required: false,
        }
    }

    pub fn optional_int() -> Self {
        Self {
            kind: FieldKind::Int,
            required: false,
        }
    }

    pub fn required_list(contains: ElementKind) -> Self {
        Self {
            kind: FieldKind::List {
                contains: Some(contains),
            },
            required: true,
        }
    }

    pub fn optional_list(contains: ElementKind) -> Self {
        Self {
            kind: FieldKind::List {
                contains: Some(contains),
            },
            required: false,
        }
    }

    pub fn optional_dict(contains: Option<ElementKind>) -> Self {
        Self {
            kind: FieldKind::Dict { contains },
            required: false,
        }
    }
}

/// Rule set for one resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: BTreeMap<String, FieldRule>,
}

impl ResourceSchema {
    pub fn new(resource_type: ResourceType, fields: BTreeMap<String, FieldRule>) -> Self {
        Self {
            resource_type,
            description: None,
            fields,
        }
    }

    /// Built-in dataset rules
    pub fn default_dataset() -> Self {
        let mut fields = shared_fields();
        fields.insert("source_name".into(), FieldRule::required_string());
        fields.insert("acl".into(), FieldRule::required_list(ElementKind::String));
        fields.insert("data_contact".into(), FieldRule::optional_dict(None));
        fields.insert(
            "data_contributor".into(),
            FieldRule::optional_list(ElementKind::Dict),
        );

        let mut schema = Self::new(ResourceType::Dataset, fields);
        schema.description = Some("Top-level dataset metadata".into());
        schema
    }

    /// Built-in record rules
    pub fn default_record() -> Self {
        let mut fields = shared_fields();
        fields.insert("subject".into(), FieldRule::required_string());
        fields.insert("acl".into(), FieldRule::optional_list(ElementKind::String));
        fields.insert("composition".into(), FieldRule::optional_string());

        let mut schema = Self::new(ResourceType::Record, fields);
        schema.description = Some("Record belonging to one dataset".into());
        schema
    }

    /// Returns the built-in rules for a resource type
    pub fn builtin(resource_type: ResourceType) -> Self {
        match resource_type {
            ResourceType::Dataset => Self::default_dataset(),
            ResourceType::Record => Self::default_record(),
        }
    }

    /// Validates the rule set itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        let key_field = match self.resource_type {
            ResourceType::Dataset => "source_name",
            ResourceType::Record => "subject",
        };

        match self.fields.get(key_field) {
            None => Err(format!(
                "{} schema must define a '{}' field",
                self.resource_type, key_field
            )),
            Some(rule) if !rule.required || rule.kind != FieldKind::String => Err(format!(
                "'{}' must be a required string field",
                key_field
            )),
            Some(_) => Ok(()),
        }
    }

    /// Wraps singular values in a one-element list wherever the rules
    /// expect a list.
    pub fn coerce_lists(&self, mdf: &mut Map<String, Value>) {
        for (name, rule) in &self.fields {
            if !matches!(rule.kind, FieldKind::List { .. }) {
                continue;
            }
            if let Some(value) = mdf.get_mut(name) {
                let singular = match value {
                    Value::Array(_) | Value::Null => false,
                    Value::String(s) => !s.is_empty(),
                    _ => true,
                };
                if singular {
                    let inner = value.take();
                    *value = Value::Array(vec![inner]);
                }
            }
        }
    }
}

fn shared_fields() -> BTreeMap<String, FieldRule> {
    let mut fields = BTreeMap::new();
    fields.insert("title".into(), FieldRule::required_string());
    fields.insert("citation".into(), FieldRule::optional_list(ElementKind::String));
    fields.insert("license".into(), FieldRule::optional_string());
    fields.insert("collection".into(), FieldRule::optional_string());
    fields.insert("data_class".into(), FieldRule::optional_string());
    fields.insert("description".into(), FieldRule::optional_string());
    fields.insert("year".into(), FieldRule::optional_int());
    fields.insert("tags".into(), FieldRule::optional_list(ElementKind::String));
    fields.insert("author".into(), FieldRule::optional_list(ElementKind::Dict));
    fields.insert("links".into(), FieldRule::optional_dict(Some(ElementKind::String)));
    fields
}
