//! Schema registry
//!
//! Holds one rule set per resource type. Rule sets come from the built-ins
//! or from `schema_<resource>.json` files in a schema directory; files take
//! precedence and any resource type without a file falls back to the
//! built-in rules.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::{ResourceSchema, ResourceType};

/// In-memory registry of rule sets, keyed by resource type.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<ResourceType, ResourceSchema>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in dataset and record rules.
    pub fn with_defaults() -> Self {
        let mut schemas = HashMap::new();
        for resource_type in [ResourceType::Dataset, ResourceType::Record] {
            schemas.insert(resource_type, ResourceSchema::builtin(resource_type));
        }
        Self { schemas }
    }

    /// Loads rule files from `schema_dir`, filling gaps with the built-ins.
    ///
    /// A missing directory is not an error: the registry is then identical
    /// to [`SchemaRegistry::with_defaults`].
    pub fn load_dir(schema_dir: &Path) -> SchemaResult<Self> {
        let mut registry = Self::empty();

        if schema_dir.exists() {
            for resource_type in [ResourceType::Dataset, ResourceType::Record] {
                let path = schema_dir.join(format!("schema_{}.json", resource_type));
                if path.exists() {
                    let schema = Self::load_schema_file(&path)?;
                    if schema.resource_type != resource_type {
                        return Err(SchemaError::malformed_schema(
                            path.display().to_string(),
                            format!(
                                "file declares resource type '{}', expected '{}'",
                                schema.resource_type, resource_type
                            ),
                        ));
                    }
                    registry.register(schema)?;
                }
            }
        }

        for resource_type in [ResourceType::Dataset, ResourceType::Record] {
            registry
                .schemas
                .entry(resource_type)
                .or_insert_with(|| ResourceSchema::builtin(resource_type));
        }

        Ok(registry)
    }

    fn load_schema_file(path: &Path) -> SchemaResult<ResourceSchema> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let schema: ResourceSchema = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_schema(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(path.display().to_string(), e))?;

        Ok(schema)
    }

    /// Registers a rule set. An already-registered resource type is never
    /// replaced.
    pub fn register(&mut self, schema: ResourceSchema) -> SchemaResult<()> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema("<in-memory>", e))?;

        if self.schemas.contains_key(&schema.resource_type) {
            return Err(SchemaError::schema_immutable(schema.resource_type));
        }

        self.schemas.insert(schema.resource_type, schema);
        Ok(())
    }

    /// Gets the rule set for a resource type.
    pub fn get(&self, resource_type: ResourceType) -> SchemaResult<&ResourceSchema> {
        self.schemas
            .get(&resource_type)
            .ok_or_else(|| SchemaError::unknown_resource(resource_type))
    }

    /// Returns the number of registered rule sets.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
