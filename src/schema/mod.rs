//! Schema definitions and validation for people-db
//!
//! Schemas define the structure of a collection's documents:
//! - Field definitions with types
//! - Required vs optional fields
//! - Default values
//!
//! Casting a document through its schema drops undeclared fields, fills
//! defaults and checks presence and type. Nothing else is validated.

use crate::storage::document::{Fields, Value};
use crate::query::Update;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field type in the schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Array(Box<FieldType>),
    Object,
}

impl FieldType {
    /// Check a non-null value against this type
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Int, Value::Int(_)) => true,
            (FieldType::Float, Value::Float(_) | Value::Int(_)) => true,
            (FieldType::Bool, Value::Bool(_)) => true,
            (FieldType::Object, Value::Object(_)) => true,
            (FieldType::Array(inner), Value::Array(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            _ => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::Object => "object".to_string(),
            FieldType::Array(inner) => format!("array of {}", inner.describe()),
        }
    }
}

/// Definition of a single field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether the field is required
    #[serde(default)]
    pub required: bool,
    /// Value stored when the field is absent
    #[serde(default)]
    pub default: Option<Value>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

/// Schema for a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Collection name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Field definitions
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
}

impl Schema {
    /// Create a new schema for a collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field definition
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Validate document fields against this schema
    ///
    /// A required string field must also be non-empty.
    pub fn validate(&self, fields: &Fields) -> Result<(), ValidationError> {
        for (field_name, field_def) in &self.fields {
            match fields.get(field_name) {
                None | Some(Value::Null) => {
                    if field_def.required {
                        return Err(self.missing(field_name));
                    }
                }
                Some(value) => self.check_value(field_name, field_def, value)?,
            }
        }
        Ok(())
    }

    /// Prepare fields for storage: drop undeclared fields, apply defaults, validate
    pub fn cast(&self, fields: Fields) -> Result<Fields, ValidationError> {
        let mut cast: Fields = fields
            .into_iter()
            .filter(|(k, _)| self.fields.contains_key(k))
            .collect();

        for (field_name, field_def) in &self.fields {
            if let Some(default) = &field_def.default {
                cast.entry(field_name.clone()).or_insert_with(|| default.clone());
            }
        }

        self.validate(&cast)?;
        Ok(cast)
    }

    /// Validate the fields an update sets, dropping undeclared ones
    pub fn cast_update(&self, update: &Update) -> Result<Update, ValidationError> {
        let mut cast = Update::default();
        for (field_name, value) in update.fields() {
            let Some(field_def) = self.fields.get(field_name) else {
                continue;
            };
            if value.is_null() {
                if field_def.required {
                    return Err(self.missing(field_name));
                }
            } else {
                self.check_value(field_name, field_def, value)?;
            }
            cast = cast.and_set(field_name.clone(), value.clone());
        }
        Ok(cast)
    }

    fn check_value(
        &self,
        field_name: &str,
        field_def: &FieldDef,
        value: &Value,
    ) -> Result<(), ValidationError> {
        if !field_def.field_type.accepts(value) {
            return Err(ValidationError::TypeMismatch {
                field: field_name.to_string(),
                expected: field_def.field_type.describe(),
                actual: value.type_name().to_string(),
            });
        }
        if field_def.required && value.as_str().is_some_and(str::is_empty) {
            return Err(self.missing(field_name));
        }
        Ok(())
    }

    fn missing(&self, field_name: &str) -> ValidationError {
        ValidationError::MissingRequired {
            collection: self.name.clone(),
            field: field_name.to_string(),
        }
    }
}

/// Validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingRequired { collection: String, field: String },
    #[error("Invalid type for field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}
