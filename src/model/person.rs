//! The Person record
//!
//! Persisted shape:
//!
//! ```yaml
//! name: Sarav Austin        # required, non-empty
//! age: 27                   # optional
//! favoriteFoods:            # ordered, duplicates allowed, defaults to []
//!   - Pizza
//!   - Burgers
//! ```

use crate::schema::{FieldDef, FieldType, Schema};
use crate::storage::document::{Document, Fields, Value};
use crate::Error;
use serde::{Deserialize, Serialize};

pub const NAME: &str = "name";
pub const AGE: &str = "age";
pub const FAVORITE_FOODS: &str = "favoriteFoods";

/// A persisted person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

/// A person that has not been stored yet
///
/// Every field defaults, so a record deserialized without a `name` reaches
/// schema validation and is rejected there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPerson {
    pub name: String,
    pub age: Option<i64>,
    pub favorite_foods: Vec<String>,
}

/// A person as returned by projections that hide `age`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

impl Person {
    /// The record-type definition for people
    pub fn schema() -> Schema {
        Schema::new("people")
            .field(
                NAME,
                FieldDef {
                    field_type: FieldType::String,
                    required: true,
                    ..Default::default()
                },
            )
            .field(
                AGE,
                FieldDef {
                    field_type: FieldType::Int,
                    ..Default::default()
                },
            )
            .field(
                FAVORITE_FOODS,
                FieldDef {
                    field_type: FieldType::Array(Box::new(FieldType::String)),
                    default: Some(Value::Array(Vec::new())),
                    ..Default::default()
                },
            )
    }

    /// Fields as they are stored, without the ID
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(NAME.to_string(), Value::from(self.name.clone()));
        if let Some(age) = self.age {
            fields.insert(AGE.to_string(), Value::Int(age));
        }
        fields.insert(
            FAVORITE_FOODS.to_string(),
            Value::from(self.favorite_foods.clone()),
        );
        fields
    }
}

impl NewPerson {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn favorite_foods<I, S>(mut self, foods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favorite_foods = foods.into_iter().map(Into::into).collect();
        self
    }

    /// Fields to insert; an empty name is left out so the schema reports it missing
    pub fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        if !self.name.is_empty() {
            fields.insert(NAME.to_string(), Value::String(self.name));
        }
        if let Some(age) = self.age {
            fields.insert(AGE.to_string(), Value::Int(age));
        }
        fields.insert(FAVORITE_FOODS.to_string(), Value::from(self.favorite_foods));
        fields
    }
}

impl From<&Person> for Document {
    fn from(person: &Person) -> Self {
        Document::with_fields(person.id.clone(), person.to_fields())
    }
}

impl TryFrom<Document> for Person {
    type Error = Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        Ok(Person {
            name: read_name(&doc)?,
            age: read_age(&doc)?,
            favorite_foods: read_foods(&doc)?,
            id: doc.id,
        })
    }
}

impl TryFrom<Document> for PersonSummary {
    type Error = Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        Ok(PersonSummary {
            name: read_name(&doc)?,
            favorite_foods: read_foods(&doc)?,
            id: doc.id,
        })
    }
}

fn corrupt(doc: &Document, message: impl Into<String>) -> Error {
    Error::CorruptDocument {
        id: doc.id.clone(),
        message: message.into(),
    }
}

fn read_name(doc: &Document) -> Result<String, Error> {
    doc.get(NAME)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| corrupt(doc, "name is missing or not a string"))
}

fn read_age(doc: &Document) -> Result<Option<i64>, Error> {
    match doc.get(AGE) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int(age)) => Ok(Some(*age)),
        Some(Value::Float(age)) if age.fract() == 0.0 => Ok(Some(*age as i64)),
        Some(other) => Err(corrupt(doc, format!("age is a {}", other.type_name()))),
    }
}

fn read_foods(doc: &Document) -> Result<Vec<String>, Error> {
    match doc.get(FAVORITE_FOODS) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| corrupt(doc, "favoriteFoods holds a non-string"))
            })
            .collect(),
        Some(other) => Err(corrupt(
            doc,
            format!("favoriteFoods is a {}", other.type_name()),
        )),
    }
}
