//! Filter evaluation
//!
//! Filters are conjunctions of equality conditions with document-store
//! semantics: a scalar condition on an array field matches when any element
//! of the array equals it.

use crate::storage::document::{Document, Value};
use std::cmp::Ordering;

/// A conjunction of equality conditions, optionally pinned to one document ID
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    id: Option<String>,
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching the document with the given ID
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            conditions: Vec::new(),
        }
    }

    /// A filter matching documents whose `field` equals (or contains) `value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    /// Add another equality condition
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }
}

/// Evaluate a filter against a document, including the ID condition
pub fn evaluate(filter: &Filter, doc: &Document) -> bool {
    if let Some(id) = filter.id() {
        if doc.id != id {
            return false;
        }
    }
    matches_fields(filter, doc)
}

/// Evaluate only the field conditions of a filter
///
/// Backends that resolve the ID condition themselves (by direct lookup)
/// use this for the remainder.
pub fn matches_fields(filter: &Filter, doc: &Document) -> bool {
    filter
        .conditions()
        .iter()
        .all(|(field, expected)| field_matches(doc.get(field), expected))
}

fn field_matches(stored: Option<&Value>, expected: &Value) -> bool {
    match (stored, expected) {
        (None, _) => expected.is_null(),
        (Some(stored @ Value::Array(_)), Value::Array(_)) => values_equal(stored, expected),
        (Some(Value::Array(items)), _) => items.iter().any(|item| values_equal(item, expected)),
        (Some(value), _) => values_equal(value, expected),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => a == b,
    }
}

/// Order two optional field values; missing values sort first
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Int(a)), Some(Value::Int(b))) => a.cmp(b),
        (Some(Value::Float(a)), Some(Value::Float(b))) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Some(Value::Int(a)), Some(Value::Float(b))) => {
            (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Float(a)), Some(Value::Int(b))) => {
            a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc() -> Document {
        let mut doc = Document::new("p-1");
        doc.set("name", "Mary");
        doc.set("age", 31i64);
        doc.set(
            "favoriteFoods",
            vec!["burrito".to_string(), "tacos".to_string()],
        );
        doc
    }

    #[test]
    fn test_scalar_equality() {
        let doc = make_doc();
        assert!(evaluate(&Filter::eq("name", "Mary"), &doc));
        assert!(!evaluate(&Filter::eq("name", "mary"), &doc));
        assert!(evaluate(&Filter::eq("age", 31i64), &doc));
    }

    #[test]
    fn test_array_membership() {
        let doc = make_doc();
        assert!(evaluate(&Filter::eq("favoriteFoods", "tacos"), &doc));
        assert!(!evaluate(&Filter::eq("favoriteFoods", "sushi"), &doc));
    }

    #[test]
    fn test_whole_array_equality() {
        let doc = make_doc();
        let exact = vec!["burrito".to_string(), "tacos".to_string()];
        let reordered = vec!["tacos".to_string(), "burrito".to_string()];
        assert!(evaluate(&Filter::eq("favoriteFoods", exact), &doc));
        assert!(!evaluate(&Filter::eq("favoriteFoods", reordered), &doc));
    }

    #[test]
    fn test_conjunction_and_id() {
        let doc = make_doc();
        let filter = Filter::eq("name", "Mary").and_eq("favoriteFoods", "burrito");
        assert!(evaluate(&filter, &doc));

        assert!(evaluate(&Filter::by_id("p-1"), &doc));
        assert!(!evaluate(&Filter::by_id("p-2"), &doc));
        assert!(evaluate(&Filter::all(), &doc));
    }

    #[test]
    fn test_missing_field_matches_null_only() {
        let doc = make_doc();
        assert!(evaluate(&Filter::eq("nickname", Value::Null), &doc));
        assert!(!evaluate(&Filter::eq("nickname", "M"), &doc));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(Some(&Value::from("Ann")), Some(&Value::from("Bob"))),
            Ordering::Less
        );
        assert_eq!(compare_values(None, Some(&Value::Int(1))), Ordering::Less);
        assert_eq!(
            compare_values(Some(&Value::Int(2)), Some(&Value::Float(1.5))),
            Ordering::Greater
        );
    }
}
