//! YAML document encoding for the file backend
//!
//! Each document file is a YAML mapping of its fields:
//!
//! ```yaml
//! age: 27
//! favoriteFoods:
//! - Pizza
//! - Burgers
//! name: Sarav Austin
//! ```
//!
//! The document ID is the file name and is not repeated inside the file.

use super::document::{Fields, Value};
use crate::{Error, Result};

/// Parse document fields from YAML content
pub fn parse(content: &str) -> Result<Fields> {
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(content)?;
    yaml_to_fields(yaml_value)
}

/// Render document fields to YAML content
pub fn render(fields: &Fields) -> Result<String> {
    let yaml_map: serde_yaml::Mapping = fields
        .iter()
        .map(|(k, v)| (serde_yaml::Value::String(k.clone()), value_to_yaml(v)))
        .collect();

    serde_yaml::to_string(&serde_yaml::Value::Mapping(yaml_map)).map_err(|e| {
        Error::YamlSerializeError {
            message: e.to_string(),
        }
    })
}

fn yaml_to_fields(value: serde_yaml::Value) -> Result<Fields> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            let mut fields = Fields::new();
            for (k, v) in map {
                let key = k
                    .as_str()
                    .ok_or_else(|| Error::YamlParseError {
                        message: "non-string key in document".to_string(),
                    })?
                    .to_string();
                fields.insert(key, yaml_value_to_value(v));
            }
            Ok(fields)
        }
        serde_yaml::Value::Null => Ok(Fields::new()),
        _ => Err(Error::YamlParseError {
            message: "document must be a YAML mapping".to_string(),
        }),
    }
}

fn yaml_value_to_value(v: serde_yaml::Value) -> Value {
    match v {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Null
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_value_to_value).collect())
        }
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| k.as_str().map(|key| (key.to_string(), yaml_value_to_value(v))))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_value_to_value(tagged.value),
    }
}

fn value_to_yaml(v: &Value) -> serde_yaml::Value {
    match v {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Int(i) => serde_yaml::Value::Number((*i).into()),
        Value::Float(f) => serde_yaml::Value::Number(serde_yaml::Number::from(*f)),
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(arr) => serde_yaml::Value::Sequence(arr.iter().map(value_to_yaml).collect()),
        Value::Object(obj) => serde_yaml::Value::Mapping(
            obj.iter()
                .map(|(k, v)| (serde_yaml::Value::String(k.clone()), value_to_yaml(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let content = r#"
name: Sarav Austin
age: 27
favoriteFoods:
  - Pizza
  - Burgers
"#;

        let fields = parse(content).unwrap();

        assert_eq!(fields.get("name"), Some(&Value::String("Sarav Austin".into())));
        assert_eq!(fields.get("age"), Some(&Value::Int(27)));
        assert_eq!(
            fields.get("favoriteFoods"),
            Some(&Value::Array(vec![
                Value::String("Pizza".into()),
                Value::String("Burgers".into()),
            ]))
        );
    }

    #[test]
    fn test_empty_document() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_rejected() {
        assert!(matches!(parse("- a\n- b\n"), Err(Error::YamlParseError { .. })));
    }

    #[test]
    fn test_render_preserves_array_order() {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::String("Mary".into()));
        fields.insert(
            "favoriteFoods".into(),
            Value::from(vec!["tacos".to_string(), "burrito".to_string(), "tacos".to_string()]),
        );

        let rendered = render(&fields).unwrap();
        let parsed = parse(&rendered).unwrap();

        assert_eq!(parsed, fields);
    }
}
