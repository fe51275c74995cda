//! Declarative output schemas.
//!
//! The same [`OutputSchema`] value is sent with the request (so the service
//! constrains its own output) and walked again on receipt, so the two sides
//! can never disagree about what "required" means.

use serde_json::{Map, Value, json};

/// Shape of a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSchema {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<OutputSchema>),
    Object(Vec<SchemaField>),
}

/// A named property of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub schema: OutputSchema,
    pub required: bool,
}

/// First place where a value departs from its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    /// JSONPath-style location, e.g. `$.milestones[2].advice`.
    pub path: String,
    pub reason: String,
}

impl OutputSchema {
    /// Object whose fields are all required.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, OutputSchema)>,
        K: Into<String>,
    {
        Self::Object(
            fields
                .into_iter()
                .map(|(name, schema)| SchemaField {
                    name: name.into(),
                    schema,
                    required: true,
                })
                .collect(),
        )
    }

    pub fn array(items: OutputSchema) -> Self {
        Self::Array(Box::new(items))
    }

    /// Append a field to an object schema. No-op for other shapes.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        schema: OutputSchema,
        required: bool,
    ) -> Self {
        if let Self::Object(fields) = &mut self {
            fields.push(SchemaField {
                name: name.into(),
                schema,
                required,
            });
        }
        self
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::Array(_) => "ARRAY",
            Self::Object(_) => "OBJECT",
        }
    }

    /// Render in the service's schema dialect (OpenAPI subset, upper-case types).
    pub fn to_json(&self) -> Value {
        match self {
            Self::Array(items) => json!({ "type": self.type_name(), "items": items.to_json() }),
            Self::Object(fields) => {
                let mut properties = Map::new();
                for field in fields {
                    properties.insert(field.name.clone(), field.schema.to_json());
                }
                let required: Vec<&str> = fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| f.name.as_str())
                    .collect();
                let ordering: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                json!({
                    "type": self.type_name(),
                    "properties": properties,
                    "required": required,
                    "propertyOrdering": ordering,
                })
            }
            _ => json!({ "type": self.type_name() }),
        }
    }

    /// Check `value` against this schema. Unknown extra properties are ignored.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaMismatch> {
        self.validate_at("$", value)
    }

    /// Drop object properties this schema does not declare, recursively.
    pub fn prune(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Array(items), Value::Array(values)) => {
                Value::Array(values.into_iter().map(|v| items.prune(v)).collect())
            }
            (Self::Object(fields), Value::Object(mut map)) => {
                let mut pruned = Map::new();
                for field in fields {
                    if let Some(v) = map.remove(&field.name) {
                        pruned.insert(field.name.clone(), field.schema.prune(v));
                    }
                }
                Value::Object(pruned)
            }
            (_, value) => value,
        }
    }

    fn validate_at(&self, path: &str, value: &Value) -> Result<(), SchemaMismatch> {
        let type_ok = match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array(_) => value.is_array(),
            Self::Object(_) => value.is_object(),
        };
        if !type_ok {
            return Err(SchemaMismatch {
                path: path.to_string(),
                reason: format!("expected {}, found {}", self.type_name(), describe(value)),
            });
        }

        match (self, value) {
            (Self::Array(items), Value::Array(values)) => {
                for (i, v) in values.iter().enumerate() {
                    items.validate_at(&format!("{path}[{i}]"), v)?;
                }
            }
            (Self::Object(fields), Value::Object(map)) => {
                for field in fields {
                    let child = format!("{path}.{}", field.name);
                    match map.get(&field.name) {
                        None | Some(Value::Null) if field.required => {
                            return Err(SchemaMismatch {
                                path: child,
                                reason: "required field is missing".to_string(),
                            });
                        }
                        None | Some(Value::Null) => {}
                        Some(v) => field.schema.validate_at(&child, v)?,
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone_schema() -> OutputSchema {
        OutputSchema::object([
            ("headline", OutputSchema::String),
            (
                "items",
                OutputSchema::array(OutputSchema::object([
                    ("label", OutputSchema::String),
                    ("score", OutputSchema::Integer),
                ])),
            ),
        ])
        .with_field("note", OutputSchema::String, false)
    }

    #[test]
    fn renders_service_dialect() {
        let json = milestone_schema().to_json();
        assert_eq!(json["type"], "OBJECT");
        assert_eq!(json["required"], json!(["headline", "items"]));
        assert_eq!(json["propertyOrdering"], json!(["headline", "items", "note"]));
        assert_eq!(json["properties"]["items"]["type"], "ARRAY");
        assert_eq!(json["properties"]["items"]["items"]["properties"]["score"]["type"], "INTEGER");
    }

    #[test]
    fn accepts_conforming_value() {
        let value = json!({
            "headline": "h",
            "items": [{ "label": "a", "score": 3 }],
            "extra": true
        });
        assert!(milestone_schema().validate(&value).is_ok());
    }

    #[test]
    fn optional_field_may_be_absent_but_not_mistyped() {
        let schema = milestone_schema();
        let absent = json!({ "headline": "h", "items": [] });
        assert!(schema.validate(&absent).is_ok());

        let mistyped = json!({ "headline": "h", "items": [], "note": 5 });
        let err = schema.validate(&mistyped).unwrap_err();
        assert_eq!(err.path, "$.note");
    }

    #[test]
    fn reports_missing_nested_field_path() {
        let value = json!({
            "headline": "h",
            "items": [{ "label": "a", "score": 1 }, { "label": "b" }]
        });
        let err = milestone_schema().validate(&value).unwrap_err();
        assert_eq!(err.path, "$.items[1].score");
        assert_eq!(err.reason, "required field is missing");
    }

    #[test]
    fn null_counts_as_missing() {
        let value = json!({ "headline": null, "items": [] });
        let err = milestone_schema().validate(&value).unwrap_err();
        assert_eq!(err.path, "$.headline");
    }

    #[test]
    fn reports_type_mismatch() {
        let value = json!({ "headline": "h", "items": [{ "label": "a", "score": 1.5 }] });
        let err = milestone_schema().validate(&value).unwrap_err();
        assert_eq!(err.path, "$.items[0].score");
        assert_eq!(err.reason, "expected INTEGER, found number");

        let err = milestone_schema().validate(&json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.path, "$");
    }

    #[test]
    fn prune_keeps_only_declared_properties() {
        let value = json!({
            "headline": "h",
            "items": [{ "label": "a", "score": 1, "colour": "red" }],
            "extra": { "partial": true }
        });
        let pruned = milestone_schema().prune(value);
        assert_eq!(
            pruned,
            json!({ "headline": "h", "items": [{ "label": "a", "score": 1 }] })
        );
    }
}
