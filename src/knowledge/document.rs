use serde::Serialize;
use serde_json::{Map, Value};

use super::error::RecordError;

/// Fields every knowledge record must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["ingredient", "role", "summary", "evidence", "sources"];

/// An unvalidated record as produced by a [`super::KnowledgeSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeRecord {
    /// Where the record came from (file name, fixture label...), used in warnings.
    pub origin: String,
    /// Raw JSON object fields.
    pub fields: Map<String, Value>,
}

impl KnowledgeRecord {
    pub fn new(origin: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            origin: origin.into(),
            fields,
        }
    }

    /// Builds a record from a JSON value, which must be an object.
    pub fn from_value(origin: impl Into<String>, value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(origin, fields)),
            _ => None,
        }
    }

    /// Required fields that are absent, in [`REQUIRED_FIELDS`] order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !self.fields.contains_key(*f))
            .collect()
    }
}

/// A validated corpus entry. Immutable once admitted to the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeDocument {
    pub ingredient: String,
    pub role: String,
    pub summary: String,
    pub evidence: String,
    pub sources: Vec<String>,
    /// Unit-length embedding of [`KnowledgeDocument::composed_text`]; empty until indexed.
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl KnowledgeDocument {
    /// Validates `record` against the required-field set.
    pub fn from_record(record: &KnowledgeRecord) -> Result<Self, RecordError> {
        let missing = record.missing_fields();
        if !missing.is_empty() {
            return Err(RecordError::MissingFields(missing));
        }

        Ok(Self {
            ingredient: text_field(record, "ingredient")?,
            role: text_field(record, "role")?,
            summary: text_field(record, "summary")?,
            evidence: text_field(record, "evidence")?,
            sources: sources_field(record)?,
            embedding: Vec::new(),
        })
    }

    /// Text that gets embedded for this document.
    pub fn composed_text(&self) -> String {
        format!(
            "{}. Role: {}. {}. Evidence: {}.",
            self.ingredient, self.role, self.summary, self.evidence
        )
    }
}

fn text_field(record: &KnowledgeRecord, field: &'static str) -> Result<String, RecordError> {
    match record.fields.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(RecordError::InvalidField {
            field,
            reason: "is empty".to_string(),
        }),
        Some(other) => Err(RecordError::InvalidField {
            field,
            reason: format!("must be a string, got {}", json_kind(other)),
        }),
        None => Err(RecordError::MissingFields(vec![field])),
    }
}

fn sources_field(record: &KnowledgeRecord) -> Result<Vec<String>, RecordError> {
    match record.fields.get("sources") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(RecordError::InvalidField {
                    field: "sources",
                    reason: format!("must contain only strings, found {}", json_kind(other)),
                }),
            })
            .collect(),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(other) => Err(RecordError::InvalidField {
            field: "sources",
            reason: format!("must be a list of strings, got {}", json_kind(other)),
        }),
        None => Err(RecordError::MissingFields(vec!["sources"])),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
