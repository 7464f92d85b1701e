use serde_json::{Value, json};

use crate::engine::types::{Document, document};

/// Builds documents carrying a single keyed field plus a source tag.
pub struct DocumentFactory {
    field: String,
    source: Option<String>,
}

impl DocumentFactory {
    pub fn new() -> Self {
        Self {
            field: "k".to_string(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn one(&self, value: impl Into<Value>) -> Document {
        let mut doc = document(json!({}));
        doc.insert(self.field.clone(), value.into());
        if let Some(source) = &self.source {
            doc.insert("src".to_string(), json!(source));
        }
        doc
    }

    pub fn many(&self, values: &[i64]) -> Vec<Document> {
        values.iter().map(|value| self.one(*value)).collect()
    }
}

/// Reads the integer stored under `field`, for assertions.
pub fn key_of(doc: &Document, field: &str) -> i64 {
    doc.get(field).and_then(Value::as_i64).unwrap_or(i64::MIN)
}
