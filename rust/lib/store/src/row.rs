//! JSON-object rows, the record type tables store.

use serde_json::{Map, Value};

use crate::record::Record;

pub const ID_FIELD: &str = "id";

/// A table row: a flat JSON object plus whether it has been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    fields: Map<String, Value>,
    persisted: bool,
}

impl Row {
    /// A row that has never been saved.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            persisted: false,
        }
    }

    /// A row as read back from storage.
    pub(crate) fn persisted(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            persisted: true,
        }
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// The row's key, if it has a non-empty string id.
    pub fn id(&self) -> Option<&str> {
        self.fields
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Record for Row {
    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    fn is_new(&self) -> bool {
        !self.persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn new_rows_are_new_until_marked() {
        let mut row = Row::new(fields(json!({"id": "a1"})));
        assert!(row.is_new());
        row.mark_persisted();
        assert!(!row.is_new());
        assert!(!Row::persisted(Map::new()).is_new());
    }

    #[test]
    fn id_ignores_blank_and_non_string() {
        assert_eq!(Row::new(fields(json!({"id": "a1"}))).id(), Some("a1"));
        assert_eq!(Row::new(fields(json!({"id": ""}))).id(), None);
        assert_eq!(Row::new(fields(json!({"id": 7}))).id(), None);
        assert_eq!(Row::new(Map::new()).id(), None);
    }

    #[test]
    fn record_access() {
        let mut row = Row::new(Map::new());
        row.set("name", json!("John Doe"));
        assert_eq!(row.get_str("name"), Some("John Doe"));
        assert_eq!(Record::get(&row, "name"), Some(&json!("John Doe")));
        assert_eq!(row.remove("name"), Some(json!("John Doe")));
        assert_eq!(row.into_value(), json!({}));
    }
}
